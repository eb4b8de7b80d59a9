//! Gradle settings parsing.

use std::path::{Path, PathBuf};

use crate::error::{LayoutError, Result};
use crate::tree::ProjectKind;

use super::{DiscoveredBuild, DiscoveredModule};

/// Locate the settings file, preferring the Kotlin DSL
pub fn settings_file(path: &Path) -> Option<PathBuf> {
    ["settings.gradle.kts", "settings.gradle"]
        .iter()
        .map(|name| path.join(name))
        .find(|candidate| candidate.is_file())
}

/// Parse root project name and included projects from Gradle settings
pub fn parse_gradle_settings(path: &Path) -> Result<DiscoveredBuild> {
    let settings_path = settings_file(path).ok_or_else(|| {
        LayoutError::FileNotFound(format!(
            "settings.gradle(.kts) not found in {}",
            path.display()
        ))
    })?;

    let content =
        std::fs::read_to_string(&settings_path).map_err(|e| LayoutError::io(&settings_path, e))?;

    let mut build = DiscoveredBuild::new(path.to_path_buf());
    build.name = parse_root_project_name(&content);
    build.modules = parse_included_projects(&content, path);

    Ok(build)
}

fn parse_root_project_name(content: &str) -> Option<String> {
    for line in content.lines() {
        let trimmed = line.trim();

        // rootProject.name = 'android' / rootProject.name = "android"
        if let Some(rest) = trimmed.strip_prefix("rootProject.name") {
            let name = rest
                .trim()
                .trim_start_matches('=')
                .trim()
                .trim_matches(|c| c == '"' || c == '\'');
            if !name.is_empty() {
                return Some(name.to_string());
            }
        }
    }
    None
}

fn parse_included_projects(content: &str, root: &Path) -> Vec<DiscoveredModule> {
    let mut modules: Vec<DiscoveredModule> = Vec::new();

    for line in content.lines() {
        let trimmed = line.trim();
        if !trimmed.starts_with("include") {
            continue;
        }

        for project_path in extract_project_paths(trimmed) {
            let relative = project_path.trim_start_matches(':').replace(':', "/");
            let name = project_path.trim_start_matches(':').replace(':', "-");

            if relative.is_empty() || modules.iter().any(|m| m.name == name) {
                continue;
            }

            let module_dir = root.join(&relative);
            if !module_dir.is_dir() {
                tracing::warn!(
                    "Skipping included project {}: {} does not exist",
                    project_path,
                    module_dir.display()
                );
                continue;
            }

            let mut module = DiscoveredModule::new(name, PathBuf::from(relative));
            module.kind = detect_project_kind(&module_dir);
            modules.push(module);
        }
    }

    modules
}

/// Quoted `:path` arguments of an include line.
///
/// include ':app', ':lib:core'      (Groovy)
/// include(":app", ":lib:core")     (Kotlin DSL)
fn extract_project_paths(line: &str) -> Vec<String> {
    let mut paths = Vec::new();
    let mut in_quote = false;
    let mut quote_char = '"';
    let mut current = String::new();

    for c in line.chars() {
        if !in_quote && (c == '"' || c == '\'') {
            in_quote = true;
            quote_char = c;
            current.clear();
        } else if in_quote && c == quote_char {
            in_quote = false;
            if current.starts_with(':') {
                paths.push(current.clone());
            }
        } else if in_quote {
            current.push(c);
        }
    }

    paths
}

/// Plugin references that make a module an application. Matched as plugin
/// ids so `applicationId` or `testApplicationId` do not count.
const APPLICATION_PLUGINS: &[&str] = &[
    "com.android.application",
    "id(\"application\")",
    "id 'application'",
    "id \"application\"",
    "plugin: 'application'",
    "plugin: \"application\"",
    "`application`",
];

fn detect_project_kind(module_dir: &Path) -> Option<ProjectKind> {
    let build_file = ["build.gradle.kts", "build.gradle"]
        .iter()
        .map(|name| module_dir.join(name))
        .find(|candidate| candidate.is_file())?;

    let content = std::fs::read_to_string(&build_file).ok()?;

    if APPLICATION_PLUGINS.iter().any(|id| content.contains(id)) {
        return Some(ProjectKind::Application);
    }

    if content.contains("com.android.library")
        || content.contains("java-library")
        || content.contains("kotlin(\"jvm\")")
        || content.contains("org.jetbrains.kotlin.jvm")
    {
        return Some(ProjectKind::Library);
    }

    None
}
