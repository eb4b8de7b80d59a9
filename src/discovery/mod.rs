//! Discovery of declared projects from host build settings.
//!
//! Supports Gradle multi-project builds (`settings.gradle` and
//! `settings.gradle.kts`).

pub mod gradle;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::tree::ProjectKind;

/// Projects declared by the host build's settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveredBuild {
    /// Directory holding the settings file
    pub root_path: PathBuf,
    /// Root project name, when the settings declare one
    pub name: Option<String>,
    /// Included subprojects in declaration order
    pub modules: Vec<DiscoveredModule>,
}

impl DiscoveredBuild {
    pub fn new(root_path: PathBuf) -> Self {
        Self {
            root_path,
            name: None,
            modules: Vec::new(),
        }
    }

    pub fn get_module(&self, name: &str) -> Option<&DiscoveredModule> {
        self.modules.iter().find(|m| m.name == name)
    }

    pub fn module_names(&self) -> Vec<&str> {
        self.modules.iter().map(|m| m.name.as_str()).collect()
    }
}

/// An included subproject
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredModule {
    /// Project name (`:lib:core` becomes `lib-core`)
    pub name: String,
    /// Directory relative to the root
    pub path: PathBuf,
    pub kind: Option<ProjectKind>,
}

impl DiscoveredModule {
    pub fn new(name: impl Into<String>, path: PathBuf) -> Self {
        Self {
            name: name.into(),
            path,
            kind: None,
        }
    }
}

/// Whether `path` holds build settings this crate can read
pub fn has_settings(path: &Path) -> bool {
    gradle::settings_file(path).is_some()
}

/// Discover declared projects under `path`, if it holds build settings
pub fn discover(path: &Path) -> Result<Option<DiscoveredBuild>> {
    if !has_settings(path) {
        return Ok(None);
    }
    gradle::parse_gradle_settings(path).map(Some)
}
