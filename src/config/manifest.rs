//! Layout manifest (build-layout.toml)
//!
//! Declares the projects, the shared output root, evaluation constraints,
//! plugin requests, repositories and cleanup tasks of a build.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::cleanup::DEFAULT_CLEAN_TASK;
use crate::discovery::{self, DiscoveredBuild};
use crate::error::{LayoutError, Result};
use crate::resolution::{PluginRequest, Repository};
use crate::tree::{paths, Project, ProjectKind, ProjectTree, CONVENTIONAL_OUTPUT_DIR};

/// File name searched for by [`Manifest::find`]
pub const MANIFEST_FILE: &str = "build-layout.toml";

/// Layout manifest loaded from `build-layout.toml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Manifest {
    /// Package sources, in resolution order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub repositories: Vec<Repository>,

    /// Root project metadata
    #[serde(default)]
    pub project: ProjectSection,

    /// Shared output root
    #[serde(default)]
    pub output: OutputSection,

    /// Declared subprojects; discovered from Gradle settings when empty
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subprojects: Vec<SubprojectEntry>,

    /// Evaluation-order constraints
    #[serde(default)]
    pub evaluation: EvaluationSection,

    /// Plugin requests, passed through unmodified
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub plugins: Vec<PluginRequest>,

    /// Cleanup tasks; a single `clean` task when empty
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cleanup: Vec<CleanupEntry>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectSection {
    /// Root project name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputSection {
    /// Shared output root (relative to the manifest directory)
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(CONVENTIONAL_OUTPUT_DIR)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubprojectEntry {
    pub name: String,
    /// Project directory relative to the root; defaults to the name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ProjectKind>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvaluationSection {
    /// Every subproject evaluates after this project
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after: Option<String>,
    /// Individual "dependent after dependency" edges
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub constraints: Vec<ConstraintEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConstraintEntry {
    pub dependent: String,
    pub dependency: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanupEntry {
    pub name: String,
    /// Directory to delete, relative to the output root; the output root itself when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<PathBuf>,
}

/// Values that take precedence over the manifest
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub output_dir: Option<PathBuf>,
}

impl Manifest {
    /// Load a manifest from a file path
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| LayoutError::io(path, e))?;
        Self::parse(&content)
            .map_err(|e| LayoutError::Parse(format!("{}: {}", path.display(), e)))
    }

    /// Parse manifest text
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| LayoutError::Parse(e.to_string()))
    }

    /// Save a manifest to a file path
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| LayoutError::Parse(format!("failed to serialize manifest: {}", e)))?;
        std::fs::write(path, content).map_err(|e| LayoutError::io(path, e))
    }

    /// Find a manifest by searching upward from `start`
    pub fn find(start: &Path) -> Result<PathBuf> {
        let mut current = start.to_path_buf();

        loop {
            let candidate = current.join(MANIFEST_FILE);
            if candidate.is_file() {
                return Ok(candidate);
            }

            if !current.pop() {
                return Err(LayoutError::FileNotFound(format!(
                    "{} not found in {} or any parent directory",
                    MANIFEST_FILE,
                    start.display()
                )));
            }
        }
    }

    /// A starting manifest for `root_dir`, seeded from Gradle settings when
    /// present. The first application project becomes the one every other
    /// subproject evaluates after.
    pub fn starter(root_dir: &Path) -> Result<Self> {
        let mut manifest = Manifest {
            cleanup: vec![CleanupEntry {
                name: DEFAULT_CLEAN_TASK.to_string(),
                target: None,
            }],
            ..Default::default()
        };

        if let Some(build) = discovery::discover(root_dir)? {
            manifest.project.name = build.name.clone();
            manifest.repositories = vec![Repository::Google, Repository::MavenCentral];
            manifest.evaluation.after = build
                .modules
                .iter()
                .find(|m| m.kind == Some(ProjectKind::Application))
                .map(|m| m.name.clone());
            manifest.subprojects = build
                .modules
                .into_iter()
                .map(|m| SubprojectEntry {
                    path: (m.path != Path::new(&m.name)).then_some(m.path),
                    name: m.name,
                    kind: m.kind,
                })
                .collect();
        }

        Ok(manifest)
    }

    /// Build a fully redirected tree rooted at `root_dir`.
    pub fn build_tree(&self, root_dir: &Path, overrides: &Overrides) -> Result<ProjectTree> {
        let root_dir = paths::normalize(root_dir);

        let discovered = if self.subprojects.is_empty() || self.project.name.is_none() {
            discovery::discover(&root_dir)?
        } else {
            None
        };

        let mut tree = ProjectTree::new(Project::new(
            root_name(self, discovered.as_ref(), &root_dir),
            &root_dir,
        ));

        if self.subprojects.is_empty() {
            for module in discovered.iter().flat_map(|b| b.modules.iter()) {
                let mut project = Project::new(&module.name, root_dir.join(&module.path));
                project.kind = module.kind;
                tree.add_subproject(project)?;
            }
        } else {
            for entry in &self.subprojects {
                let dir = entry
                    .path
                    .clone()
                    .unwrap_or_else(|| PathBuf::from(&entry.name));
                let mut project = Project::new(&entry.name, paths::resolve(&root_dir, &dir));
                project.kind = entry.kind;
                tree.add_subproject(project)?;
            }
        }

        let output_dir = overrides.output_dir.as_ref().unwrap_or(&self.output.dir);
        tree.set_root_output_directory(output_dir)?;
        tree.redirect_output_directories()?;

        for plugin in &self.plugins {
            tree.add_plugin(plugin.clone())?;
        }
        for repository in &self.repositories {
            tree.add_repository(repository.clone());
        }

        if let Some(after) = &self.evaluation.after {
            tree.evaluate_subprojects_after(after)?;
        }
        for constraint in &self.evaluation.constraints {
            tree.add_evaluation_constraint(&constraint.dependent, &constraint.dependency)?;
        }

        if self.cleanup.is_empty() {
            tree.register_cleanup_task(DEFAULT_CLEAN_TASK, None)?;
        } else {
            for entry in &self.cleanup {
                tree.register_cleanup_task(&entry.name, entry.target.clone())?;
            }
        }

        Ok(tree)
    }
}

fn root_name(manifest: &Manifest, discovered: Option<&DiscoveredBuild>, root_dir: &Path) -> String {
    manifest
        .project
        .name
        .clone()
        .or_else(|| discovered.and_then(|b| b.name.clone()))
        .or_else(|| {
            root_dir
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
        })
        .unwrap_or_else(|| "root".to_string())
}
