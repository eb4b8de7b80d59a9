//! Project tree: output-directory relocation and evaluation ordering.
//!
//! A [`ProjectTree`] is built once per invocation, configured, handed to the
//! host engine (usually as a [`crate::plan::BuildPlan`]) and dropped.

pub mod graph;
pub mod paths;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::cleanup::{CleanupGuard, CleanupTask};
use crate::error::{LayoutError, Result};
use crate::resolution::{PluginRequest, PluginSet, Repository};

pub use graph::{EvaluationConstraint, EvaluationGraph};

/// Directory name the host engine uses for output when nothing is relocated
pub const CONVENTIONAL_OUTPUT_DIR: &str = "build";

/// What a project builds, when known
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectKind {
    Application,
    Library,
}

impl ProjectKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectKind::Application => "application",
            ProjectKind::Library => "library",
        }
    }
}

/// A single build unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub name: String,
    pub base_dir: PathBuf,
    pub output_dir: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ProjectKind>,
}

impl Project {
    /// A project whose output directory follows the host convention
    /// (`<base_dir>/build`) until it is redirected.
    pub fn new(name: impl Into<String>, base_dir: impl Into<PathBuf>) -> Self {
        let base_dir = paths::normalize(&base_dir.into());
        Self {
            name: name.into(),
            output_dir: base_dir.join(CONVENTIONAL_OUTPUT_DIR),
            base_dir,
            kind: None,
        }
    }

    pub fn with_kind(mut self, kind: ProjectKind) -> Self {
        self.kind = Some(kind);
        self
    }
}

/// Configuration progress of a [`ProjectTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TreeState {
    Unconfigured,
    OutputRootSet,
    Redirected,
}

impl TreeState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TreeState::Unconfigured => "unconfigured",
            TreeState::OutputRootSet => "output_root_set",
            TreeState::Redirected => "redirected",
        }
    }
}

/// Root project, its subprojects, and everything configured on top of them
#[derive(Debug, Clone)]
pub struct ProjectTree {
    root: Project,
    subprojects: Vec<Project>,
    output_root: Option<PathBuf>,
    state: TreeState,
    graph: EvaluationGraph,
    cleanup_tasks: Vec<CleanupTask>,
    plugins: PluginSet,
    repositories: Vec<Repository>,
}

impl ProjectTree {
    /// A tree around `root`. A root name that is not a single path segment
    /// is replaced by the last component of its base directory.
    pub fn new(mut root: Project) -> Self {
        if !paths::is_valid_segment(&root.name) {
            let fallback = root
                .base_dir
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .filter(|n| paths::is_valid_segment(n))
                .unwrap_or_else(|| "root".to_string());
            tracing::warn!(
                "Invalid root project name '{}', using '{}'",
                root.name,
                fallback
            );
            root.name = fallback;
        }

        Self {
            root,
            subprojects: Vec::new(),
            output_root: None,
            state: TreeState::Unconfigured,
            graph: EvaluationGraph::new(),
            cleanup_tasks: Vec::new(),
            plugins: PluginSet::new(),
            repositories: Vec::new(),
        }
    }

    pub fn root(&self) -> &Project {
        &self.root
    }

    pub fn subprojects(&self) -> &[Project] {
        &self.subprojects
    }

    pub fn state(&self) -> TreeState {
        self.state
    }

    pub fn root_output_dir(&self) -> Option<&Path> {
        self.output_root.as_deref()
    }

    pub fn constraints(&self) -> &[EvaluationConstraint] {
        self.graph.constraints()
    }

    pub fn cleanup_tasks(&self) -> &[CleanupTask] {
        &self.cleanup_tasks
    }

    pub fn cleanup_task(&self, name: &str) -> Option<&CleanupTask> {
        self.cleanup_tasks.iter().find(|t| t.name == name)
    }

    pub fn plugins(&self) -> &[PluginRequest] {
        self.plugins.as_slice()
    }

    pub fn repositories(&self) -> &[Repository] {
        &self.repositories
    }

    /// Root first, then subprojects in declaration order
    pub fn projects(&self) -> impl Iterator<Item = &Project> {
        std::iter::once(&self.root).chain(self.subprojects.iter())
    }

    /// Look up a project by name or by Gradle path. `:` alone is the root;
    /// nested paths like `:lib:core` map to the `lib-core` name discovery
    /// gives them.
    pub fn project(&self, reference: &str) -> Option<&Project> {
        if reference == ":" {
            return Some(&self.root);
        }
        let name = match reference.strip_prefix(':') {
            Some(path) => path.replace(':', "-"),
            None => reference.to_string(),
        };
        self.projects().find(|p| p.name == name)
    }

    /// Declare a subproject. Declaration order is evaluation order unless
    /// constraints say otherwise.
    pub fn add_subproject(&mut self, project: Project) -> Result<()> {
        if self.state == TreeState::Redirected {
            return Err(LayoutError::Configuration(format!(
                "cannot declare subproject '{}' after output directories were redirected",
                project.name
            )));
        }

        if !paths::is_valid_segment(&project.name) {
            return Err(LayoutError::Configuration(format!(
                "invalid subproject name '{}': must be a single non-empty path segment",
                project.name
            )));
        }

        if self.projects().any(|p| p.name == project.name) {
            return Err(LayoutError::Configuration(format!(
                "project '{}' is declared more than once",
                project.name
            )));
        }

        self.subprojects.push(project);
        Ok(())
    }

    /// Set the shared output root. A relative path is resolved against the
    /// root project's base directory.
    ///
    /// Re-setting the same root is always accepted; changing it after
    /// redirection is not.
    pub fn set_root_output_directory(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let resolved = paths::resolve(&self.root.base_dir, path.as_ref());

        if self.output_root.as_deref() == Some(resolved.as_path()) {
            return Ok(());
        }

        if self.state == TreeState::Redirected {
            return Err(LayoutError::Configuration(format!(
                "output root is already {} and subprojects were redirected; cannot change it to {}",
                self.output_root
                    .as_deref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default(),
                resolved.display()
            )));
        }

        tracing::info!("Output root set to {}", resolved.display());
        self.output_root = Some(resolved);
        self.state = TreeState::OutputRootSet;
        Ok(())
    }

    /// Point the root project at the shared output root and every subproject
    /// at `<output root>/<name>`. Pure path composition; the filesystem is
    /// left alone.
    pub fn redirect_output_directories(&mut self) -> Result<()> {
        let output_root = match (&self.state, &self.output_root) {
            (TreeState::Unconfigured, _) | (_, None) => {
                return Err(LayoutError::Configuration(
                    "output root must be set before output directories can be redirected"
                        .to_string(),
                ))
            }
            (_, Some(root)) => root.clone(),
        };

        self.root.output_dir = output_root.clone();
        tracing::debug!("{} -> {}", self.root.name, output_root.display());

        for project in &mut self.subprojects {
            project.output_dir = output_root.join(&project.name);
            tracing::debug!("{} -> {}", project.name, project.output_dir.display());
        }

        self.state = TreeState::Redirected;
        Ok(())
    }

    /// Require `dependent` to be configured only after `dependency`.
    pub fn add_evaluation_constraint(&mut self, dependent: &str, dependency: &str) -> Result<()> {
        let (dependent, dependency) = self.resolve_pair(dependent, dependency)?;

        if self.graph.insert(&dependent, &dependency)? {
            tracing::debug!("{} evaluates after {}", dependent, dependency);
        }
        Ok(())
    }

    /// Make every subproject other than `dependency` evaluate after it.
    ///
    /// Either every edge is added or none is.
    pub fn evaluate_subprojects_after(&mut self, dependency: &str) -> Result<()> {
        let dependency = self
            .project(dependency)
            .map(|p| p.name.clone())
            .ok_or_else(|| LayoutError::UnknownProject {
                names: vec![dependency.to_string()],
            })?;

        let mut staged = self.graph.clone();
        for project in &self.subprojects {
            if project.name != dependency {
                staged.insert(&project.name, &dependency)?;
            }
        }

        tracing::debug!("All subprojects evaluate after {}", dependency);
        self.graph = staged;
        Ok(())
    }

    /// Register a named task that recursively deletes `target`, or the
    /// shared output root when no target is given. A relative target is
    /// resolved against the output root.
    pub fn register_cleanup_task(
        &mut self,
        name: impl Into<String>,
        target: Option<PathBuf>,
    ) -> Result<()> {
        let name = name.into();

        let output_root = self.output_root.clone().ok_or_else(|| {
            LayoutError::Configuration(format!(
                "cleanup task '{}' needs the output root to be set first",
                name
            ))
        })?;

        if name.trim().is_empty() {
            return Err(LayoutError::Configuration(
                "cleanup task name must not be empty".to_string(),
            ));
        }

        if self.cleanup_task(&name).is_some() {
            return Err(LayoutError::Configuration(format!(
                "cleanup task '{}' is registered more than once",
                name
            )));
        }

        let target = match target {
            Some(target) => paths::resolve(&output_root, &target),
            None => output_root,
        };

        self.cleanup_guard()?.check(&target)?;

        self.cleanup_tasks.push(CleanupTask::new(name, target));
        Ok(())
    }

    /// Boundaries for running this tree's cleanup tasks
    pub fn cleanup_guard(&self) -> Result<CleanupGuard> {
        let output_root = self.output_root.as_ref().ok_or_else(|| {
            LayoutError::Configuration("output root is not set".to_string())
        })?;
        let sources = self.projects().map(|p| p.base_dir.clone());
        Ok(CleanupGuard::new(output_root, sources))
    }

    pub fn add_plugin(&mut self, request: PluginRequest) -> Result<()> {
        self.plugins.add(request)
    }

    pub fn add_repository(&mut self, repository: Repository) {
        self.repositories.push(repository);
    }

    /// All project names in an order that honors every constraint. Ties
    /// keep declaration order with the root first.
    pub fn evaluation_order(&self) -> Result<Vec<String>> {
        if self.state != TreeState::Redirected {
            return Err(LayoutError::Configuration(format!(
                "evaluation order is only available once output directories are redirected (state: {})",
                self.state.as_str()
            )));
        }

        let names: Vec<&str> = self.projects().map(|p| p.name.as_str()).collect();
        self.graph.topological_order(&names)
    }

    fn resolve_pair(&self, dependent: &str, dependency: &str) -> Result<(String, String)> {
        let resolved_dependent = self.project(dependent).map(|p| p.name.clone());
        let resolved_dependency = self.project(dependency).map(|p| p.name.clone());

        match (resolved_dependent, resolved_dependency) {
            (Some(a), Some(b)) => Ok((a, b)),
            (a, b) => {
                let mut names = Vec::new();
                if a.is_none() {
                    names.push(dependent.to_string());
                }
                if b.is_none() {
                    names.push(dependency.to_string());
                }
                Err(LayoutError::UnknownProject { names })
            }
        }
    }
}
