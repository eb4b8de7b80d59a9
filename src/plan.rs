//! Finalized build plan handed to the host engine.

use std::fmt::Write as _;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::cleanup::CleanupTask;
use crate::error::{LayoutError, Result};
use crate::resolution::{PluginRequest, Repository};
use crate::tree::{EvaluationConstraint, Project, ProjectTree, TreeState};

/// Snapshot of a redirected [`ProjectTree`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildPlan {
    pub output_root: PathBuf,
    pub root: Project,
    pub subprojects: Vec<Project>,
    pub evaluation_order: Vec<String>,
    pub constraints: Vec<EvaluationConstraint>,
    pub plugins: Vec<PluginRequest>,
    pub repositories: Vec<Repository>,
    pub cleanup_tasks: Vec<CleanupTask>,
}

impl BuildPlan {
    pub fn from_tree(tree: &ProjectTree) -> Result<Self> {
        let output_root = match (tree.state(), tree.root_output_dir()) {
            (TreeState::Redirected, Some(root)) => root.to_path_buf(),
            (state, _) => {
                return Err(LayoutError::Configuration(format!(
                    "cannot build a plan from a tree in state {}",
                    state.as_str()
                )))
            }
        };

        Ok(Self {
            output_root,
            root: tree.root().clone(),
            subprojects: tree.subprojects().to_vec(),
            evaluation_order: tree.evaluation_order()?,
            constraints: tree.constraints().to_vec(),
            plugins: tree.plugins().to_vec(),
            repositories: tree.repositories().to_vec(),
            cleanup_tasks: tree.cleanup_tasks().to_vec(),
        })
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| LayoutError::Parse(format!("failed to serialize plan: {}", e)))
    }

    /// Human-readable report
    pub fn render_text(&self) -> String {
        let mut out = String::new();

        let _ = writeln!(out, "Build layout for {}", self.root.name);
        let _ = writeln!(out, "  Output root: {}", self.output_root.display());

        let _ = writeln!(out, "\n  Projects:");
        for project in std::iter::once(&self.root).chain(self.subprojects.iter()) {
            let kind = project
                .kind
                .map(|k| format!(" [{}]", k.as_str()))
                .unwrap_or_default();
            let _ = writeln!(
                out,
                "    {}{}: {} -> {}",
                project.name,
                kind,
                project.base_dir.display(),
                project.output_dir.display()
            );
        }

        let _ = writeln!(out, "\n  Evaluation order:");
        for (i, name) in self.evaluation_order.iter().enumerate() {
            let after: Vec<&str> = self
                .constraints
                .iter()
                .filter(|c| &c.dependent == name)
                .map(|c| c.dependency.as_str())
                .collect();
            if after.is_empty() {
                let _ = writeln!(out, "    {}. {}", i + 1, name);
            } else {
                let _ = writeln!(out, "    {}. {} (after {})", i + 1, name, after.join(", "));
            }
        }

        if !self.plugins.is_empty() {
            let _ = writeln!(out, "\n  Plugins:");
            for plugin in &self.plugins {
                let apply = if plugin.apply { "" } else { " (apply false)" };
                let _ = writeln!(out, "    {} {}{}", plugin.id, plugin.version, apply);
            }
        }

        if !self.repositories.is_empty() {
            let names: Vec<&str> = self.repositories.iter().map(|r| r.as_str()).collect();
            let _ = writeln!(out, "\n  Repositories: {}", names.join(", "));
        }

        if !self.cleanup_tasks.is_empty() {
            let _ = writeln!(out, "\n  Cleanup tasks:");
            for task in &self.cleanup_tasks {
                let _ = writeln!(out, "    {}: {}", task.name, task.target.display());
            }
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn redirected_tree() -> ProjectTree {
        let mut tree = ProjectTree::new(Project::new("android", "/work/android"));
        tree.add_subproject(Project::new("app", "/work/android/app")).unwrap();
        tree.add_subproject(Project::new("lib", "/work/android/lib")).unwrap();
        tree.set_root_output_directory("/work/build").unwrap();
        tree.redirect_output_directories().unwrap();
        tree.evaluate_subprojects_after("app").unwrap();
        tree.add_plugin(PluginRequest::new("com.android.application", "8.7.3").with_apply(false))
            .unwrap();
        tree.add_repository(Repository::Google);
        tree.register_cleanup_task("clean", None).unwrap();
        tree
    }

    #[test]
    fn test_plan_requires_redirected_tree() {
        let tree = ProjectTree::new(Project::new("android", "/work/android"));
        assert!(BuildPlan::from_tree(&tree).is_err());
    }

    #[test]
    fn test_plan_captures_tree() {
        let plan = BuildPlan::from_tree(&redirected_tree()).unwrap();

        assert_eq!(plan.output_root, PathBuf::from("/work/build"));
        assert_eq!(plan.evaluation_order, vec!["android", "app", "lib"]);
        assert_eq!(plan.subprojects[1].output_dir, PathBuf::from("/work/build/lib"));
        assert_eq!(plan.cleanup_tasks[0].name, "clean");
    }

    #[test]
    fn test_plan_json_shape() {
        let plan = BuildPlan::from_tree(&redirected_tree()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&plan.to_json().unwrap()).unwrap();

        assert_eq!(value["root"]["output_dir"], "/work/build");
        assert_eq!(value["subprojects"][0]["output_dir"], "/work/build/app");
        assert_eq!(value["repositories"][0], "google");
        assert_eq!(value["plugins"][0]["apply"], false);
        assert_eq!(value["constraints"][0]["dependency"], "app");
    }

    #[test]
    fn test_render_text() {
        let text = BuildPlan::from_tree(&redirected_tree()).unwrap().render_text();

        assert!(text.contains("Output root: /work/build"));
        assert!(text.contains("lib: /work/android/lib -> /work/build/lib"));
        assert!(text.contains("3. lib (after app)"));
        assert!(text.contains("com.android.application 8.7.3 (apply false)"));
        assert!(text.contains("Repositories: google"));
    }
}
