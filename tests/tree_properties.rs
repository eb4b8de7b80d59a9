//! Integration tests for output relocation and evaluation ordering.
//!
//! These tests exercise the public `ProjectTree` API the way a host build
//! engine drives it during its configuration pass.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use build_layout::{LayoutError, Project, ProjectTree, TreeState};

// ============================================================================
// Test Helpers
// ============================================================================

/// Creates a tree rooted at /work/android with the given subprojects.
fn tree_with(subprojects: &[&str]) -> ProjectTree {
    let mut tree = ProjectTree::new(Project::new("android", "/work/android"));
    for name in subprojects {
        tree.add_subproject(Project::new(*name, Path::new("/work/android").join(name)))
            .expect("Failed to add subproject");
    }
    tree
}

fn output_dirs(tree: &ProjectTree) -> Vec<(String, PathBuf)> {
    tree.projects()
        .map(|p| (p.name.clone(), p.output_dir.clone()))
        .collect()
}

// ============================================================================
// Redirection
// ============================================================================

mod redirection {
    use super::*;

    #[test]
    fn test_build_scenario() {
        let mut tree = tree_with(&["app", "lib"]);
        tree.set_root_output_directory("/build").unwrap();
        tree.redirect_output_directories().unwrap();

        assert_eq!(
            output_dirs(&tree),
            vec![
                ("android".to_string(), PathBuf::from("/build")),
                ("app".to_string(), PathBuf::from("/build/app")),
                ("lib".to_string(), PathBuf::from("/build/lib")),
            ]
        );
    }

    #[test]
    fn test_subproject_outputs_are_distinct_children_of_root() {
        let names = ["app", "lib", "core", "feature-login", "feature-home", "benchmark"];
        let mut tree = tree_with(&names);
        tree.set_root_output_directory("/out").unwrap();
        tree.redirect_output_directories().unwrap();

        let root = tree.root_output_dir().unwrap().to_path_buf();
        assert_eq!(tree.root().output_dir, root);

        let mut seen = HashSet::new();
        for project in tree.subprojects() {
            assert_eq!(project.output_dir.parent(), Some(root.as_path()));
            assert!(seen.insert(project.output_dir.clone()), "duplicate output dir");
        }
        assert_eq!(seen.len(), names.len());
    }

    #[test]
    fn test_redirect_twice_is_idempotent() {
        let mut tree = tree_with(&["app", "lib"]);
        tree.set_root_output_directory("/build").unwrap();

        tree.redirect_output_directories().unwrap();
        let once = output_dirs(&tree);
        tree.redirect_output_directories().unwrap();

        assert_eq!(output_dirs(&tree), once);
        assert_eq!(tree.state(), TreeState::Redirected);
    }

    #[test]
    fn test_relocation_two_levels_above_conventional_output() {
        // The root's conventional output is /work/android/build; going two
        // levels up from there lands in /work/build.
        let mut tree = tree_with(&["app"]);
        let conventional = tree.root().output_dir.clone();
        assert_eq!(conventional, PathBuf::from("/work/android/build"));

        tree.set_root_output_directory(conventional.join("../../build")).unwrap();
        tree.redirect_output_directories().unwrap();

        assert_eq!(tree.root().output_dir, PathBuf::from("/work/build"));
        assert_eq!(tree.project(":app").unwrap().output_dir, PathBuf::from("/work/build/app"));
    }

    #[test]
    fn test_state_machine_order() {
        let mut tree = tree_with(&["app"]);
        assert_eq!(tree.state(), TreeState::Unconfigured);
        assert!(matches!(
            tree.redirect_output_directories(),
            Err(LayoutError::Configuration(_))
        ));

        tree.set_root_output_directory("/build").unwrap();
        assert_eq!(tree.state(), TreeState::OutputRootSet);

        tree.redirect_output_directories().unwrap();
        assert_eq!(tree.state(), TreeState::Redirected);
    }
}

// ============================================================================
// Evaluation constraints
// ============================================================================

mod evaluation_constraints {
    use super::*;

    #[test]
    fn test_reverse_edge_fails_with_cycle() {
        let mut tree = tree_with(&["a", "b"]);
        tree.add_evaluation_constraint("a", "b").unwrap();

        let err = tree.add_evaluation_constraint("b", "a").unwrap_err();
        assert!(matches!(err, LayoutError::Cycle { .. }));
        assert!(err.to_string().contains("b -> a -> b"));
    }

    #[test]
    fn test_transitive_edge_is_accepted() {
        let mut tree = tree_with(&["a", "b", "c"]);
        tree.add_evaluation_constraint("a", "b").unwrap();
        tree.add_evaluation_constraint("b", "c").unwrap();
        tree.add_evaluation_constraint("a", "c").unwrap();
        assert_eq!(tree.constraints().len(), 3);
    }

    #[test]
    fn test_unknown_project_is_rejected() {
        let mut tree = tree_with(&["app"]);
        let err = tree.add_evaluation_constraint("ghost", "app").unwrap_err();
        assert!(matches!(err, LayoutError::UnknownProject { ref names } if names == &["ghost"]));
        assert!(err.to_string().contains("ghost"));
    }

    #[test]
    fn test_both_unknown_projects_are_named() {
        let mut tree = tree_with(&["app"]);
        let err = tree.add_evaluation_constraint("ghost", "phantom").unwrap_err();
        assert_eq!(err.to_string(), "Unknown project(s): ghost, phantom");
    }

    #[test]
    fn test_constraints_accepted_in_any_state() {
        let mut tree = tree_with(&["app", "lib"]);
        tree.add_evaluation_constraint("lib", "app").unwrap();
        tree.set_root_output_directory("/build").unwrap();
        tree.add_evaluation_constraint(":lib", ":").unwrap();
        tree.redirect_output_directories().unwrap();
        tree.add_evaluation_constraint("app", "android").unwrap();

        assert_eq!(tree.constraints().len(), 3);
    }

    #[test]
    fn test_subprojects_after_app_orders_app_first() {
        let mut tree = tree_with(&["lib", "feature", "app"]);
        tree.evaluate_subprojects_after(":app").unwrap();
        tree.set_root_output_directory("/build").unwrap();
        tree.redirect_output_directories().unwrap();

        assert_eq!(
            tree.evaluation_order().unwrap(),
            vec!["android", "app", "lib", "feature"]
        );
    }

    #[test]
    fn test_order_is_not_available_before_redirect() {
        let tree = tree_with(&["app"]);
        assert!(matches!(
            tree.evaluation_order(),
            Err(LayoutError::Configuration(_))
        ));
    }
}
