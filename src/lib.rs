pub mod cleanup;
pub mod config;
pub mod discovery;
pub mod error;
pub mod plan;
pub mod resolution;
pub mod tree;

pub use cleanup::{CleanupGuard, CleanupReport, CleanupTask, DEFAULT_CLEAN_TASK};
pub use config::{Manifest, Overrides, MANIFEST_FILE};
pub use discovery::{DiscoveredBuild, DiscoveredModule};
pub use error::{LayoutError, Result};
pub use plan::BuildPlan;
pub use resolution::{PluginRequest, PluginSet, Repository};
pub use tree::{
    EvaluationConstraint, EvaluationGraph, Project, ProjectKind, ProjectTree, TreeState,
    CONVENTIONAL_OUTPUT_DIR,
};
