use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LayoutError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Unknown project(s): {}", .names.join(", "))]
    UnknownProject { names: Vec<String> },

    #[error("Evaluation constraint would create a cycle: {}", .path.join(" -> "))]
    Cycle { path: Vec<String> },

    #[error("Refusing to clean {}: {reason}", .target.display())]
    UnsafeCleanup { target: PathBuf, reason: String },

    #[error("IO error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("File not found: {0}")]
    FileNotFound(String),
}

impl LayoutError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        LayoutError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, LayoutError>;
