//! Cleanup tasks: recursive deletion of build output.
//!
//! A task may only delete its target when the target lies inside the shared
//! output root and does not contain any project's sources.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::error::{LayoutError, Result};
use crate::tree::paths;

/// Name of the task registered when nothing else is configured
pub const DEFAULT_CLEAN_TASK: &str = "clean";

/// A named task that recursively deletes `target`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupTask {
    pub name: String,
    pub target: PathBuf,
}

/// The boundaries a cleanup task must stay within
#[derive(Debug, Clone)]
pub struct CleanupGuard {
    /// Shared output root; targets must lie at or below it
    pub output_root: PathBuf,
    /// Base directories of every project; targets must never contain one
    pub source_roots: Vec<PathBuf>,
}

/// Outcome of running (or previewing) a cleanup task
#[derive(Debug, Clone, Default, Serialize)]
pub struct CleanupReport {
    pub task: String,
    pub target: PathBuf,
    /// Whether the target existed when the task ran
    pub existed: bool,
    pub files: usize,
    pub directories: usize,
    pub dry_run: bool,
}

impl CleanupGuard {
    pub fn new(
        output_root: impl Into<PathBuf>,
        source_roots: impl IntoIterator<Item = PathBuf>,
    ) -> Self {
        Self {
            output_root: paths::normalize(&output_root.into()),
            source_roots: source_roots
                .into_iter()
                .map(|dir| paths::normalize(&dir))
                .collect(),
        }
    }

    /// Lexical checks; valid before anything exists on disk.
    pub fn check(&self, target: &Path) -> Result<()> {
        let target = paths::normalize(target);

        if target.has_root() && target.parent().is_none() {
            return Err(refuse(&target, "target is the filesystem root"));
        }

        if !paths::is_within(&self.output_root, &target) {
            return Err(refuse(
                &target,
                &format!("target is outside the output root {}", self.output_root.display()),
            ));
        }

        if let Some(sources) = self.source_roots.iter().find(|s| paths::is_within(&target, s)) {
            return Err(refuse(
                &target,
                &format!("target contains the project sources at {}", sources.display()),
            ));
        }

        Ok(())
    }

    /// Repeat the checks on resolved paths so symlinked parents cannot
    /// redirect the deletion elsewhere.
    fn check_resolved(&self, target: &Path) -> Result<()> {
        let real_target = target
            .canonicalize()
            .map_err(|e| LayoutError::io(target, e))?;
        let real_root = self
            .output_root
            .canonicalize()
            .map_err(|e| LayoutError::io(&self.output_root, e))?;

        if !real_target.starts_with(&real_root) {
            return Err(refuse(
                target,
                &format!("target resolves to {} outside the output root", real_target.display()),
            ));
        }

        for sources in &self.source_roots {
            let Ok(real_sources) = sources.canonicalize() else {
                continue;
            };
            if real_sources.starts_with(&real_target) {
                return Err(refuse(
                    target,
                    &format!(
                        "target resolves to a directory containing the project sources at {}",
                        sources.display()
                    ),
                ));
            }
        }

        Ok(())
    }
}

fn refuse(target: &Path, reason: &str) -> LayoutError {
    LayoutError::UnsafeCleanup {
        target: target.to_path_buf(),
        reason: reason.to_string(),
    }
}

impl CleanupTask {
    pub fn new(name: impl Into<String>, target: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            target: paths::normalize(&target.into()),
        }
    }

    /// Delete the target directory and everything below it.
    ///
    /// An absent target is not an error.
    pub fn run(&self, guard: &CleanupGuard) -> Result<CleanupReport> {
        self.execute(guard, false)
    }

    /// Report what `run` would delete without deleting anything.
    pub fn preview(&self, guard: &CleanupGuard) -> Result<CleanupReport> {
        self.execute(guard, true)
    }

    fn execute(&self, guard: &CleanupGuard, dry_run: bool) -> Result<CleanupReport> {
        guard.check(&self.target)?;

        let mut report = CleanupReport {
            task: self.name.clone(),
            target: self.target.clone(),
            dry_run,
            ..Default::default()
        };

        let metadata = match std::fs::symlink_metadata(&self.target) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(
                    "Cleanup task '{}': {} does not exist, nothing to do",
                    self.name,
                    self.target.display()
                );
                return Ok(report);
            }
            Err(e) => return Err(LayoutError::io(&self.target, e)),
        };

        guard.check_resolved(&self.target)?;
        report.existed = true;

        if metadata.is_dir() {
            count_entries(&self.target, &mut report)?;
        } else {
            report.files = 1;
        }

        if dry_run {
            return Ok(report);
        }

        let removal = if metadata.is_dir() {
            std::fs::remove_dir_all(&self.target)
        } else {
            std::fs::remove_file(&self.target)
        };
        removal.map_err(|e| LayoutError::io(&self.target, e))?;

        tracing::info!(
            "Cleanup task '{}' removed {} ({} files, {} directories)",
            self.name,
            self.target.display(),
            report.files,
            report.directories
        );

        Ok(report)
    }
}

fn count_entries(root: &Path, report: &mut CleanupReport) -> Result<()> {
    // The target directory itself counts as one directory.
    for entry in WalkDir::new(root) {
        let entry = entry.map_err(|e| {
            let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| root.to_path_buf());
            LayoutError::io(path, std::io::Error::from(e))
        })?;

        if entry.file_type().is_dir() {
            report.directories += 1;
        } else {
            report.files += 1;
        }
    }
    Ok(())
}
