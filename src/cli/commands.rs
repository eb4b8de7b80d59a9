use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};

use build_layout::cleanup::DEFAULT_CLEAN_TASK;
use build_layout::config::{Manifest, Overrides, MANIFEST_FILE};
use build_layout::plan::BuildPlan;
use build_layout::tree::ProjectTree;

#[derive(Parser)]
#[command(name = "build-layout")]
#[command(about = "Relocate build output directories and order subproject evaluation")]
#[command(version)]
#[command(after_long_help = r#"
EXAMPLES:
    # Write a starter manifest from settings.gradle(.kts)
    build-layout init

    # Show the computed layout
    build-layout plan

    # Emit the layout for the host build engine
    build-layout plan --format json

    # Print the evaluation order
    build-layout order

    # Delete the shared output root
    build-layout clean

    # See what a cleanup task would delete
    build-layout clean cleanApp --dry-run
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to build-layout.toml (searched upward from the current directory by default)
    #[arg(long, global = true)]
    pub manifest: Option<PathBuf>,

    /// Override the shared output root
    #[arg(long, global = true)]
    pub output_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the finalized output layout and evaluation order
    Plan {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Print project names in evaluation order
    Order,

    /// Run a cleanup task
    Clean {
        /// Task name
        #[arg(default_value = DEFAULT_CLEAN_TASK)]
        task: String,

        /// Report what would be deleted without deleting it
        #[arg(long)]
        dry_run: bool,
    },

    /// Write a starter build-layout.toml
    Init {
        /// Project root directory
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Overwrite an existing manifest
        #[arg(long)]
        force: bool,
    },
}

/// Load the manifest and build a redirected tree.
pub fn load_tree(manifest: Option<&Path>, output_dir: Option<&Path>) -> anyhow::Result<ProjectTree> {
    let cwd = std::env::current_dir().context("Failed to read current directory")?;

    let manifest_path = match manifest {
        Some(path) => absolute(&cwd, path),
        None => Manifest::find(&cwd)?,
    };
    let root_dir = manifest_path
        .parent()
        .map_or_else(|| cwd.clone(), Path::to_path_buf);

    tracing::debug!("Using manifest {}", manifest_path.display());
    let manifest = Manifest::load(&manifest_path)?;

    let overrides = Overrides {
        output_dir: output_dir.map(|dir| absolute(&cwd, dir)),
    };

    let tree = manifest
        .build_tree(&root_dir, &overrides)
        .with_context(|| format!("Invalid configuration in {}", manifest_path.display()))?;
    Ok(tree)
}

fn absolute(cwd: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    }
}

pub fn show_plan(tree: &ProjectTree, format: &str) -> anyhow::Result<()> {
    let plan = BuildPlan::from_tree(tree)?;

    match format {
        "json" => println!("{}", plan.to_json()?),
        "text" => print!("{}", plan.render_text()),
        other => bail!("Unknown format '{}' (expected text or json)", other),
    }

    Ok(())
}

pub fn show_order(tree: &ProjectTree) -> anyhow::Result<()> {
    for name in tree.evaluation_order()? {
        println!("{}", name);
    }
    Ok(())
}

pub fn run_cleanup(tree: &ProjectTree, task_name: &str, dry_run: bool) -> anyhow::Result<()> {
    let Some(task) = tree.cleanup_task(task_name) else {
        let known: Vec<&str> = tree.cleanup_tasks().iter().map(|t| t.name.as_str()).collect();
        bail!(
            "No cleanup task named '{}' (available: {})",
            task_name,
            known.join(", ")
        );
    };

    let guard = tree.cleanup_guard()?;
    let report = if dry_run {
        task.preview(&guard)?
    } else {
        task.run(&guard)?
    };

    if !report.existed {
        println!("{}: {} does not exist, nothing to clean", task.name, task.target.display());
    } else if report.dry_run {
        println!(
            "{}: would remove {} ({} files, {} directories)",
            task.name,
            task.target.display(),
            report.files,
            report.directories
        );
    } else {
        println!(
            "{}: removed {} ({} files, {} directories)",
            task.name,
            task.target.display(),
            report.files,
            report.directories
        );
    }

    Ok(())
}

pub fn init_manifest(path: &Path, force: bool) -> anyhow::Result<()> {
    let manifest_path = path.join(MANIFEST_FILE);
    if manifest_path.exists() && !force {
        bail!(
            "{} already exists (use --force to overwrite)",
            manifest_path.display()
        );
    }

    let manifest = Manifest::starter(path)?;
    manifest.save(&manifest_path)?;

    println!("Wrote {}", manifest_path.display());
    if !manifest.subprojects.is_empty() {
        println!("  Subprojects: {}", manifest.subprojects.len());
    }
    if let Some(after) = &manifest.evaluation.after {
        println!("  Subprojects evaluate after: {}", after);
    }

    Ok(())
}
