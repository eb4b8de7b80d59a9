mod cli;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{Cli, Commands};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "build_layout=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init { path, force } => {
            cli::init_manifest(&path, force)?;
        }
        Commands::Plan { format } => {
            let tree = cli::load_tree(cli.manifest.as_deref(), cli.output_dir.as_deref())?;
            cli::show_plan(&tree, &format)?;
        }
        Commands::Order => {
            let tree = cli::load_tree(cli.manifest.as_deref(), cli.output_dir.as_deref())?;
            cli::show_order(&tree)?;
        }
        Commands::Clean { task, dry_run } => {
            let tree = cli::load_tree(cli.manifest.as_deref(), cli.output_dir.as_deref())?;
            cli::run_cleanup(&tree, &task, dry_run)?;
        }
    }

    Ok(())
}
