//! Federated portfolio CLI entry point.
//!
//! Binary name: `pfolio`
//!
//! Parses CLI arguments, wires the index services, then dispatches to the
//! appropriate command handler.

mod cli;
mod state;

use clap::Parser;
use clap_complete::generate;
use tracing_subscriber::EnvFilter;

use cli::{CacheAction, Cli, Commands};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up tracing based on verbosity
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info,portfolio=debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Shell completions don't need app state
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "pfolio", &mut std::io::stdout());
        return Ok(());
    }

    let state = AppState::init().await?;

    match cli.command {
        Commands::Search(args) => {
            cli::search::search(&state, args, cli.json).await?;
        }

        Commands::Find { name } => {
            cli::element::find(&state, &name, cli.json).await?;
        }

        Commands::List { element_type } => {
            cli::element::list(&state, element_type, cli.json).await?;
        }

        Commands::Updates { name } => {
            cli::element::updates(&state, &name, cli.json).await?;
        }

        Commands::Stats => {
            cli::stats::stats(&state, cli.json).await?;
        }

        Commands::Cache { action } => match action {
            CacheAction::Stats => cli::cache::stats(&state, cli.json)?,
            CacheAction::Clear => cli::cache::clear(&state, cli.json)?,
            CacheAction::Invalidate { action } => {
                cli::cache::invalidate(&state, action, cli.json).await?;
            }
            CacheAction::Refresh => cli::cache::refresh(&state, cli.json).await?,
        },

        Commands::Rebuild => {
            cli::cache::rebuild(&state, cli.json).await?;
        }

        Commands::Completions { .. } => unreachable!("handled above"),
    }

    Ok(())
}
