//! CLI command definitions for the `pfolio` binary.
//!
//! Uses clap derive macros for argument parsing. Every command accepts the
//! global `--json` flag for machine-readable output.

pub mod cache;
pub mod element;
pub mod search;
pub mod stats;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

use portfolio_types::element::{ElementType, Source};
use portfolio_types::unified::{ActionKind, SortBy};

/// Search your element portfolio across local, GitHub, and collection sources.
#[derive(Parser)]
#[command(name = "pfolio", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Search every enabled source for elements matching a query.
    #[command(alias = "s")]
    Search(SearchArgs),

    /// Find one element by name, honoring source priority.
    Find {
        /// Element name (case-insensitive; slugs like `creative-writer` match).
        name: String,
    },

    /// List every element of one type, deduplicated across sources.
    #[command(alias = "ls")]
    List {
        /// Element type (persona, skill, template, agent, memory, ensemble).
        element_type: ElementType,
    },

    /// Compare an element's versions across sources.
    Updates {
        /// Element name.
        name: String,
    },

    /// Show per-source and combined index statistics.
    Stats,

    /// Inspect or reset the remote portfolio cache.
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },

    /// Rebuild the local index and drop the remote and collection caches.
    Rebuild,

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

#[derive(Args)]
pub struct SearchArgs {
    /// Search query. An empty query matches everything.
    #[arg(default_value = "")]
    pub query: String,

    /// Only return elements of this type.
    #[arg(long = "type", short = 't')]
    pub element_type: Option<ElementType>,

    /// Query every enabled source instead of stopping at the first hit.
    #[arg(long)]
    pub all: bool,

    /// Source to try first.
    #[arg(long)]
    pub prefer: Option<Source>,

    /// Source order for this search only (comma-separated, e.g. github,local).
    #[arg(long, value_delimiter = ',')]
    pub priority: Option<Vec<String>>,

    /// Skip the local portfolio.
    #[arg(long)]
    pub no_local: bool,

    /// Skip the GitHub portfolio.
    #[arg(long)]
    pub no_github: bool,

    /// Skip the community collection.
    #[arg(long)]
    pub no_collection: bool,

    /// Page number (1-based).
    #[arg(long)]
    pub page: Option<usize>,

    /// Results per page.
    #[arg(long)]
    pub page_size: Option<usize>,

    /// Sort order: relevance, name, or source.
    #[arg(long, default_value = "relevance")]
    pub sort: SortBy,
}

#[derive(Subcommand)]
pub enum CacheAction {
    /// Show remote cache freshness.
    Stats,

    /// Drop the cached remote index.
    Clear,

    /// Mark the remote index stale after a portfolio write.
    Invalidate {
        /// The action performed (submit, create, update, delete, sync).
        action: ActionKind,
    },

    /// Refresh the remote index now, ignoring the TTL.
    Refresh,
}
