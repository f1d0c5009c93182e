//! Command-line interface definitions.
//!
//! Two subcommands, deliberately independent: `collect` gathers and
//! persists today's batch, `analyze` aggregates the most recent batch into
//! a topic summary. They share nothing but the data directory, so they can
//! run on separate schedules.

use clap::{Parser, Subcommand};

/// Command-line arguments.
///
/// # Examples
///
/// ```sh
/// # Collect today's articles into ./_data
/// notiziario collect
///
/// # Analyze the latest batch with a local annotation service
/// notiziario analyze --annotator-url http://127.0.0.1:8000
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Directory where article batches and topic summaries are stored
    #[arg(short, long, env = "NOTIZIARIO_DATA_DIR", default_value = "_data")]
    pub data_dir: String,

    /// Optional YAML source registry (defaults to the built-in Italian outlets)
    #[arg(short, long)]
    pub sources: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Collect articles from every configured source and persist the batch
    Collect,
    /// Aggregate the most recent batch into a topic summary
    Analyze {
        /// Base URL of the text annotation service
        #[arg(long, env = "ANNOTATOR_URL", default_value = "http://127.0.0.1:8000")]
        annotator_url: String,
    },
}
