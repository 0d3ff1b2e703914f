//! Command-line client for the Voltar bypass API
//!
//! # Usage
//!
//! ```bash
//! voltar --api-key KEY bypass "https://linkvertise.com/1239053/delta-executor1"
//! voltar --api-key KEY async "https://linkvertise.com/1239053/delta-executor1" --timeout-ms 60000
//! voltar --api-key KEY services
//! ```
//!
//! The API key may also come from `VOLTAR_API_KEY` or the config file.

use clap::{Parser, Subcommand};

use voltar_client::cli::{Action, GlobalArgs, run};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(name = "voltar")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<String>,

    /// API key (overrides VOLTAR_API_KEY and the config file)
    #[arg(long, global = true, value_name = "KEY")]
    api_key: Option<String>,

    /// Base URL of the bypass API
    #[arg(long, global = true, value_name = "URL")]
    base_url: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a URL in a single request
    Bypass {
        /// URL to bypass
        url: String,

        /// Ask the service not to answer from its cache
        #[arg(long)]
        no_cache: bool,
    },

    /// Create a task and poll until it finishes
    Async {
        /// URL to bypass
        url: String,

        /// Ask the service not to answer from its cache
        #[arg(long)]
        no_cache: bool,

        /// Delay between status checks in milliseconds
        #[arg(long, value_name = "MS")]
        interval_ms: Option<u64>,

        /// Give up after this many milliseconds
        #[arg(long, value_name = "MS")]
        timeout_ms: Option<u64>,
    },

    /// Create a task without waiting for it
    CreateTask {
        /// URL to bypass
        url: String,

        /// Ask the service not to answer from its cache
        #[arg(long)]
        no_cache: bool,
    },

    /// Show the current state of a task
    TaskResult {
        /// Task id returned by create-task
        task_id: String,
    },

    /// List supported ad-link and key-system providers
    Services,
}

impl From<Commands> for Action {
    fn from(command: Commands) -> Self {
        match command {
            Commands::Bypass { url, no_cache } => Action::Bypass { url, no_cache },
            Commands::Async {
                url,
                no_cache,
                interval_ms,
                timeout_ms,
            } => Action::Async {
                url,
                no_cache,
                interval_ms,
                timeout_ms,
            },
            Commands::CreateTask { url, no_cache } => Action::CreateTask { url, no_cache },
            Commands::TaskResult { task_id } => Action::TaskResult { task_id },
            Commands::Services => Action::Services,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let args = GlobalArgs {
        config: cli.config,
        api_key: cli.api_key,
        base_url: cli.base_url,
        verbose: cli.verbose,
    };

    run(args, cli.command.into()).await
}
