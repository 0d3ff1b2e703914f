//! Subcommand logic
//!
//! Loads settings, builds a client, runs one operation and prints the
//! outcome as JSON on stdout. Exit codes: 0 on success, 1 when the call
//! failed, 2 when the remote reported `error` for the URL.

use anyhow::Result;
use serde::Serialize;
use std::path::Path;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    BypassRequest, ConfigLoader, PollOptions, Settings, VoltarClient,
    error::{format_error, format_error_for_logging},
    utils::get_detailed_version,
};

/// Options shared by every subcommand
#[derive(Debug, Default)]
pub struct GlobalArgs {
    pub config: Option<String>,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub verbose: bool,
}

/// The operation to run
#[derive(Debug)]
pub enum Action {
    Bypass {
        url: String,
        no_cache: bool,
    },
    Async {
        url: String,
        no_cache: bool,
        interval_ms: Option<u64>,
        timeout_ms: Option<u64>,
    },
    CreateTask {
        url: String,
        no_cache: bool,
    },
    TaskResult {
        task_id: String,
    },
    Services,
}

/// Run one subcommand and exit the process on failure
pub async fn run(args: GlobalArgs, action: Action) -> Result<()> {
    let settings = match build_settings(&args) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Invalid configuration: {}", format_error(&e));
            std::process::exit(1);
        }
    };

    init_logging(args.verbose, &settings.logging.level);
    debug!("voltar {}", get_detailed_version());
    debug!("Running {:?} against {}", action, settings.api.base_url);

    let client = match VoltarClient::from_settings(&settings) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Failed to create client: {}", format_error(&e));
            std::process::exit(1);
        }
    };

    let outcome = execute(&client, &settings, action).await;
    match outcome {
        Ok((output, remote_ok)) => {
            println!("{}", output);
            if !remote_ok {
                std::process::exit(2);
            }
            Ok(())
        }
        Err(e) => {
            debug!("{}", format_error_for_logging(&e));
            eprintln!("Error: {}", format_error(&e));
            std::process::exit(1);
        }
    }
}

/// Apply CLI overrides on top of file and environment configuration
///
/// Validation runs once, after the flags, so a flag can repair a bad file or
/// environment value.
pub fn build_settings(args: &GlobalArgs) -> crate::Result<Settings> {
    let mut settings = ConfigLoader::new().layered(args.config.as_deref().map(Path::new))?;

    if let Some(ref api_key) = args.api_key {
        settings.api.api_key = Some(api_key.clone());
    }
    if let Some(ref base_url) = args.base_url {
        settings.api.base_url = base_url.clone();
    }
    if args.verbose {
        settings.logging.verbose = true;
    }

    settings.validate()?;
    Ok(settings)
}

/// Poll options from settings with per-invocation overrides
pub fn poll_options(
    settings: &Settings,
    interval_ms: Option<u64>,
    timeout_ms: Option<u64>,
) -> PollOptions {
    let mut options = PollOptions::from(&settings.polling);
    if let Some(ms) = interval_ms {
        options = options.with_interval(Duration::from_millis(ms));
    }
    if let Some(ms) = timeout_ms {
        options = options.with_timeout(Duration::from_millis(ms));
    }
    options
}

fn init_logging(verbose: bool, level: &str) {
    let default_filter = if verbose { "debug" } else { level };
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

fn to_json<T: Serialize>(value: &T) -> crate::Result<String> {
    serde_json::to_string_pretty(value)
        .map_err(|e| crate::Error::normalization(format!("Failed to render output: {}", e)))
}

async fn execute(
    client: &VoltarClient,
    settings: &Settings,
    action: Action,
) -> crate::Result<(String, bool)> {
    match action {
        Action::Bypass { url, no_cache } => {
            let request = BypassRequest::new(url).with_cache(!no_cache);
            let result = client.bypass(&request).await?;
            Ok((to_json(&result)?, result.is_success()))
        }
        Action::Async {
            url,
            no_cache,
            interval_ms,
            timeout_ms,
        } => {
            let request = BypassRequest::new(url).with_cache(!no_cache);
            let options = poll_options(settings, interval_ms, timeout_ms);

            let token = CancellationToken::new();
            let signal_token = token.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    info!("Interrupted, cancelling task polling");
                    signal_token.cancel();
                }
            });

            let task = client
                .bypass_async_with_cancel(&request, options, &token)
                .await?;
            let remote_ok = task.state == crate::TaskState::Success;
            Ok((to_json(&task)?, remote_ok))
        }
        Action::CreateTask { url, no_cache } => {
            let request = BypassRequest::new(url).with_cache(!no_cache);
            let created = client.create_task(&request).await?;
            let remote_ok = created.accepted_id().is_some();
            Ok((to_json(&created)?, remote_ok))
        }
        Action::TaskResult { task_id } => {
            let task = client.get_task_result(&task_id).await?;
            let remote_ok = task.state != crate::TaskState::Error;
            Ok((to_json(&task)?, remote_ok))
        }
        Action::Services => {
            let catalog = client.services().await?;
            Ok((to_json(&catalog)?, true))
        }
    }
}
