//! Chat API command-line client
//!
//! Single binary that:
//! 1. Loads `[api]` config (file + env overlay)
//! 2. Builds a cookie-keeping HTTP transport and a CSRF-aware dispatcher
//! 3. Runs one command (raw request, projects, conversations, token check)
//! 4. Prints the JSON result to stdout; logs go to stderr as JSON lines

mod api;
mod cli;
mod config;
mod metrics;
mod notifier;

use std::sync::Arc;

use anyhow::{Context, Result};
use dispatch::{ApiClient, Dispatcher, RequestOptions};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use transport::ReqwestTransport;

use crate::cli::Command;
use crate::config::Config;
use crate::notifier::TracingNotifier;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and LOG_LEVEL / RUST_LOG support
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_env("LOG_LEVEL")
                .or_else(|_| EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let cli = cli::parse(&args)?;

    let prometheus = if cli.metrics {
        Some(metrics::install_recorder()?)
    } else {
        None
    };

    let config_path = Config::resolve_path(cli.config_path.as_deref());
    let config = Config::load(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;

    info!(
        base_url = %config.api.base_url,
        timeout_secs = config.api.timeout_secs,
        "configuration loaded"
    );

    let transport = ReqwestTransport::new(&config.transport_config())
        .context("failed to build HTTP transport")?;
    let dispatcher = Dispatcher::new(Arc::new(transport), config.api.base_url.clone());
    let client = ApiClient::new(dispatcher, Arc::new(TracingNotifier));

    let outcome = run(&client, cli.command).await;

    if let Some(handle) = prometheus {
        print!("{}", handle.render());
    }
    outcome
}

async fn run(client: &ApiClient, command: Command) -> Result<()> {
    match command {
        Command::Token => {
            client
                .dispatcher()
                .tokens()
                .get_token()
                .await
                .context("failed to fetch CSRF token")?;
            info!("csrf token acquired");
            println!("ok");
        }
        Command::Request {
            method,
            endpoint,
            body,
        } => {
            let mut options = RequestOptions::new(method);
            if let Some(body) = body {
                options = options.body(body);
            }
            let value = client.send(&endpoint, options).await?;
            print_json(&value)?;
        }
        Command::ProjectsList => print_json(&api::list_projects(client).await?)?,
        Command::ProjectsCreate { name, description } => {
            let project = api::create_project(client, &name, description.as_deref()).await?;
            print_json(&project)?;
        }
        Command::ProjectsDelete { id } => {
            api::delete_project(client, id).await?;
            println!("deleted project {id}");
        }
        Command::ConversationsList { project_id } => {
            print_json(&api::list_conversations(client, project_id).await?)?
        }
        Command::ConversationsCreate { project_id, title } => {
            let conversation = api::create_conversation(client, project_id, &title).await?;
            print_json(&conversation)?;
        }
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
