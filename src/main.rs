use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use required_gate::action::{run_check, ActionEnv, CheckArgs};
use required_gate::config::{parse_workflow_list, AppConfig};
use required_gate::server::{create_router, AppState};
use required_gate::shutdown::{graceful_shutdown, wait_for_shutdown};

#[derive(Parser)]
#[command(
    name = "required-gate",
    about = "Aggregate required GitHub Actions workflows into one commit status"
)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Reconcile once for the workflow_run event of the current Actions job
    Check {
        /// Event payload file (defaults to GITHUB_EVENT_PATH)
        #[arg(long)]
        event: Option<PathBuf>,
        /// Event name (defaults to GITHUB_EVENT_NAME)
        #[arg(long)]
        event_name: Option<String>,
        /// Repository as owner/name (defaults to GITHUB_REPOSITORY)
        #[arg(long)]
        repo: Option<String>,
        /// Required workflow name; repeat or separate with newlines
        #[arg(short, long = "workflow")]
        workflows: Vec<String>,
        /// Commit status context
        #[arg(long)]
        status_name: Option<String>,
        /// List attempts while waiting for the triggering run to show up
        #[arg(long)]
        retries: Option<u32>,
        /// Delay between attempts, in milliseconds
        #[arg(long)]
        delay_ms: Option<u64>,
        /// Abort the whole reconciliation after this many seconds
        #[arg(long)]
        timeout_secs: Option<u64>,
    },
    /// Receive workflow_run webhooks and reconcile each completion
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if cli.json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    let mut config = AppConfig::load(cli.config.as_deref())?;

    match cli.command {
        Command::Check {
            event,
            event_name,
            repo,
            workflows,
            status_name,
            retries,
            delay_ms,
            timeout_secs,
        } => {
            let workflows = parse_workflow_list(&workflows);
            if !workflows.is_empty() {
                config.gate.workflows = workflows;
            }
            if let Some(status_name) = status_name {
                config.gate.status_name = status_name;
            }
            if let Some(retries) = retries {
                config.gate.retries = retries;
            }
            if let Some(delay_ms) = delay_ms {
                config.gate.delay_ms = delay_ms;
            }

            let args = CheckArgs {
                event_path: event,
                event_name,
                repo,
                timeout: timeout_secs.map(Duration::from_secs),
            };
            let outcome = run_check(&config, &ActionEnv::from_env(), &args).await?;
            tracing::info!(outcome = outcome.as_str(), "Check finished");
            Ok(())
        }
        Command::Serve => serve(config).await,
    }
}

async fn serve(config: AppConfig) -> anyhow::Result<()> {
    tracing::info!(
        host = %config.server.host,
        port = %config.server.port,
        workflows = %config.gate.workflows.join(", "),
        status_name = %config.gate.status_name,
        "Starting required-gate server"
    );

    let state = Arc::new(AppState::new(config.clone())?);
    let app = create_router(Arc::clone(&state));

    let listener = tokio::net::TcpListener::bind(format!(
        "{}:{}",
        config.server.host, config.server.port
    ))
    .await?;

    tracing::info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(wait_for_shutdown())
        .await?;

    graceful_shutdown(&state).await;

    Ok(())
}
