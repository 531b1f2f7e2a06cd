use std::path::PathBuf;
use std::time::Duration;

use crate::config::AppConfig;
use crate::error::{AppError, Result};
use crate::gate::{self, GateRequest, Outcome};
use crate::platform::github::GitHubPlatform;
use crate::platform::types::RepoRef;
use crate::platform::{RepositoryClient, StatusReporter};
use crate::webhook::events::WorkflowRunEvent;

/// Values the GitHub Actions runner exposes to a step.
#[derive(Debug, Default, Clone)]
pub struct ActionEnv {
    pub event_name: Option<String>,
    pub event_path: Option<PathBuf>,
    pub repository: Option<String>,
    pub server_url: Option<String>,
    pub token: Option<String>,
}

impl ActionEnv {
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());
        Self {
            event_name: var("GITHUB_EVENT_NAME"),
            event_path: var("GITHUB_EVENT_PATH").map(PathBuf::from),
            repository: var("GITHUB_REPOSITORY"),
            server_url: var("GITHUB_SERVER_URL"),
            token: var("GITHUB_TOKEN"),
        }
    }
}

/// Command-line overrides for a single check.
#[derive(Debug, Default, Clone)]
pub struct CheckArgs {
    pub event_path: Option<PathBuf>,
    pub event_name: Option<String>,
    pub repo: Option<String>,
    pub timeout: Option<Duration>,
}

/// Accept only `workflow_run` events with the `completed` action.
pub fn parse_completion(event_name: &str, payload: &[u8]) -> Result<WorkflowRunEvent> {
    let rejected = || {
        AppError::Event(
            "This action can only be triggered by the workflow_run.completed event".to_string(),
        )
    };

    if event_name != "workflow_run" {
        return Err(rejected());
    }
    let event: WorkflowRunEvent = serde_json::from_slice(payload)
        .map_err(|e| AppError::Event(format!("Invalid workflow_run payload: {e}")))?;
    if !event.is_completed() {
        return Err(rejected());
    }
    Ok(event)
}

/// Single-shot reconciliation for the run described by the Actions event file.
pub async fn run_check(config: &AppConfig, env: &ActionEnv, args: &CheckArgs) -> Result<Outcome> {
    config.gate.validate()?;

    let event_name = args
        .event_name
        .as_deref()
        .or(env.event_name.as_deref())
        .ok_or_else(|| AppError::Event("GITHUB_EVENT_NAME is not set".to_string()))?;
    let event_path = args
        .event_path
        .as_ref()
        .or(env.event_path.as_ref())
        .ok_or_else(|| AppError::Event("GITHUB_EVENT_PATH is not set".to_string()))?;

    let payload = tokio::fs::read(event_path).await?;
    let event = parse_completion(event_name, &payload)?;
    tracing::debug!(payload = %String::from_utf8_lossy(&payload), "Loaded event payload");

    let repo = RepoRef::parse(
        args.repo
            .as_deref()
            .or(env.repository.as_deref())
            .unwrap_or(&event.repository.full_name),
    )?;

    let mut github = config.github.clone();
    if github.token.is_none() {
        github.token = env.token.clone();
    }
    let web_url = env.server_url.as_deref().unwrap_or(&github.web_url);

    let platform = GitHubPlatform::new(&github)?;
    let client = platform
        .repo(&repo, event.installation.as_ref().map(|i| i.id))
        .await?;
    let request = GateRequest::new(repo, event.completion_event(), &config.gate, web_url);

    reconcile_within(&client, &client, &request, args.timeout).await
}

/// Runs one reconciliation, aborting it once `limit` elapses.
pub async fn reconcile_within(
    runs: &dyn RepositoryClient,
    reporter: &dyn StatusReporter,
    request: &GateRequest,
    limit: Option<Duration>,
) -> Result<Outcome> {
    let reconciliation = gate::reconcile(runs, reporter, request);
    match limit {
        Some(limit) => tokio::time::timeout(limit, reconciliation)
            .await
            .map_err(|_| {
                AppError::Internal(format!(
                    "Reconciliation timed out after {}s",
                    limit.as_secs()
                ))
            })?,
        None => reconciliation.await,
    }
}
