use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{routing::post, Router};
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;
use crate::error::{AppError, Result};
use crate::gate::{self, GateRequest, Outcome};
use crate::platform::github::GitHubPlatform;
use crate::queue::job::GateJob;
use crate::queue::{GateQueue, JobRunner};

/// How long a per-commit worker lingers without work.
const WORKER_IDLE_TIMEOUT: Duration = Duration::from_secs(300);

pub struct AppState {
    pub config: AppConfig,
    pub queue: GateQueue,
}

impl AppState {
    pub fn new(config: AppConfig) -> Result<Self> {
        if config.webhook_secret().map_or(true, str::is_empty) {
            return Err(AppError::Config(
                "github.webhook_secret is required to serve webhooks".to_string(),
            ));
        }
        config.gate.validate()?;

        let platform = GitHubPlatform::new(&config.github)?;
        let gatekeeper = Gatekeeper {
            config: config.clone(),
            platform,
        };
        let queue = GateQueue::new(Arc::new(gatekeeper), WORKER_IDLE_TIMEOUT);

        Ok(Self { config, queue })
    }

    pub fn with_queue(config: AppConfig, queue: GateQueue) -> Self {
        Self { config, queue }
    }
}

/// Runs queued reconciliations against GitHub.
struct Gatekeeper {
    config: AppConfig,
    platform: GitHubPlatform,
}

impl Gatekeeper {
    async fn reconcile(&self, job: &GateJob) -> Result<Outcome> {
        let repo = self.platform.repo(&job.repo, job.installation_id).await?;
        let request = GateRequest::new(
            job.repo.clone(),
            job.event.clone(),
            &self.config.gate,
            &self.config.github.web_url,
        );
        gate::reconcile(&repo, &repo, &request).await
    }
}

#[async_trait]
impl JobRunner for Gatekeeper {
    async fn run(&self, job: GateJob) {
        match self.reconcile(&job).await {
            Ok(outcome) => tracing::info!(
                key = %job.key(),
                outcome = outcome.as_str(),
                "Reconciliation finished"
            ),
            Err(e) => tracing::error!(
                key = %job.key(),
                error = %e,
                "Reconciliation failed"
            ),
        }
    }
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/webhooks/github", post(crate::webhook::handler::handle_webhook))
        .route("/health", axum::routing::get(health_check))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "ok"
}
