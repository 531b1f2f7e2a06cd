use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};

use crate::platform::types::RepoRef;
use crate::queue::job::GateJob;
use crate::server::AppState;
use crate::webhook::events::{WebhookEvent, WorkflowRunEvent};
use crate::webhook::signature::verify_signature;

pub async fn handle_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    let signature = match headers.get("x-hub-signature-256").and_then(|v| v.to_str().ok()) {
        Some(sig) => sig.to_string(),
        None => {
            tracing::warn!("Missing X-Hub-Signature-256 header");
            return StatusCode::UNAUTHORIZED;
        }
    };

    let event_type = match headers.get("x-github-event").and_then(|v| v.to_str().ok()) {
        Some(et) => et.to_string(),
        None => {
            tracing::warn!("Missing X-GitHub-Event header");
            return StatusCode::BAD_REQUEST;
        }
    };

    let Some(secret) = state.config.webhook_secret() else {
        tracing::error!("No webhook secret configured");
        return StatusCode::INTERNAL_SERVER_ERROR;
    };
    if let Err(e) = verify_signature(secret, &body, &signature) {
        tracing::warn!(error = %e, "Webhook signature verification failed");
        return StatusCode::UNAUTHORIZED;
    }

    let event = match WebhookEvent::parse(&event_type, &body) {
        Ok(event) => event,
        Err(e) => {
            tracing::error!(error = %e, event_type = %event_type, "Failed to parse webhook event");
            return StatusCode::BAD_REQUEST;
        }
    };

    match event {
        WebhookEvent::WorkflowRun(run_event) => handle_workflow_run_event(&state, run_event).await,
        WebhookEvent::Ping => {
            tracing::info!("Received ping event");
            StatusCode::OK
        }
        WebhookEvent::Unsupported(event_type) => {
            tracing::debug!(event_type = %event_type, "Ignoring unsupported event");
            StatusCode::OK
        }
    }
}

async fn handle_workflow_run_event(state: &AppState, event: WorkflowRunEvent) -> StatusCode {
    if !event.is_completed() {
        tracing::debug!(action = %event.action, "Ignoring workflow_run action");
        return StatusCode::OK;
    }

    let workflow = event.workflow_name();
    if !state.config.gate.workflows.iter().any(|w| w == workflow) {
        tracing::debug!(
            repo = %event.repository.full_name,
            workflow,
            "Ignoring completion of a workflow that is not required"
        );
        return StatusCode::OK;
    }

    let repo = match RepoRef::parse(&event.repository.full_name) {
        Ok(repo) => repo,
        Err(e) => {
            tracing::warn!(error = %e, "Invalid repository in workflow_run event");
            return StatusCode::BAD_REQUEST;
        }
    };

    tracing::info!(
        repo = %repo,
        run_id = event.workflow_run.id,
        workflow,
        head_sha = %event.workflow_run.head_sha,
        "Required workflow completed, enqueuing reconciliation"
    );

    let job = GateJob {
        repo,
        installation_id: event.installation.as_ref().map(|i| i.id),
        event: event.completion_event(),
    };
    state.queue.enqueue(job).await;

    StatusCode::ACCEPTED
}
