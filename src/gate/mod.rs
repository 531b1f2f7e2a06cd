pub mod classify;
pub mod engine;

use std::time::Duration;

use serde::Serialize;

use crate::config::GateConfig;
use crate::platform::types::RepoRef;

pub use engine::reconcile;

/// Runs requested per list call. Later pages are not fetched.
pub const RUNS_PER_PAGE: u8 = 100;

/// The completed workflow run that triggered this reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletionEvent {
    pub run_id: u64,
    pub workflow_name: String,
    pub head_sha: String,
    pub conclusion: Option<String>,
    pub html_url: String,
}

/// Everything one reconciliation needs besides its collaborators.
#[derive(Debug, Clone)]
pub struct GateRequest {
    pub repo: RepoRef,
    pub event: CompletionEvent,
    pub required: Vec<String>,
    pub status_name: String,
    pub max_attempts: u32,
    pub retry_delay: Duration,
    pub web_url: String,
}

impl GateRequest {
    pub fn new(repo: RepoRef, event: CompletionEvent, gate: &GateConfig, web_url: &str) -> Self {
        Self {
            repo,
            event,
            required: gate.workflows.clone(),
            status_name: gate.status_name.clone(),
            max_attempts: gate.retries,
            retry_delay: gate.delay(),
            web_url: web_url.to_string(),
        }
    }
}

/// Terminal result of one reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// At least one required workflow concluded unsuccessfully.
    Failure,
    /// The triggering run was visible, but other required runs are still going.
    PendingOtherRuns,
    /// Every required workflow was observed and succeeded (or was skipped).
    Success,
    /// The list never caught up within the retry budget.
    GaveUp,
}

impl Outcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Failure => "failure",
            Outcome::PendingOtherRuns => "pending",
            Outcome::Success => "success",
            Outcome::GaveUp => "gave-up",
        }
    }
}
