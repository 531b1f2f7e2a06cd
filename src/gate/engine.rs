use crate::error::{AppError, Result};
use crate::platform::types::{CommitState, CommitStatus};
use crate::platform::{RepositoryClient, StatusReporter};

use super::classify::Classification;
use super::{GateRequest, Outcome, RUNS_PER_PAGE};

/// What a single poll of the run list calls for.
#[derive(Debug, PartialEq, Eq)]
enum Decision {
    /// Publish and stop.
    Report { outcome: Outcome, status: CommitStatus },
    /// The list has not caught up yet. Publish once, then poll again.
    AwaitVisibility(CommitStatus),
    /// No rule applied.
    Unhandled,
}

/// Reconcile the required workflows of the triggering run's commit and publish
/// at most one terminal commit status.
///
/// The only re-poll happens while the run list does not yet show the
/// triggering run's conclusion or a required workflow at all; it is bounded by
/// `max_attempts` and publishes a single pending status for the whole wait.
/// Collaborator errors are not retried.
pub async fn reconcile(
    runs: &dyn RepositoryClient,
    reporter: &dyn StatusReporter,
    request: &GateRequest,
) -> Result<Outcome> {
    let event = &request.event;

    let run = runs
        .get_workflow_run(event.run_id)
        .await?
        .ok_or(AppError::MissingData("Workflow data"))?;
    let head_sha = run.head_sha;

    tracing::info!(
        repo = %request.repo,
        run_id = run.id,
        workflow = run.name.as_deref().unwrap_or_default(),
        head_sha = %head_sha,
        url = %run.html_url,
        checks = %request.repo.checks_url(&request.web_url, &head_sha),
        "Processing completed workflow run"
    );

    let max_attempts = request.max_attempts.max(1);
    let mut reported_wait = false;

    for attempt in 1..=max_attempts {
        let listed = runs
            .list_workflow_runs(&head_sha, RUNS_PER_PAGE)
            .await?
            .ok_or(AppError::MissingData("Workflow runs data"))?;

        let classification = Classification::of(&listed, &request.required);
        tracing::debug!(
            attempt,
            expected = %request.required.join(", "),
            found = classification.matching.len(),
            successful = classification.successful.len(),
            unsuccessful = classification.unsuccessful.len(),
            pending = classification.pending.len(),
            "Classified workflow runs"
        );

        match decide(request, &head_sha, &classification) {
            Decision::Report { outcome, status } => {
                reporter.create_commit_status(&head_sha, &status).await?;
                tracing::info!(
                    head_sha = %head_sha,
                    state = %status.state,
                    description = %status.description,
                    attempt,
                    "Reported required workflows status"
                );
                return Ok(outcome);
            }
            Decision::AwaitVisibility(status) => {
                if !reported_wait {
                    reporter.create_commit_status(&head_sha, &status).await?;
                    reported_wait = true;
                }
                tracing::info!(
                    attempt,
                    max_attempts,
                    description = %status.description,
                    "Run list has not caught up yet"
                );
                if attempt < max_attempts {
                    tokio::time::sleep(request.retry_delay).await;
                }
            }
            Decision::Unhandled => {
                return Err(AppError::UnhandledState(format!(
                    "event: {}, workflow runs: {}",
                    serde_json::to_string(event)?,
                    serde_json::to_string(&listed)?
                )));
            }
        }
    }

    tracing::warn!(
        head_sha = %head_sha,
        run_id = event.run_id,
        max_attempts,
        "Gave up waiting for the run list to report the triggering run"
    );
    Ok(Outcome::GaveUp)
}

fn decide(request: &GateRequest, head_sha: &str, runs: &Classification<'_>) -> Decision {
    let event = &request.event;
    let total = runs.matching.len();
    let status = |state, description: String, target_url: &str| {
        CommitStatus::new(
            state,
            &request.status_name,
            description,
            Some(target_url.to_string()),
        )
    };

    if let Some(first) = runs.unsuccessful.first() {
        return Decision::Report {
            outcome: Outcome::Failure,
            status: status(
                CommitState::Failure,
                format!(
                    "{} of {total} required workflows were not successful",
                    runs.unsuccessful.len()
                ),
                &first.html_url,
            ),
        };
    }

    // The triggering run counts as observed once the list shows its conclusion.
    let waiting_for = if runs.has_concluded(event.run_id) {
        runs.missing(&request.required)
    } else {
        vec![event.workflow_name.as_str()]
    };
    if !waiting_for.is_empty() {
        return Decision::AwaitVisibility(status(
            CommitState::Pending,
            format!(
                "Waiting for conclusion to be reported for {}...",
                waiting_for.join(", ")
            ),
            &event.html_url,
        ));
    }

    if let Some(first) = runs.pending.first() {
        return Decision::Report {
            outcome: Outcome::PendingOtherRuns,
            status: status(
                CommitState::Pending,
                format!(
                    "{} of {total} required workflows are still pending...",
                    runs.pending.len()
                ),
                &first.html_url,
            ),
        };
    }

    if !runs.successful.is_empty() {
        return Decision::Report {
            outcome: Outcome::Success,
            status: status(
                CommitState::Success,
                format!(
                    "All {} observed required workflows have succeeded",
                    runs.successful.len()
                ),
                &request.repo.checks_url(&request.web_url, head_sha),
            ),
        };
    }

    Decision::Unhandled
}
