use octocrab::models::StatusState;
use serde::Deserialize;

use crate::platform::types;

/// Workflow run as serialized by the REST API (fields we read).
#[derive(Debug, Deserialize)]
pub struct RunPayload {
    pub id: u64,
    #[serde(default)]
    pub name: Option<String>,
    pub head_sha: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub conclusion: Option<String>,
    #[serde(default)]
    pub html_url: String,
}

#[derive(Debug, Deserialize)]
pub struct RunListPayload {
    #[serde(default)]
    pub total_count: Option<u64>,
    #[serde(default)]
    pub workflow_runs: Option<Vec<RunSummaryPayload>>,
}

#[derive(Debug, Deserialize)]
pub struct RunSummaryPayload {
    pub id: u64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub conclusion: Option<String>,
    #[serde(default)]
    pub html_url: String,
}

pub fn map_run(run: RunPayload) -> types::WorkflowRun {
    types::WorkflowRun {
        id: run.id,
        name: run.name,
        head_sha: run.head_sha,
        conclusion: concluded(run.status.as_deref(), run.conclusion),
        html_url: run.html_url,
    }
}

pub fn map_run_list(list: RunListPayload) -> Option<Vec<types::WorkflowRunSummary>> {
    let runs = list.workflow_runs?;
    Some(runs.into_iter().map(map_run_summary).collect())
}

fn map_run_summary(run: RunSummaryPayload) -> types::WorkflowRunSummary {
    types::WorkflowRunSummary {
        id: run.id,
        name: run.name,
        conclusion: concluded(run.status.as_deref(), run.conclusion),
        html_url: run.html_url,
    }
}

/// A conclusion only counts once the run is completed. Re-run attempts keep the
/// previous attempt's conclusion around while the new attempt is in progress.
fn concluded(status: Option<&str>, conclusion: Option<String>) -> Option<String> {
    match status {
        Some(status) if status != "completed" => None,
        _ => conclusion.filter(|c| !c.is_empty()),
    }
}

pub fn status_state(state: types::CommitState) -> StatusState {
    match state {
        types::CommitState::Pending => StatusState::Pending,
        types::CommitState::Success => StatusState::Success,
        types::CommitState::Failure => StatusState::Failure,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_run_list() {
        let payload: RunListPayload = serde_json::from_value(serde_json::json!({
            "total_count": 3,
            "workflow_runs": [
                { "id": 1, "name": "Build", "status": "completed", "conclusion": "success", "html_url": "https://example.com/1" },
                { "id": 2, "name": null, "status": "queued", "conclusion": null, "html_url": "https://example.com/2" },
                { "id": 3, "name": "Test", "status": "in_progress", "conclusion": "failure", "html_url": "https://example.com/3" }
            ]
        }))
        .unwrap();

        let runs = map_run_list(payload).unwrap();
        assert_eq!(runs.len(), 3);
        assert_eq!(runs[0].conclusion.as_deref(), Some("success"));
        assert_eq!(runs[1].name, None);
        assert_eq!(runs[1].conclusion, None);
        // stale conclusion from a previous attempt
        assert_eq!(runs[2].conclusion, None);
    }

    #[test]
    fn test_map_run_list_without_runs_is_no_data() {
        let payload: RunListPayload =
            serde_json::from_value(serde_json::json!({ "total_count": 0 })).unwrap();
        assert!(map_run_list(payload).is_none());
    }

    #[test]
    fn test_map_run_without_status() {
        let payload: RunPayload = serde_json::from_value(serde_json::json!({
            "id": 123,
            "name": "Build",
            "head_sha": "abc123",
            "conclusion": "success"
        }))
        .unwrap();

        let run = map_run(payload);
        assert_eq!(run.head_sha, "abc123");
        assert_eq!(run.conclusion.as_deref(), Some("success"));
        assert_eq!(run.html_url, "");
    }

    #[test]
    fn test_status_state_mapping() {
        use types::CommitState;

        assert!(matches!(
            status_state(CommitState::Pending),
            StatusState::Pending
        ));
        assert!(matches!(
            status_state(CommitState::Success),
            StatusState::Success
        ));
        assert!(matches!(
            status_state(CommitState::Failure),
            StatusState::Failure
        ));
    }
}
