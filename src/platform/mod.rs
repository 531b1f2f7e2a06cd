pub mod github;
pub mod types;

use async_trait::async_trait;

use crate::error::Result;
use types::*;

/// Read access to the workflow runs of one repository.
#[async_trait]
pub trait RepositoryClient: Send + Sync {
    /// Fetch a single workflow run. `None` means the API answered without data.
    async fn get_workflow_run(&self, run_id: u64) -> Result<Option<WorkflowRun>>;

    /// List the workflow runs recorded for a commit, first page only.
    async fn list_workflow_runs(
        &self,
        head_sha: &str,
        per_page: u8,
    ) -> Result<Option<Vec<WorkflowRunSummary>>>;
}

/// Sink for commit statuses of one repository.
#[async_trait]
pub trait StatusReporter: Send + Sync {
    async fn create_commit_status(&self, sha: &str, status: &CommitStatus) -> Result<()>;
}
