use crate::gate::CompletionEvent;
use crate::platform::types::RepoRef;

/// One reconciliation request, as received from a webhook delivery.
#[derive(Debug, Clone)]
pub struct GateJob {
    pub repo: RepoRef,
    pub installation_id: Option<u64>,
    pub event: CompletionEvent,
}

impl GateJob {
    /// Jobs sharing a key run strictly one after another.
    pub fn key(&self) -> String {
        format!("{}@{}", self.repo, self.event.head_sha)
    }

    pub fn description(&self) -> String {
        format!(
            "Reconcile {} after run {} ({}) on {}",
            self.event.head_sha, self.event.run_id, self.event.workflow_name, self.repo
        )
    }
}
