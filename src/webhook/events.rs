use serde::Deserialize;

use crate::gate::CompletionEvent;

/// Top-level webhook event parsed from the payload based on X-GitHub-Event header.
#[derive(Debug)]
pub enum WebhookEvent {
    WorkflowRun(WorkflowRunEvent),
    Ping,
    Unsupported(String),
}

/// `workflow_run` delivery. Also the shape of `GITHUB_EVENT_PATH` for
/// workflows triggered by `on: workflow_run`.
#[derive(Debug, Deserialize)]
pub struct WorkflowRunEvent {
    pub action: String,
    pub workflow_run: WorkflowRunPayload,
    pub repository: RepositoryPayload,
    pub installation: Option<InstallationPayload>,
}

#[derive(Debug, Deserialize)]
pub struct WorkflowRunPayload {
    pub id: u64,
    #[serde(default)]
    pub name: Option<String>,
    pub head_sha: String,
    #[serde(default)]
    pub conclusion: Option<String>,
    #[serde(default)]
    pub html_url: String,
}

#[derive(Debug, Deserialize)]
pub struct RepositoryPayload {
    pub full_name: String,
}

#[derive(Debug, Deserialize)]
pub struct InstallationPayload {
    pub id: u64,
}

impl WebhookEvent {
    pub fn parse(event_type: &str, payload: &[u8]) -> Result<Self, serde_json::Error> {
        match event_type {
            "workflow_run" => {
                let event: WorkflowRunEvent = serde_json::from_slice(payload)?;
                Ok(WebhookEvent::WorkflowRun(event))
            }
            "ping" => Ok(WebhookEvent::Ping),
            other => Ok(WebhookEvent::Unsupported(other.to_string())),
        }
    }
}

impl WorkflowRunEvent {
    pub fn is_completed(&self) -> bool {
        self.action == "completed"
    }

    pub fn workflow_name(&self) -> &str {
        self.workflow_run.name.as_deref().unwrap_or_default()
    }

    pub fn completion_event(&self) -> CompletionEvent {
        CompletionEvent {
            run_id: self.workflow_run.id,
            workflow_name: self.workflow_name().to_string(),
            head_sha: self.workflow_run.head_sha.clone(),
            conclusion: self.workflow_run.conclusion.clone(),
            html_url: self.workflow_run.html_url.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAYLOAD: &str = r#"{
        "action": "completed",
        "workflow_run": {
            "id": 123,
            "name": "Build",
            "head_sha": "abc123",
            "status": "completed",
            "conclusion": "success",
            "html_url": "https://github.com/octo/widgets/actions/runs/123"
        },
        "repository": { "id": 1, "full_name": "octo/widgets" },
        "installation": { "id": 99 }
    }"#;

    #[test]
    fn test_parse_workflow_run() {
        let event = WebhookEvent::parse("workflow_run", PAYLOAD.as_bytes()).unwrap();
        let WebhookEvent::WorkflowRun(event) = event else {
            panic!("expected workflow_run event");
        };

        assert!(event.is_completed());
        assert_eq!(event.repository.full_name, "octo/widgets");
        assert_eq!(event.installation.as_ref().map(|i| i.id), Some(99));

        let completion = event.completion_event();
        assert_eq!(completion.run_id, 123);
        assert_eq!(completion.workflow_name, "Build");
        assert_eq!(completion.head_sha, "abc123");
        assert_eq!(completion.conclusion.as_deref(), Some("success"));
    }

    #[test]
    fn test_parse_other_events() {
        assert!(matches!(
            WebhookEvent::parse("ping", b"{}").unwrap(),
            WebhookEvent::Ping
        ));
        assert!(matches!(
            WebhookEvent::parse("push", b"{}").unwrap(),
            WebhookEvent::Unsupported(name) if name == "push"
        ));
    }

    #[test]
    fn test_parse_rejects_malformed_workflow_run() {
        assert!(WebhookEvent::parse("workflow_run", br#"{"action":"completed"}"#).is_err());
    }
}
