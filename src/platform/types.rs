use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// GitHub rejects commit status descriptions longer than this.
pub const MAX_DESCRIPTION_CHARS: usize = 140;

/// An `owner/name` repository reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoRef {
    pub owner: String,
    pub name: String,
}

impl RepoRef {
    pub fn parse(full_name: &str) -> Result<Self> {
        match full_name.split_once('/') {
            Some((owner, name)) if !owner.is_empty() && !name.is_empty() && !name.contains('/') => {
                Ok(Self {
                    owner: owner.to_string(),
                    name: name.to_string(),
                })
            }
            _ => Err(AppError::Config(format!("Invalid repo name: {full_name}"))),
        }
    }

    /// Checks overview page for a commit.
    pub fn checks_url(&self, web_url: &str, sha: &str) -> String {
        format!(
            "{}/{}/{}/commit/{sha}/checks",
            web_url.trim_end_matches('/'),
            self.owner,
            self.name
        )
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// A single workflow run, as returned by the get-run endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkflowRun {
    pub id: u64,
    pub name: Option<String>,
    pub head_sha: String,
    pub conclusion: Option<String>,
    pub html_url: String,
}

/// One entry of the list-runs endpoint.
///
/// `conclusion` is `None` while the run is still queued or in progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkflowRunSummary {
    pub id: u64,
    pub name: Option<String>,
    pub conclusion: Option<String>,
    pub html_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommitState {
    Pending,
    Success,
    Failure,
}

impl CommitState {
    pub fn as_str(self) -> &'static str {
        match self {
            CommitState::Pending => "pending",
            CommitState::Success => "success",
            CommitState::Failure => "failure",
        }
    }
}

impl fmt::Display for CommitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A commit status to publish under `context`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitStatus {
    pub state: CommitState,
    pub context: String,
    pub description: String,
    pub target_url: Option<String>,
}

impl CommitStatus {
    pub fn new(
        state: CommitState,
        context: &str,
        description: impl Into<String>,
        target_url: Option<String>,
    ) -> Self {
        Self {
            state,
            context: context.to_string(),
            description: description.into(),
            target_url: target_url.filter(|url| !url.is_empty()),
        }
    }

    /// Description cut to [`MAX_DESCRIPTION_CHARS`] characters.
    pub fn truncated_description(&self) -> &str {
        match self.description.char_indices().nth(MAX_DESCRIPTION_CHARS) {
            Some((idx, _)) => &self.description[..idx],
            None => &self.description,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_repo() {
        let repo = RepoRef::parse("octo/widgets").unwrap();
        assert_eq!(repo.owner, "octo");
        assert_eq!(repo.name, "widgets");
        assert_eq!(repo.to_string(), "octo/widgets");
    }

    #[test]
    fn test_parse_repo_rejects_malformed() {
        assert!(RepoRef::parse("widgets").is_err());
        assert!(RepoRef::parse("/widgets").is_err());
        assert!(RepoRef::parse("octo/").is_err());
        assert!(RepoRef::parse("octo/widgets/extra").is_err());
    }

    #[test]
    fn test_checks_url_strips_trailing_slash() {
        let repo = RepoRef::parse("octo/widgets").unwrap();
        assert_eq!(
            repo.checks_url("https://github.com/", "abc123"),
            "https://github.com/octo/widgets/commit/abc123/checks"
        );
    }

    #[test]
    fn test_truncated_description_respects_char_boundaries() {
        let long = "é".repeat(200);
        let status = CommitStatus::new(CommitState::Pending, "required", long, None);
        assert_eq!(status.truncated_description().chars().count(), 140);

        let short = CommitStatus::new(CommitState::Success, "required", "done", None);
        assert_eq!(short.truncated_description(), "done");
    }

    #[test]
    fn test_empty_target_url_is_dropped() {
        let status = CommitStatus::new(CommitState::Failure, "required", "x", Some(String::new()));
        assert_eq!(status.target_url, None);
    }
}
