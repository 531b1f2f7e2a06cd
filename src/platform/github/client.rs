use async_trait::async_trait;
use octocrab::Octocrab;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::config::GitHubConfig;
use crate::error::{AppError, Result};
use crate::platform::types::*;
use crate::platform::{RepositoryClient, StatusReporter};

use super::auth::AppKey;
use super::mapper::{self, RunListPayload, RunPayload};

pub struct GitHubPlatform {
    token: Option<String>,
    app: Option<AppKey>,
    api_url: Option<String>,
    /// Cache of installation tokens: installation_id -> (token, expiry)
    token_cache: Arc<RwLock<HashMap<u64, (String, chrono::DateTime<chrono::Utc>)>>>,
}

impl GitHubPlatform {
    pub fn new(config: &GitHubConfig) -> Result<Self> {
        let app = match (config.app_id, config.private_key_path.as_deref()) {
            (Some(app_id), Some(path)) => Some(AppKey::load(app_id, path)?),
            (None, None) => None,
            _ => {
                return Err(AppError::Config(
                    "GitHub App auth needs both app_id and private_key_path".to_string(),
                ))
            }
        };

        let token = config.token.clone().filter(|t| !t.is_empty());
        if token.is_none() && app.is_none() {
            return Err(AppError::Config(
                "No GitHub credentials configured (token or app_id + private_key_path)"
                    .to_string(),
            ));
        }

        Ok(Self {
            token,
            app,
            api_url: config.api_url.clone(),
            token_cache: Arc::new(RwLock::new(HashMap::new())),
        })
    }

    /// A client scoped to one repository. App installation credentials win
    /// over the static token when both are available.
    pub async fn repo(&self, repo: &RepoRef, installation_id: Option<u64>) -> Result<GitHubRepo> {
        let token = match (installation_id, self.app.as_ref()) {
            (Some(id), Some(app)) => self.installation_token(app, id).await?,
            _ => self.token.clone().ok_or_else(|| {
                AppError::Config(format!("No token available to access {repo}"))
            })?,
        };

        Ok(GitHubRepo {
            client: self.build_client(token)?,
            repo: repo.clone(),
        })
    }

    fn build_client(&self, token: String) -> Result<Octocrab> {
        let mut builder = Octocrab::builder().personal_token(token);
        if let Some(api_url) = &self.api_url {
            builder = builder
                .base_uri(api_url.as_str())
                .map_err(|e| AppError::Config(format!("Invalid GitHub API URL {api_url}: {e}")))?;
        }
        builder
            .build()
            .map_err(|e| AppError::GitHubApi(format!("Failed to build octocrab client: {e}")))
    }

    async fn installation_token(&self, app: &AppKey, installation_id: u64) -> Result<String> {
        {
            let cache = self.token_cache.read().await;
            if let Some((token, expiry)) = cache.get(&installation_id) {
                if *expiry > chrono::Utc::now() + chrono::Duration::minutes(5) {
                    return Ok(token.clone());
                }
            }
        }

        tracing::debug!(app_id = app.app_id(), installation_id, "Minting installation token");

        let client = self.build_client(app.jwt()?)?;
        let url = format!("/app/installations/{installation_id}/access_tokens");
        let response: serde_json::Value = client
            .post(&url, None::<&()>)
            .await
            .map_err(|e| AppError::GitHubApi(format!("Failed to create installation token: {e}")))?;

        let token = response["token"]
            .as_str()
            .ok_or_else(|| AppError::GitHubApi("No token in response".to_string()))?
            .to_string();

        let expires_at = response["expires_at"]
            .as_str()
            .and_then(|s| chrono::DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&chrono::Utc))
            .unwrap_or_else(|| chrono::Utc::now() + chrono::Duration::hours(1));

        let mut cache = self.token_cache.write().await;
        cache.insert(installation_id, (token.clone(), expires_at));

        Ok(token)
    }
}

/// Authenticated access to one repository's runs and statuses.
pub struct GitHubRepo {
    client: Octocrab,
    repo: RepoRef,
}

#[derive(Serialize)]
struct ListRunsQuery<'a> {
    head_sha: &'a str,
    per_page: u8,
}

#[async_trait]
impl RepositoryClient for GitHubRepo {
    async fn get_workflow_run(&self, run_id: u64) -> Result<Option<WorkflowRun>> {
        let url = format!(
            "/repos/{}/{}/actions/runs/{run_id}",
            self.repo.owner, self.repo.name
        );
        let run: Option<RunPayload> = self.client.get(&url, None::<&()>).await?;

        Ok(run.map(mapper::map_run))
    }

    async fn list_workflow_runs(
        &self,
        head_sha: &str,
        per_page: u8,
    ) -> Result<Option<Vec<WorkflowRunSummary>>> {
        let url = format!("/repos/{}/{}/actions/runs", self.repo.owner, self.repo.name);
        let list: Option<RunListPayload> = self
            .client
            .get(&url, Some(&ListRunsQuery { head_sha, per_page }))
            .await?;

        let Some(list) = list else {
            return Ok(None);
        };

        if let Some(total) = list.total_count {
            if total > u64::from(per_page) {
                tracing::warn!(
                    repo = %self.repo,
                    head_sha,
                    total,
                    per_page,
                    "More workflow runs than fit on one page; only the first page is considered"
                );
            }
        }

        Ok(mapper::map_run_list(list))
    }
}

#[async_trait]
impl StatusReporter for GitHubRepo {
    async fn create_commit_status(&self, sha: &str, status: &CommitStatus) -> Result<()> {
        let repos = self.client.repos(&self.repo.owner, &self.repo.name);
        let mut request = repos
            .create_status(sha.to_string(), mapper::status_state(status.state))
            .context(status.context.clone())
            .description(status.truncated_description().to_string());
        if let Some(target_url) = &status.target_url {
            request = request.target(target_url.clone());
        }

        request.send().await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_requires_credentials() {
        let err = GitHubPlatform::new(&GitHubConfig::default())
            .err()
            .unwrap()
            .to_string();
        assert!(err.contains("No GitHub credentials configured"));
    }

    #[test]
    fn test_new_rejects_partial_app_config() {
        let config = GitHubConfig {
            app_id: Some(42),
            ..GitHubConfig::default()
        };
        assert!(GitHubPlatform::new(&config).is_err());
    }
}
