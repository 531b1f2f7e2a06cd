use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{AppError, Result};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub github: GitHubConfig,
    #[serde(default)]
    pub gate: GateConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// How long shutdown waits for in-flight reconciliations.
    #[serde(default = "default_drain_secs")]
    pub drain_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            drain_secs: default_drain_secs(),
        }
    }
}

#[derive(Deserialize, Clone)]
pub struct GitHubConfig {
    /// Personal or Actions token. Used when no app installation applies.
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub app_id: Option<u64>,
    #[serde(default)]
    pub private_key_path: Option<PathBuf>,
    #[serde(default)]
    pub webhook_secret: Option<String>,
    /// REST API root, for GitHub Enterprise Server.
    #[serde(default)]
    pub api_url: Option<String>,
    /// Web root used for checks links.
    #[serde(default = "default_web_url")]
    pub web_url: String,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            token: None,
            app_id: None,
            private_key_path: None,
            webhook_secret: None,
            api_url: None,
            web_url: default_web_url(),
        }
    }
}

// Manual Debug impl to avoid leaking the token and webhook secret
impl std::fmt::Debug for GitHubConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubConfig")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("app_id", &self.app_id)
            .field("private_key_path", &self.private_key_path)
            .field(
                "webhook_secret",
                &self.webhook_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .field("api_url", &self.api_url)
            .field("web_url", &self.web_url)
            .finish()
    }
}

/// Which workflows gate the commit, and how long to wait for the list API.
#[derive(Debug, Deserialize, Clone)]
pub struct GateConfig {
    #[serde(default)]
    pub workflows: Vec<String>,
    #[serde(default = "default_status_name")]
    pub status_name: String,
    #[serde(default = "default_retries")]
    pub retries: u32,
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            workflows: Vec::new(),
            status_name: default_status_name(),
            retries: default_retries(),
            delay_ms: default_delay_ms(),
        }
    }
}

impl GateConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.workflows.iter().all(|w| w.trim().is_empty()) {
            return Err(AppError::Config(
                "At least one required workflow must be configured".to_string(),
            ));
        }
        if self.status_name.trim().is_empty() {
            return Err(AppError::Config("Status name must not be empty".to_string()));
        }
        if self.retries == 0 {
            return Err(AppError::Config("Retries must be at least 1".to_string()));
        }
        Ok(())
    }
}

/// Flatten workflow names given one per value or newline-separated within a
/// value, dropping blanks.
pub fn parse_workflow_list(values: &[String]) -> Vec<String> {
    values
        .iter()
        .flat_map(|value| value.lines())
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_drain_secs() -> u64 {
    30
}

fn default_web_url() -> String {
    "https://github.com".to_string()
}

fn default_status_name() -> String {
    "required-workflows".to_string()
}

fn default_retries() -> u32 {
    3
}

fn default_delay_ms() -> u64 {
    5_000
}

impl AppConfig {
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = config_path {
            builder = builder.add_source(config::File::with_name(path));
        } else {
            builder = builder.add_source(config::File::with_name("required-gate").required(false));
        }

        // Environment variable overrides with REQUIRED_GATE_ prefix
        builder = builder.add_source(
            config::Environment::with_prefix("REQUIRED_GATE")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("gate.workflows")
                .try_parsing(true),
        );

        let config = builder
            .build()
            .map_err(|e| AppError::Config(e.to_string()))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::Config(e.to_string()))
    }

    pub fn webhook_secret(&self) -> Option<&str> {
        self.github.webhook_secret.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_from_file_with_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("gate.toml");
        std::fs::write(
            &path,
            r#"
[github]
token = "ghs_secret"

[gate]
workflows = ["Build", "Test"]
status_name = "ci/required"
"#,
        )
        .unwrap();

        let config = AppConfig::load(Some(path.to_str().unwrap())).unwrap();
        assert_eq!(config.gate.workflows, vec!["Build", "Test"]);
        assert_eq!(config.gate.status_name, "ci/required");
        assert_eq!(config.gate.retries, 3);
        assert_eq!(config.gate.delay(), Duration::from_secs(5));
        assert_eq!(config.github.web_url, "https://github.com");
        assert_eq!(config.server.port, 3000);
        config.gate.validate().unwrap();
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let github = GitHubConfig {
            token: Some("ghp-tok-91c2".to_string()),
            webhook_secret: Some("whsec-7f3a".to_string()),
            ..GitHubConfig::default()
        };
        let rendered = format!("{github:?}");
        assert!(!rendered.contains("ghp-tok-91c2"));
        assert!(!rendered.contains("whsec-7f3a"));
        assert!(rendered.contains("[REDACTED]"));
    }

    #[test]
    fn test_parse_workflow_list() {
        let values = vec!["Build\n  Test \n\n".to_string(), "Lint".to_string()];
        assert_eq!(parse_workflow_list(&values), vec!["Build", "Test", "Lint"]);
        assert!(parse_workflow_list(&[]).is_empty());
    }

    #[test]
    fn test_validate_rejects_empty_gate() {
        let gate = GateConfig::default();
        assert!(gate.validate().is_err());

        let gate = GateConfig {
            workflows: vec!["Build".to_string()],
            retries: 0,
            ..GateConfig::default()
        };
        assert!(gate.validate().is_err());

        let gate = GateConfig {
            workflows: vec!["Build".to_string()],
            status_name: " ".to_string(),
            ..GateConfig::default()
        };
        assert!(gate.validate().is_err());
    }
}
