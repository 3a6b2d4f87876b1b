//! Coverage badge publication
//!
//! Badges are JSON documents in the shields.io endpoint format, stored as
//! files in a GitHub gist. Publication overwrites the file for the current
//! project and branch, so each branch keeps exactly one badge per run at
//! most.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use tracing::{debug, info};

const GITHUB_API: &str = "https://api.github.com";

/// One badge upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BadgeRequest {
    /// Target gist id
    pub gist_id: String,

    /// Environment variable holding the auth token
    pub token_env: String,

    /// Gist filename, `{project}_{branch}_coverage.json`
    pub filename: String,

    /// Badge label, e.g. "coverage"
    pub label: String,

    /// Badge message, e.g. "67%"
    pub message: String,

    /// shields.io color name
    pub color: String,
}

impl BadgeRequest {
    /// Badge filename for a project and branch
    pub fn filename_for(project: &str, branch: &str) -> String {
        format!("{}_{}_coverage.json", project, branch)
    }
}

/// Badge document in the shields.io endpoint schema
#[derive(Debug, Serialize)]
struct BadgeDocument<'a> {
    label: &'a str,
    message: &'a str,
    color: &'a str,
}

/// Errors while publishing a badge
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("auth token environment variable '{0}' is not set")]
    MissingToken(String),

    #[error("badge upload failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("badge API returned HTTP {status}: {body}")]
    Api { status: u16, body: String },
}

/// Uploads badge documents. Implementations decide the transport.
#[async_trait]
pub trait BadgePublisher: Send + Sync {
    async fn publish(&self, request: &BadgeRequest) -> Result<(), PublishError>;
}

/// Publishes badges to a GitHub gist via the gists API
pub struct GistBadgeClient {
    client: reqwest::Client,
    base_url: String,
}

impl GistBadgeClient {
    pub fn new() -> Self {
        Self::with_base_url(GITHUB_API)
    }

    /// Point the client at a different API root. Used by tests.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }
}

impl Default for GistBadgeClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BadgePublisher for GistBadgeClient {
    async fn publish(&self, request: &BadgeRequest) -> Result<(), PublishError> {
        // Resolved at publish time so validation never requires the secret
        let token = std::env::var(&request.token_env)
            .map_err(|_| PublishError::MissingToken(request.token_env.clone()))?;

        let document = BadgeDocument {
            label: &request.label,
            message: &request.message,
            color: &request.color,
        };
        let content = serde_json::to_string(&document).map_err(|e| PublishError::Api {
            status: 0,
            body: e.to_string(),
        })?;

        let url = format!("{}/gists/{}", self.base_url, request.gist_id);
        let mut files = serde_json::Map::new();
        files.insert(request.filename.clone(), json!({ "content": content }));
        let body = json!({ "files": files });

        debug!("Uploading badge {} to gist {}", request.filename, request.gist_id);

        let response = self
            .client
            .patch(&url)
            .bearer_auth(token)
            .header("Accept", "application/vnd.github+json")
            .header("User-Agent", "minici")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PublishError::Api {
                status: status.as_u16(),
                body,
            });
        }

        info!("Published badge {} ({})", request.filename, request.message);
        Ok(())
    }
}
