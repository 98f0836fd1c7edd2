//! Marketplace submission client.

use std::path::PathBuf;

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::multipart::{Form, Part};
use semver::Version;
use tracing::{debug, info};
use url::Url;

use crate::error::MarketplaceError;

use super::response::{SubmissionReceipt, parse_submission_response};

/// A plugin version ready to be uploaded.
#[derive(Debug, Clone)]
pub struct Submission {
    /// Slugified plugin name used in the API path.
    pub slug: String,
    pub display_name: String,
    pub package_name: String,
    pub version: Version,
    pub changelog: String,
    pub artifact: PathBuf,
}

/// Destination for plugin submissions.
///
/// This abstraction allows the release pipeline to be tested without the API.
#[async_trait]
pub trait Marketplace: Send + Sync {
    async fn submit(&self, submission: &Submission) -> Result<SubmissionReceipt, MarketplaceError>;
}

/// HTTP client for the marketplace API.
pub struct MarketplaceClient {
    http: reqwest::Client,
    base_url: Url,
    token: String,
}

impl MarketplaceClient {
    pub fn new(base_url: Url, token: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url,
            token: token.into(),
        }
    }

    fn versions_url(&self, slug: &str) -> String {
        format!(
            "{}/plugins/{}/versions",
            self.base_url.as_str().trim_end_matches('/'),
            slug
        )
    }
}

#[async_trait]
impl Marketplace for MarketplaceClient {
    /// Upload the artifact and release notes as a multipart form.
    async fn submit(&self, submission: &Submission) -> Result<SubmissionReceipt, MarketplaceError> {
        let bytes = tokio::fs::read(&submission.artifact).await.map_err(|source| {
            MarketplaceError::ArtifactRead {
                path: submission.artifact.display().to_string(),
                source,
            }
        })?;

        let file_name = submission
            .artifact
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| format!("{}.tgz", submission.slug));

        debug!(
            plugin = %submission.slug,
            bytes = bytes.len(),
            artifact = %file_name,
            "Uploading artifact"
        );

        let artifact = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("application/gzip")
            .map_err(MarketplaceError::Request)?;

        let form = Form::new()
            .text("name", submission.display_name.clone())
            .text("packageName", submission.package_name.clone())
            .text("version", submission.version.to_string())
            .text("changelog", submission.changelog.clone())
            .part("artifact", artifact);

        let response = self
            .http
            .post(self.versions_url(&submission.slug))
            .bearer_auth(&self.token)
            .multipart(form)
            .send()
            .await
            .map_err(MarketplaceError::Request)?;

        let status = response.status();
        let body = response.text().await.map_err(MarketplaceError::Request)?;

        if status == StatusCode::CONFLICT {
            return Err(MarketplaceError::VersionExists {
                plugin: submission.display_name.clone(),
                version: submission.version.to_string(),
            });
        }

        if !status.is_success() {
            return Err(MarketplaceError::Rejected {
                status: status.as_u16(),
                body: body.trim().to_string(),
            });
        }

        let receipt = parse_submission_response(&body, &submission.version)?;
        info!(
            plugin = %submission.slug,
            version = %receipt.version,
            status = %receipt.status,
            "Marketplace accepted submission"
        );
        Ok(receipt)
    }
}
