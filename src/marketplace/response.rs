//! Marketplace submission response contract.
//!
//! The API has changed shape over time: `version` has been sent as both a
//! string and a number, `versionId` only exists in the newer contract, and
//! some deployments wrap the payload in `{"data": ...}`. Everything is
//! parsed into [`RawSubmissionResponse`] and normalised by
//! [`SubmissionReceipt::from_raw`] with explicit fallbacks.

use std::fmt;

use chrono::{DateTime, Utc};
use semver::Version;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::warn;

use crate::error::MarketplaceError;

/// Status assumed when the server does not report one.
pub const DEFAULT_STATUS: &str = "submitted";

/// A field the server has sent as either a JSON string or a JSON number.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum StringOrNumber {
    Text(String),
    Number(serde_json::Number),
}

impl fmt::Display for StringOrNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StringOrNumber::Text(s) => f.write_str(s),
            StringOrNumber::Number(n) => write!(f, "{n}"),
        }
    }
}

/// Submission response as sent by any known version of the API.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSubmissionResponse {
    #[serde(default)]
    pub id: Option<StringOrNumber>,
    #[serde(default)]
    pub version: Option<StringOrNumber>,
    #[serde(default)]
    pub version_id: Option<StringOrNumber>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    /// Unparseable timestamps are dropped rather than failing the submission.
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub submitted_at: Option<DateTime<Utc>>,
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;

    Ok(raw.and_then(|value| {
        let parsed = value
            .as_str()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc));
        if parsed.is_none() && !value.is_null() {
            warn!(value = %value, "Ignoring unreadable submittedAt timestamp");
        }
        parsed
    }))
}

/// Which response contract the server answered with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContractVersion {
    /// No `versionId`; the submission is identified by plugin and version.
    V1,
    /// Carries a `versionId` for the stored version.
    V2,
}

/// Normalised result of a marketplace submission.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionReceipt {
    pub contract: ContractVersion,
    pub submission_id: Option<String>,
    pub version: String,
    pub version_id: Option<String>,
    pub status: String,
    pub url: Option<String>,
    pub submitted_at: Option<DateTime<Utc>>,
}

impl SubmissionReceipt {
    /// Normalise a raw response, filling omitted fields from the request.
    pub fn from_raw(raw: RawSubmissionResponse, requested: &Version) -> Self {
        let version_id = raw.version_id.map(|v| v.to_string());
        let contract = if version_id.is_some() {
            ContractVersion::V2
        } else {
            ContractVersion::V1
        };

        Self {
            contract,
            submission_id: raw.id.map(|id| id.to_string()),
            version: raw
                .version
                .map(|v| v.to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| requested.to_string()),
            version_id,
            status: raw
                .status
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_STATUS.to_string()),
            url: raw.url,
            submitted_at: raw.submitted_at,
        }
    }
}

/// Parse a 2xx response body. An empty body is a valid V1 acknowledgement.
pub fn parse_submission_response(
    body: &str,
    requested: &Version,
) -> Result<SubmissionReceipt, MarketplaceError> {
    if body.trim().is_empty() {
        return Ok(SubmissionReceipt::from_raw(
            RawSubmissionResponse::default(),
            requested,
        ));
    }

    let invalid = |e: serde_json::Error| {
        MarketplaceError::InvalidResponse(format!("{}. Body: {}", e, body))
    };

    let mut value: Value = serde_json::from_str(body).map_err(invalid)?;

    // Some deployments wrap the payload as {"data": {...}}.
    if let Some(data) = value
        .get_mut("data")
        .filter(|data| data.is_object())
        .map(Value::take)
    {
        value = data;
    }

    let raw: RawSubmissionResponse = serde_json::from_value(value).map_err(invalid)?;

    Ok(SubmissionReceipt::from_raw(raw, requested))
}
