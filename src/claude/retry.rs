//! Exponential backoff retry logic for Claude CLI.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use backoff::ExponentialBackoff;
use backoff::backoff::Backoff;
use tracing::warn;

use crate::error::ClaudeError;

use super::prompt::clean_generated_changelog;
use super::subprocess::{parse_claude_response, run_claude};

/// Configuration: 3 total attempts, base 1s, max 30s.
pub const MAX_ATTEMPTS: u32 = 3;
const INITIAL_INTERVAL_SECS: u64 = 1;
const MAX_INTERVAL_SECS: u64 = 30;

/// Trait for executing Claude CLI commands.
///
/// This abstraction allows mocking the Claude subprocess in tests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ClaudeExecutor: Send + Sync {
    /// Run Claude with the given prompt and return the raw response.
    async fn run(&self, prompt: &str) -> Result<String, ClaudeError>;
}

/// Default executor that calls the real Claude CLI.
pub struct DefaultExecutor {
    pub timeout: Duration,
}

#[async_trait]
impl ClaudeExecutor for DefaultExecutor {
    async fn run(&self, prompt: &str) -> Result<String, ClaudeError> {
        run_claude(prompt, self.timeout).await
    }
}

/// Retry an async operation with exponential backoff.
///
/// `attempt` is called up to `MAX_ATTEMPTS` times; the last error is wrapped
/// by `wrap_exhausted`.
pub async fn retry_with_backoff<T, E, Fut, F, W>(mut attempt: F, wrap_exhausted: W) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
    W: FnOnce(E) -> E,
{
    let mut backoff = ExponentialBackoff {
        initial_interval: Duration::from_secs(INITIAL_INTERVAL_SECS),
        max_interval: Duration::from_secs(MAX_INTERVAL_SECS),
        max_elapsed_time: None,
        ..Default::default()
    };

    let mut attempts = 0;

    loop {
        attempts += 1;

        match attempt().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                warn!(attempt = attempts, error = %e, "Attempt failed");

                if attempts >= MAX_ATTEMPTS {
                    return Err(wrap_exhausted(e));
                }

                if let Some(wait_duration) = backoff.next_backoff() {
                    tokio::time::sleep(wait_duration).await;
                }
            }
        }
    }
}

/// Generate release notes with retry logic using the given executor.
pub async fn generate_with_retry<E: ClaudeExecutor + ?Sized>(
    prompt: &str,
    executor: &E,
) -> Result<String, ClaudeError> {
    retry_with_backoff(
        || async { try_generate(prompt, executor).await },
        |e| ClaudeError::RetriesExhausted(Box::new(e)),
    )
    .await
}

/// Single attempt: run, unwrap the envelope, clean, and reject empty output.
async fn try_generate<E: ClaudeExecutor + ?Sized>(
    prompt: &str,
    executor: &E,
) -> Result<String, ClaudeError> {
    let response = executor.run(prompt).await?;
    let text = clean_generated_changelog(&parse_claude_response(&response)?);

    if text.is_empty() {
        return Err(ClaudeError::EmptyResponse);
    }

    Ok(text)
}
