//! Claude CLI spawning.

use std::process::Stdio;
use std::time::Duration;

use serde::Deserialize;
use tokio::process::Command;
use tokio::time::timeout;

use crate::error::ClaudeError;

/// Check if Claude Code CLI is installed and accessible.
///
/// Uses the `which` crate for cross-platform executable detection.
pub async fn check_claude_installed() -> Result<(), ClaudeError> {
    if which::which("claude").is_err() {
        return Err(ClaudeError::NotInstalled);
    }

    let version_check = Command::new("claude")
        .arg("--version")
        .output()
        .await
        .map_err(ClaudeError::SpawnFailed)?;

    if !version_check.status.success() {
        return Err(ClaudeError::NotInstalled);
    }

    Ok(())
}

/// Run Claude CLI with a prompt and return the raw stdout.
///
/// Uses `-p` for the prompt and `--output-format json`. The subprocess is
/// killed and [`ClaudeError::Timeout`] returned once `limit` elapses.
pub async fn run_claude(prompt: &str, limit: Duration) -> Result<String, ClaudeError> {
    let output = timeout(
        limit,
        Command::new("claude")
            .arg("-p")
            .arg(prompt)
            .arg("--output-format")
            .arg("json")
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output(),
    )
    .await
    .map_err(|_| ClaudeError::Timeout(limit.as_secs()))?
    .map_err(ClaudeError::SpawnFailed)?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        let code = output.status.code().unwrap_or(-1);
        return Err(ClaudeError::NonZeroExit { code, stderr });
    }

    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

/// Claude CLI JSON envelope when using --output-format json
#[derive(Deserialize)]
struct ClaudeCliResponse {
    result: String,
    #[serde(default)]
    is_error: bool,
}

/// Unwrap the CLI envelope, falling back to the raw text for plain output.
pub fn parse_claude_response(response: &str) -> Result<String, ClaudeError> {
    match serde_json::from_str::<ClaudeCliResponse>(response) {
        Ok(envelope) if envelope.is_error => Err(ClaudeError::ExecutionFailed(envelope.result)),
        Ok(envelope) => Ok(envelope.result),
        Err(_) => Ok(response.to_string()),
    }
}
