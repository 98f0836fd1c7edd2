//! Claude CLI integration for generated release notes.

pub mod prompt;
pub mod retry;
pub mod subprocess;

pub use prompt::{GenerationInput, build_changelog_prompt, clean_generated_changelog};
pub use retry::{ClaudeExecutor, DefaultExecutor, generate_with_retry};
pub use subprocess::{check_claude_installed, run_claude};
