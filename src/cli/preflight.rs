//! Pre-flight checks before running the pipeline.
//!
//! Validates that required tools and configuration are available
//! before starting operations that would otherwise fail midway.

use crate::config::Settings;
use crate::error::{AnalyzerError, Result};
use std::process::Command;

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// A one-shot analysis needs yt-dlp and an API key.
    Analyze,
    /// The server only warns, so it can start before the environment is complete.
    Serve,
}

/// Run pre-flight checks for the given operation.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    match operation {
        Operation::Analyze | Operation::Serve => {
            check_tool(&settings.subtitles.binary)?;
            check_api_key(&settings.llm.api_key_env)?;
        }
    }
    Ok(())
}

/// Check if the LLM API key is configured.
pub fn check_api_key(var: &str) -> Result<()> {
    match std::env::var(var) {
        Ok(key) if !key.trim().is_empty() => Ok(()),
        Ok(_) => Err(AnalyzerError::Config(format!(
            "{} is empty. Set it with: export {}='sk-...'",
            var, var
        ))),
        Err(_) => Err(AnalyzerError::Config(format!(
            "{} not set. Set it with: export {}='sk-...'",
            var, var
        ))),
    }
}

/// Check if an external tool is available.
///
/// `command` may carry leading arguments, e.g. `python3 -m yt_dlp`.
pub fn check_tool(command: &str) -> Result<()> {
    let mut parts = command.split_whitespace();
    let Some(program) = parts.next() else {
        return Err(AnalyzerError::ToolNotFound("(empty command)".to_string()));
    };

    match Command::new(program).args(parts).arg("--version").output() {
        Ok(output) if output.status.success() => Ok(()),
        Ok(_) => Err(AnalyzerError::ToolNotFound(format!(
            "{} is installed but not working correctly",
            command
        ))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(AnalyzerError::ToolNotFound(command.to_string()))
        }
        Err(e) => Err(AnalyzerError::ToolNotFound(format!("{}: {}", command, e))),
    }
}
