//! Analyze command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::{AnalyzeRequest, Orchestrator};
use crate::subtitles::PipelineStatus;
use anyhow::Result;

/// Run the pipeline once and print the response JSON.
pub async fn run_analyze(
    url: &str,
    lang: Option<String>,
    prompt: Option<String>,
    settings: Settings,
) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Analyze, &settings) {
        Output::error(&e.to_string());
        Output::info("Run 'ytva doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let orchestrator = Orchestrator::new(settings)?;

    let mut request = AnalyzeRequest::new(url);
    request.lang = lang;
    request.user_prompt = prompt;

    let spinner = Output::spinner("Fetching subtitles...");
    let result = orchestrator.analyze(&request).await;
    spinner.finish_and_clear();

    let response = match result {
        Ok(response) => response,
        Err(e) => {
            Output::error(&e.to_string());
            return Err(e.into());
        }
    };

    match response.status {
        PipelineStatus::Ok => {}
        PipelineStatus::AnswerError => Output::warning("Transcript extracted, but the answer could not be generated."),
        status => Output::warning(&format!("No transcript: {}", status)),
    }

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
