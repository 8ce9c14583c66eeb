//! Pipeline orchestrator for the analyzer.
//!
//! Coordinates a request from URL validation through tiered subtitle
//! extraction, classification and answer generation, with caching on both
//! the transcript and the answer.

use crate::answer::{prompt_key, AnswerGenerator, CompletionClient, OpenAiCompletionClient};
use crate::cache::ResultCache;
use crate::config::{Prompts, Settings};
use crate::error::{AnalyzerError, Result};
use crate::subtitles::{
    classify, clean_transcript, tail_chars, ExtractionOutcome, FailureReason, PipelineStatus,
    SubtitleExtractor, TierPlanner, YtDlpExtractor, DIAGNOSTICS_TAIL_CHARS,
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use url::Url;
use uuid::Uuid;

/// Incoming analysis request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalyzeRequest {
    pub url: String,
    #[serde(default)]
    pub lang: Option<String>,
    #[serde(default)]
    pub user_prompt: Option<String>,
}

impl AnalyzeRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn with_lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = Some(lang.into());
        self
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.user_prompt = Some(prompt.into());
        self
    }
}

/// Outcome of one pipeline run, as stored in the cache.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineResult {
    pub status: PipelineStatus,
    pub transcript: String,
    pub answer: Option<String>,
    /// Answer generation failure message.
    pub error: Option<String>,
    pub debug: Option<String>,
    /// Runtime snapshot, present only when debug output is enabled.
    pub debug_info: Option<DebugInfo>,
    /// Served entirely from cache without running yt-dlp or the LLM.
    pub cache_hit: bool,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Settings in effect for a run, reported alongside debug output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DebugInfo {
    pub manual_mode: bool,
    pub include_regular_subs: bool,
    pub fallback_regular_on_empty: bool,
    pub fallback_langs_on_empty: bool,
    pub cookies_configured: bool,
    pub cookies_file_exists: bool,
    pub sub_langs: Vec<String>,
    pub sub_langs_fallback: Vec<String>,
    pub cache_ttl_sec: i64,
    /// Argument vector of the last yt-dlp invocation.
    pub yt_dlp_command: Vec<String>,
}

/// Response body returned to API and CLI callers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalyzeResponse {
    pub url: String,
    pub status: PipelineStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcript: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug_info: Option<DebugInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_hit: Option<bool>,
}

impl AnalyzeResponse {
    pub fn from_result(url: &str, result: &PipelineResult) -> Self {
        let transcript = match result.status {
            PipelineStatus::Ok | PipelineStatus::AnswerError => Some(result.transcript.clone()),
            _ => None,
        };
        let answer = match result.status {
            PipelineStatus::Ok => result.answer.clone(),
            _ => None,
        };

        Self {
            url: url.to_string(),
            status: result.status,
            transcript,
            answer,
            error: result.error.clone(),
            debug: result.debug.clone(),
            debug_info: result.debug_info.clone(),
            cache_hit: result.cache_hit.then_some(true),
        }
    }
}

/// Normalize a video URL for cache lookups.
///
/// Scheme and host are lower-cased by the parser; path and query are kept
/// as given since video ids are case-sensitive.
pub fn normalize_url(url: &str) -> Result<Url> {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return Err(AnalyzerError::InvalidInput("url is required".to_string()));
    }

    let parsed = Url::parse(trimmed)
        .map_err(|e| AnalyzerError::InvalidInput(format!("Invalid url '{}': {}", trimmed, e)))?;

    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
        return Err(AnalyzerError::InvalidInput(format!(
            "Unsupported url '{}': expected http(s)",
            trimmed
        )));
    }

    Ok(parsed)
}

/// Cache key for a normalized URL and a resolved language chain.
///
/// `langs` must be the chain the planner hands to yt-dlp, so two requests
/// share a key exactly when they would run the same extraction.
pub fn cache_key(url: &Url, langs: &[String]) -> String {
    format!("{}|{}", url, langs.join(","))
}

/// The main orchestrator for the analysis pipeline.
pub struct Orchestrator {
    settings: Settings,
    planner: TierPlanner,
    extractor: Arc<dyn SubtitleExtractor>,
    answers: AnswerGenerator,
    transcript_cache: ResultCache<PipelineResult>,
    answer_cache: ResultCache<String>,
    temp_dir: PathBuf,
}

impl Orchestrator {
    /// Create a new orchestrator with yt-dlp and the configured LLM endpoint.
    pub fn new(settings: Settings) -> Result<Self> {
        let extractor: Arc<dyn SubtitleExtractor> = Arc::new(YtDlpExtractor::from_settings(&settings));
        let client: Arc<dyn CompletionClient> =
            Arc::new(OpenAiCompletionClient::from_settings(&settings.llm)?);

        Self::with_components(settings, extractor, client)
    }

    /// Create an orchestrator with custom components.
    pub fn with_components(
        settings: Settings,
        extractor: Arc<dyn SubtitleExtractor>,
        client: Arc<dyn CompletionClient>,
    ) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        let temp_dir = settings.temp_dir();
        std::fs::create_dir_all(&temp_dir)?;

        Ok(Self {
            planner: TierPlanner::from_settings(&settings.subtitles),
            answers: AnswerGenerator::new(client, prompts, &settings.llm),
            extractor,
            transcript_cache: ResultCache::new(),
            answer_cache: ResultCache::new(),
            temp_dir,
            settings,
        })
    }

    /// Get the settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Transcript cache key for a request.
    pub fn cache_key(&self, request: &AnalyzeRequest) -> Result<String> {
        let url = normalize_url(&request.url)?;
        let langs = self.planner.resolve_primary(request.lang.as_deref());
        Ok(cache_key(&url, &langs))
    }

    /// Run the pipeline and shape the response.
    pub async fn analyze(&self, request: &AnalyzeRequest) -> Result<AnalyzeResponse> {
        let result = self.run(request).await?;
        Ok(AnalyzeResponse::from_result(request.url.trim(), &result))
    }

    /// Run the pipeline for a request.
    ///
    /// Only an invalid request is an error. Every extraction or LLM problem
    /// is reported through the result status.
    #[instrument(skip(self, request), fields(url = %request.url.trim(), run = %Uuid::new_v4()))]
    pub async fn run(&self, request: &AnalyzeRequest) -> Result<PipelineResult> {
        let key = self.cache_key(request)?;
        let url = request.url.trim();

        let extracted = match self.transcript_cache.get(&key) {
            Some(entry) => {
                info!("Transcript cache hit");
                PipelineResult {
                    cache_hit: true,
                    ..entry.value
                }
            }
            None => match self.extract(url, request.lang.as_deref()).await {
                Extraction::Completed(result) => self.store_extraction(&key, result),
                Extraction::Aborted(result) => result,
            },
        };

        if extracted.status != PipelineStatus::Ok {
            return Ok(extracted);
        }

        let answer_key = format!("{}|{}", key, prompt_key(request.user_prompt.as_deref()));
        if let Some(entry) = self.answer_cache.get(&answer_key) {
            info!("Answer cache hit");
            return Ok(PipelineResult {
                answer: Some(entry.value),
                ..extracted
            });
        }

        match self
            .answers
            .generate(&extracted.transcript, request.user_prompt.as_deref())
            .await
        {
            Ok(answer) => {
                self.answer_cache
                    .put(&answer_key, answer.clone(), self.ttl());
                Ok(PipelineResult {
                    answer: Some(answer),
                    cache_hit: false,
                    ..extracted
                })
            }
            Err(e) => {
                warn!("Answer generation failed: {}", e);
                Ok(PipelineResult {
                    status: PipelineStatus::AnswerError,
                    error: Some(e.to_string()),
                    cache_hit: false,
                    ..extracted
                })
            }
        }
    }

    /// Configured TTL; values past chrono's range saturate instead of overflowing.
    fn ttl(&self) -> Duration {
        match self.settings.cache.ttl_secs {
            secs if secs <= 0 => Duration::zero(),
            secs => Duration::try_seconds(secs).unwrap_or(Duration::MAX),
        }
    }

    /// Cache an extraction result and stamp it with the entry's window.
    fn store_extraction(&self, key: &str, result: PipelineResult) -> PipelineResult {
        match self.transcript_cache.put(key, result.clone(), self.ttl()) {
            Some(entry) => PipelineResult {
                created_at: entry.created_at,
                expires_at: entry.expires_at,
                ..result
            },
            None => result,
        }
    }

    /// Run the tier chain and classify the outcome. Never fails.
    async fn extract(&self, url: &str, lang: Option<&str>) -> Extraction {
        let tiers = self.planner.plan(lang);
        debug!("Planned {} tiers", tiers.len());

        let workdir = match tempfile::Builder::new()
            .prefix("ytva-")
            .tempdir_in(&self.temp_dir)
        {
            Ok(dir) => dir,
            Err(e) => {
                warn!("Failed to create working directory in {:?}: {}", self.temp_dir, e);
                return Extraction::Aborted(self.extraction_result(
                    PipelineStatus::ExtractError,
                    String::new(),
                    Some(format!("Failed to create working directory: {}", e)),
                    self.debug_info(lang, &[]),
                ));
            }
        };

        let mut outcomes: Vec<ExtractionOutcome> = Vec::with_capacity(tiers.len());
        let mut transcript = String::new();

        for tier in &tiers {
            let mut outcome = self.extractor.extract(url, tier, workdir.path()).await;
            let text = outcome
                .payload
                .as_deref()
                .map(clean_transcript)
                .unwrap_or_default();

            if !text.is_empty() {
                info!("Subtitles found on {} ({} chars)", tier, text.len());
                outcome.reason = None;
                outcomes.push(outcome);
                transcript = text;
                break;
            }

            if outcome.reason.is_none() {
                outcome.reason = Some(FailureReason::NoTrack);
            }
            warn!(
                "No usable subtitles on {}: {}",
                tier,
                outcome.reason.unwrap_or(FailureReason::Unknown)
            );
            outcomes.push(outcome);
        }

        if self.settings.general.keep_temp_files {
            let kept = workdir.keep();
            info!("Keeping working directory {:?}", kept);
        }

        let status = classify(&outcomes, &transcript);
        let debug = self.settings.general.debug.then(|| debug_report(&outcomes));
        let debug_info = self.debug_info(lang, &outcomes);

        Extraction::Completed(self.extraction_result(status, transcript, debug, debug_info))
    }

    /// Snapshot of the extraction settings, only when debug output is on.
    fn debug_info(&self, lang: Option<&str>, outcomes: &[ExtractionOutcome]) -> Option<DebugInfo> {
        if !self.settings.general.debug {
            return None;
        }

        let subtitles = &self.settings.subtitles;
        let cookies = self.settings.cookies_path();
        Some(DebugInfo {
            manual_mode: subtitles.manual_mode,
            include_regular_subs: subtitles.include_regular_subs,
            fallback_regular_on_empty: subtitles.fallback_regular_on_empty,
            fallback_langs_on_empty: subtitles.fallback_langs_on_empty,
            cookies_configured: cookies.is_some(),
            cookies_file_exists: cookies.as_deref().is_some_and(|p| p.is_file()),
            sub_langs: self.planner.resolve_primary(lang),
            sub_langs_fallback: self.planner.fallback().to_vec(),
            cache_ttl_sec: self.settings.cache.ttl_secs,
            yt_dlp_command: outcomes.last().map(|o| o.command.clone()).unwrap_or_default(),
        })
    }

    fn extraction_result(
        &self,
        status: PipelineStatus,
        transcript: String,
        debug: Option<String>,
        debug_info: Option<DebugInfo>,
    ) -> PipelineResult {
        let now = Utc::now();
        PipelineResult {
            status,
            transcript,
            answer: None,
            error: None,
            debug: debug.filter(|_| self.settings.general.debug),
            debug_info,
            cache_hit: false,
            created_at: now,
            expires_at: now,
        }
    }
}

/// Extraction phase result. Aborted runs never reached the tool and are not cached.
enum Extraction {
    Completed(PipelineResult),
    Aborted(PipelineResult),
}

/// Per-tier summary of what was tried and what the tool said.
fn debug_report(outcomes: &[ExtractionOutcome]) -> String {
    let report = outcomes
        .iter()
        .map(|o| {
            let reason = o.reason.map(|r| r.to_string()).unwrap_or_else(|| "ok".to_string());
            let mut section = format!("{}: {}\n$ {}", o.tier, reason, o.command.join(" "));
            if !o.diagnostics.trim().is_empty() {
                section.push('\n');
                section.push_str(o.diagnostics.trim_end());
            }
            section
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    tail_chars(&report, DIAGNOSTICS_TAIL_CHARS)
}
