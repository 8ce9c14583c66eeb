//! Subtitle extraction through yt-dlp.

use super::{
    classify_diagnostics, tail_chars, ExtractionOutcome, ExtractionTier, FailureReason,
    DIAGNOSTICS_TAIL_CHARS,
};
use crate::config::Settings;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, instrument, warn};

/// Subtitle file extensions in order of preference.
const SUBTITLE_EXTENSIONS: &[&str] = &["vtt", "srt"];

/// Runs one extraction tier.
///
/// Implementations never fail: every problem is folded into the returned
/// outcome so the caller can move on to the next tier.
#[async_trait]
pub trait SubtitleExtractor: Send + Sync {
    /// Extract subtitles for `url` using `workdir` as scratch space.
    async fn extract(&self, url: &str, tier: &ExtractionTier, workdir: &Path) -> ExtractionOutcome;
}

/// yt-dlp backed extractor.
#[derive(Debug, Clone)]
pub struct YtDlpExtractor {
    program: String,
    program_args: Vec<String>,
    cookies_path: Option<PathBuf>,
    extra_args: Vec<String>,
    timeout: Duration,
}

impl YtDlpExtractor {
    /// `binary` may carry leading arguments, e.g. `python3 -m yt_dlp`.
    pub fn new(binary: &str) -> Self {
        let mut parts = split_args(binary);
        let program = if parts.is_empty() {
            "yt-dlp".to_string()
        } else {
            parts.remove(0)
        };
        Self {
            program,
            program_args: parts,
            cookies_path: None,
            extra_args: Vec::new(),
            timeout: Duration::from_secs(120),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        let mut extractor = Self::new(&settings.subtitles.binary)
            .with_extra_args(split_args(&settings.subtitles.extractor_args))
            .with_timeout(Duration::from_secs(settings.subtitles.timeout_secs.max(1)));
        extractor.cookies_path = settings.cookies_path();
        extractor
    }

    pub fn with_cookies(mut self, path: impl Into<PathBuf>) -> Self {
        self.cookies_path = Some(path.into());
        self
    }

    pub fn with_extra_args(mut self, args: Vec<String>) -> Self {
        self.extra_args = args;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build the yt-dlp argument list for one tier.
    pub fn build_args(&self, url: &str, tier: &ExtractionTier, cookies: Option<&Path>) -> Vec<String> {
        let mut args = Vec::new();

        if tier.kind.includes_auto() {
            args.push("--write-auto-subs".to_string());
        }
        if tier.kind.includes_regular() {
            args.push("--write-subs".to_string());
        }

        args.extend([
            "--sub-langs".to_string(),
            tier.langs_arg(),
            "--skip-download".to_string(),
            "--ignore-no-formats-error".to_string(),
        ]);
        args.extend(self.extra_args.iter().cloned());

        if let Some(path) = cookies {
            args.push("--cookies".to_string());
            args.push(path.to_string_lossy().into_owned());
        }

        args.extend(["-o".to_string(), "%(id)s.%(ext)s".to_string(), url.to_string()]);
        args
    }

    /// Copy the configured cookie file into `workdir` once per run.
    ///
    /// yt-dlp rewrites the cookie jar on exit, which fails on read-only mounts.
    /// Later tiers reuse the copy so they see the jar as the previous tier left it.
    async fn prepare_cookies(&self, workdir: &Path) -> Option<PathBuf> {
        let Some(src) = &self.cookies_path else {
            debug!("Cookies path is not configured");
            return None;
        };

        let dst = workdir.join("cookies.txt");
        if tokio::fs::try_exists(&dst).await.unwrap_or(false) {
            debug!("Reusing cookies file {:?}", dst);
            return Some(dst);
        }

        match tokio::fs::metadata(src).await {
            Ok(meta) if meta.is_dir() => {
                debug!("Cookies path points to a directory, expected file: {:?}", src);
                return None;
            }
            Ok(_) => {}
            Err(_) => {
                debug!("Cookies file does not exist: {:?}", src);
                return None;
            }
        }

        match tokio::fs::copy(src, &dst).await {
            Ok(_) => {
                debug!("Copied cookies file to {:?}", dst);
                Some(dst)
            }
            Err(e) => {
                warn!("Failed to copy cookies file {:?}: {}", src, e);
                None
            }
        }
    }
}

#[async_trait]
impl SubtitleExtractor for YtDlpExtractor {
    #[instrument(skip(self, workdir), fields(tier = %tier))]
    async fn extract(&self, url: &str, tier: &ExtractionTier, workdir: &Path) -> ExtractionOutcome {
        // Each tier gets its own directory so earlier files never leak into later tiers.
        let tier_dir = workdir.join(format!("tier-{}", tier.rank));
        if let Err(e) = tokio::fs::create_dir_all(&tier_dir).await {
            return ExtractionOutcome::failed(
                tier.clone(),
                FailureReason::Unknown,
                format!("Cannot create working directory {:?}: {e}", tier_dir),
                Vec::new(),
            );
        }

        let cookies = self.prepare_cookies(workdir).await;
        let mut args = self.program_args.clone();
        args.extend(self.build_args(url, tier, cookies.as_deref()));
        let mut command_line = vec![self.program.clone()];
        command_line.extend(args.iter().cloned());
        debug!("Running command: {:?} (cwd={:?})", command_line, tier_dir);

        let result = tokio::time::timeout(
            self.timeout,
            Command::new(&self.program)
                .args(&args)
                .current_dir(&tier_dir)
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .kill_on_drop(true)
                .output(),
        )
        .await;

        let output = match result {
            Err(_) => {
                warn!("yt-dlp timed out after {:?}", self.timeout);
                return ExtractionOutcome::failed(
                    tier.clone(),
                    FailureReason::Timeout,
                    format!("{} timed out after {}s", self.program, self.timeout.as_secs_f32()),
                    command_line,
                );
            }
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("{} not found", self.program);
                return ExtractionOutcome::failed(
                    tier.clone(),
                    FailureReason::Unknown,
                    format!("External tool not found: {}", self.program),
                    command_line,
                );
            }
            Ok(Err(e)) => {
                return ExtractionOutcome::failed(
                    tier.clone(),
                    FailureReason::Unknown,
                    format!("{} execution failed: {e}", self.program),
                    command_line,
                );
            }
            Ok(Ok(output)) => output,
        };

        let diagnostics = tail_chars(
            &format!(
                "{}\n{}",
                String::from_utf8_lossy(&output.stdout),
                String::from_utf8_lossy(&output.stderr)
            ),
            DIAGNOSTICS_TAIL_CHARS,
        );

        if !output.status.success() {
            debug!("Command failed rc={:?} output_tail={}", output.status.code(), diagnostics);
        }

        let payload = match find_subtitle_file(&tier_dir).await {
            Some(path) => {
                debug!("Using subtitle file: {:?}", path);
                match tokio::fs::read(&path).await {
                    Ok(bytes) => Some(String::from_utf8_lossy(&bytes).into_owned()),
                    Err(e) => {
                        warn!("Failed to read subtitle file {:?}: {}", path, e);
                        None
                    }
                }
            }
            None => {
                debug!("No subtitle files found in {:?}", tier_dir);
                None
            }
        };

        // A partial failure (one language rate limited) can still leave a usable file.
        if payload.is_some() {
            if !output.status.success() {
                warn!("yt-dlp exited with {:?} but produced subtitles", output.status.code());
            }
            return ExtractionOutcome {
                tier: tier.clone(),
                payload,
                diagnostics,
                reason: None,
                command: command_line,
            };
        }

        let matched = classify_diagnostics(&diagnostics);
        let reason = if output.status.success() {
            match matched {
                Some(FailureReason::AccessDenied) => FailureReason::AccessDenied,
                _ => FailureReason::NoTrack,
            }
        } else {
            matched.unwrap_or(FailureReason::Unknown)
        };

        ExtractionOutcome {
            tier: tier.clone(),
            payload: None,
            diagnostics,
            reason: Some(reason),
            command: command_line,
        }
    }
}

/// Locate the preferred subtitle file in `dir`.
async fn find_subtitle_file(dir: &Path) -> Option<PathBuf> {
    let mut entries = tokio::fs::read_dir(dir).await.ok()?;
    let mut files = Vec::new();
    while let Ok(Some(entry)) = entries.next_entry().await {
        files.push(entry.path());
    }
    files.sort();

    for ext in SUBTITLE_EXTENSIONS {
        let found = files
            .iter()
            .find(|p| p.extension().and_then(|e| e.to_str()) == Some(*ext));
        debug!("Subtitle scan for *.{} found {}", ext, found.is_some());
        if let Some(path) = found {
            return Some(path.clone());
        }
    }
    None
}

/// Split a configured argument string on whitespace.
fn split_args(value: &str) -> Vec<String> {
    value.split_whitespace().map(str::to_string).collect()
}
