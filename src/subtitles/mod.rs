//! Subtitle acquisition.
//!
//! Plans extraction tiers, runs yt-dlp for each tier, cleans the resulting
//! payload and classifies the aggregate outcome.

mod classifier;
mod cleaner;
mod diagnostics;
mod extractor;
mod planner;

pub use classifier::{classify, PipelineStatus};
pub use cleaner::clean_transcript;
pub use diagnostics::{classify_diagnostics, DiagnosticRule, DIAGNOSTIC_RULES};
pub use extractor::{SubtitleExtractor, YtDlpExtractor};
pub use planner::{parse_lang_chain, TierPlanner, ANY_LANGUAGE, MAX_TIERS};

use serde::{Deserialize, Serialize};

/// Maximum number of diagnostic characters retained per attempt.
pub const DIAGNOSTICS_TAIL_CHARS: usize = 3000;

/// Which subtitle tracks an attempt asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubtitleKind {
    /// Auto-generated captions only.
    Auto,
    /// Uploader-provided subtitles only.
    Regular,
    /// Both kinds in one invocation.
    Both,
}

impl SubtitleKind {
    pub fn includes_regular(self) -> bool {
        matches!(self, SubtitleKind::Regular | SubtitleKind::Both)
    }

    pub fn includes_auto(self) -> bool {
        matches!(self, SubtitleKind::Auto | SubtitleKind::Both)
    }
}

impl std::fmt::Display for SubtitleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubtitleKind::Auto => write!(f, "auto"),
            SubtitleKind::Regular => write!(f, "regular"),
            SubtitleKind::Both => write!(f, "auto+regular"),
        }
    }
}

/// One planned extraction attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionTier {
    /// 1-based position in the plan.
    pub rank: usize,
    pub langs: Vec<String>,
    pub kind: SubtitleKind,
}

impl ExtractionTier {
    /// Language chain in yt-dlp `--sub-langs` form.
    pub fn langs_arg(&self) -> String {
        self.langs.join(",")
    }
}

impl std::fmt::Display for ExtractionTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "tier {} [{} {}]", self.rank, self.langs_arg(), self.kind)
    }
}

/// Coarse reason an attempt produced no usable text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    Timeout,
    /// Bot check, consent wall, sign-in requirement or similar block.
    AccessDenied,
    /// No subtitle track for the requested languages/kind.
    NoTrack,
    Unknown,
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureReason::Timeout => write!(f, "timeout"),
            FailureReason::AccessDenied => write!(f, "access_denied"),
            FailureReason::NoTrack => write!(f, "no_track"),
            FailureReason::Unknown => write!(f, "unknown"),
        }
    }
}

/// Result of running one tier.
#[derive(Debug, Clone)]
pub struct ExtractionOutcome {
    pub tier: ExtractionTier,
    /// Raw subtitle file contents, if the tool produced one.
    pub payload: Option<String>,
    /// Tail of the tool's stderr.
    pub diagnostics: String,
    /// Set whenever the attempt did not yield usable text.
    pub reason: Option<FailureReason>,
    /// Argument vector the tool was invoked with.
    pub command: Vec<String>,
}

impl ExtractionOutcome {
    /// An outcome that failed before or without producing a payload.
    pub fn failed(
        tier: ExtractionTier,
        reason: FailureReason,
        diagnostics: impl Into<String>,
        command: Vec<String>,
    ) -> Self {
        Self {
            tier,
            payload: None,
            diagnostics: tail_chars(&diagnostics.into(), DIAGNOSTICS_TAIL_CHARS),
            reason: Some(reason),
            command,
        }
    }
}

/// Keep at most the last `max` characters of `text`.
pub fn tail_chars(text: &str, max: usize) -> String {
    let count = text.chars().count();
    if count <= max {
        return text.to_string();
    }
    text.chars().skip(count - max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tail_chars() {
        assert_eq!(tail_chars("abcdef", 3), "def");
        assert_eq!(tail_chars("abc", 10), "abc");
        assert_eq!(tail_chars("привет", 2), "ет");
    }

    #[test]
    fn test_tier_display() {
        let tier = ExtractionTier {
            rank: 2,
            langs: vec!["ru".to_string(), "ru-orig".to_string()],
            kind: SubtitleKind::Regular,
        };
        assert_eq!(tier.to_string(), "tier 2 [ru,ru-orig regular]");
    }

    #[test]
    fn test_failed_outcome_bounds_diagnostics() {
        let tier = ExtractionTier {
            rank: 1,
            langs: vec!["en".to_string()],
            kind: SubtitleKind::Auto,
        };
        let noisy = "x".repeat(DIAGNOSTICS_TAIL_CHARS + 500);
        let outcome = ExtractionOutcome::failed(tier, FailureReason::Unknown, noisy, Vec::new());
        assert_eq!(outcome.diagnostics.chars().count(), DIAGNOSTICS_TAIL_CHARS);
        assert!(outcome.payload.is_none());
    }
}
