//! Aggregate status of a pipeline run.

use super::{ExtractionOutcome, FailureReason};
use serde::{Deserialize, Serialize};

/// Status reported to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStatus {
    Ok,
    NoSubtitles,
    ExtractError,
    BlockedByYoutube,
    /// Transcript obtained, but the LLM call failed.
    AnswerError,
}

impl PipelineStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PipelineStatus::Ok => "ok",
            PipelineStatus::NoSubtitles => "no_subtitles",
            PipelineStatus::ExtractError => "extract_error",
            PipelineStatus::BlockedByYoutube => "blocked_by_youtube",
            PipelineStatus::AnswerError => "answer_error",
        }
    }
}

impl std::fmt::Display for PipelineStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify the extraction phase from the attempted tiers and the final transcript.
pub fn classify(outcomes: &[ExtractionOutcome], transcript: &str) -> PipelineStatus {
    if !transcript.is_empty() {
        return PipelineStatus::Ok;
    }

    let reasons: Vec<Option<FailureReason>> = outcomes.iter().map(|o| o.reason).collect();

    if reasons.contains(&Some(FailureReason::AccessDenied)) {
        PipelineStatus::BlockedByYoutube
    } else if !reasons.is_empty() && reasons.iter().all(|r| *r == Some(FailureReason::NoTrack)) {
        PipelineStatus::NoSubtitles
    } else {
        PipelineStatus::ExtractError
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subtitles::{ExtractionTier, SubtitleKind};

    fn outcome(rank: usize, reason: Option<FailureReason>) -> ExtractionOutcome {
        ExtractionOutcome {
            tier: ExtractionTier {
                rank,
                langs: vec!["ru".to_string()],
                kind: SubtitleKind::Auto,
            },
            payload: None,
            diagnostics: String::new(),
            reason,
            command: Vec::new(),
        }
    }

    fn outcomes(reasons: &[FailureReason]) -> Vec<ExtractionOutcome> {
        reasons
            .iter()
            .enumerate()
            .map(|(i, r)| outcome(i + 1, Some(*r)))
            .collect()
    }

    #[test]
    fn test_non_empty_transcript_is_ok() {
        let tiers = outcomes(&[FailureReason::AccessDenied]);
        assert_eq!(classify(&tiers, "text"), PipelineStatus::Ok);
    }

    #[test]
    fn test_all_no_track_is_no_subtitles() {
        let tiers = outcomes(&[FailureReason::NoTrack, FailureReason::NoTrack]);
        assert_eq!(classify(&tiers, ""), PipelineStatus::NoSubtitles);
    }

    #[test]
    fn test_any_access_denied_is_blocked() {
        let mixes = [
            vec![FailureReason::AccessDenied],
            vec![FailureReason::NoTrack, FailureReason::AccessDenied],
            vec![FailureReason::Timeout, FailureReason::AccessDenied, FailureReason::Unknown],
        ];
        for mix in mixes {
            assert_eq!(classify(&outcomes(&mix), ""), PipelineStatus::BlockedByYoutube);
        }
    }

    #[test]
    fn test_other_failures_are_extract_error() {
        let mixes = [
            vec![FailureReason::Timeout],
            vec![FailureReason::NoTrack, FailureReason::Unknown],
            vec![FailureReason::NoTrack, FailureReason::Timeout],
        ];
        for mix in mixes {
            assert_eq!(classify(&outcomes(&mix), ""), PipelineStatus::ExtractError);
        }
    }

    #[test]
    fn test_no_attempts_is_extract_error() {
        assert_eq!(classify(&[], ""), PipelineStatus::ExtractError);
    }

    #[test]
    fn test_missing_reason_with_empty_transcript_is_extract_error() {
        let tiers = vec![outcome(1, None)];
        assert_eq!(classify(&tiers, ""), PipelineStatus::ExtractError);
    }

    #[test]
    fn test_status_serialization() {
        assert_eq!(
            serde_json::to_string(&PipelineStatus::BlockedByYoutube).unwrap(),
            "\"blocked_by_youtube\""
        );
        assert_eq!(PipelineStatus::NoSubtitles.to_string(), "no_subtitles");
    }
}
