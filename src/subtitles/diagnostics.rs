//! Heuristic classification of yt-dlp diagnostic output.
//!
//! yt-dlp reports most failures with the same exit code, so the reason is
//! read from stderr. Rules are checked in order; the first match wins.

use super::FailureReason;

/// A case-insensitive substring rule.
#[derive(Debug, Clone, Copy)]
pub struct DiagnosticRule {
    pub pattern: &'static str,
    pub reason: FailureReason,
}

const fn rule(pattern: &'static str, reason: FailureReason) -> DiagnosticRule {
    DiagnosticRule { pattern, reason }
}

/// Ordered rule table. Block signals come first so they win over "not found".
/// Patterns are lower-case.
pub const DIAGNOSTIC_RULES: &[DiagnosticRule] = &[
    rule("confirm you're not a bot", FailureReason::AccessDenied),
    rule("confirm you’re not a bot", FailureReason::AccessDenied),
    rule("sign in to confirm", FailureReason::AccessDenied),
    rule("consent.youtube.com", FailureReason::AccessDenied),
    rule("before you continue to youtube", FailureReason::AccessDenied),
    rule("http error 429", FailureReason::AccessDenied),
    rule("too many requests", FailureReason::AccessDenied),
    rule("http error 403", FailureReason::AccessDenied),
    rule("login required", FailureReason::AccessDenied),
    rule("use --cookies", FailureReason::AccessDenied),
    rule("members-only", FailureReason::AccessDenied),
    rule("join this channel to get access", FailureReason::AccessDenied),
    rule("there are no subtitles for the requested languages", FailureReason::NoTrack),
    rule("no subtitles for the requested", FailureReason::NoTrack),
    rule("there's no subtitles", FailureReason::NoTrack),
    rule("has no automatic captions", FailureReason::NoTrack),
    rule("has no subtitles", FailureReason::NoTrack),
    rule("subtitles not available", FailureReason::NoTrack),
    rule("no captions", FailureReason::NoTrack),
];

/// Map diagnostic text to a coarse reason, if any rule matches.
pub fn classify_diagnostics(text: &str) -> Option<FailureReason> {
    let lowered = text.to_lowercase();
    DIAGNOSTIC_RULES
        .iter()
        .find(|r| lowered.contains(r.pattern))
        .map(|r| r.reason)
}
