//! Subtitle payload to plain text.
//!
//! Handles WebVTT (including YouTube's rolling auto-captions), SRT and text
//! that has already been cleaned. Every rule is applied to a normalized line,
//! so running the cleaner on its own output is a no-op.

use regex::Regex;
use std::sync::LazyLock;

static TIMING_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:\d+:)?\d{1,2}:\d{2}[.,]\d{1,3}\s*-->").expect("Invalid regex")
});

// Inline markup: <c>, </c>, <i>, <00:00:01.200>, <v Speaker>, plus ASS-style {\an8}.
static MARKUP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^<>]*>|\{\\[^{}]*\}").expect("Invalid regex"));

const ENTITIES: &[(&str, &str)] = &[
    ("&nbsp;", " "),
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&quot;", "\""),
    ("&#39;", "'"),
    ("&apos;", "'"),
    ("&amp;", "&"),
];

/// Convert a raw subtitle payload into plain text, one caption line per line.
///
/// Returns an empty string for binary input.
pub fn clean_transcript(raw: &str) -> String {
    if raw.contains('\0') {
        return String::new();
    }

    let lines: Vec<String> = raw.lines().map(normalize_line).collect();
    let mut kept: Vec<&str> = Vec::new();

    for (idx, line) in lines.iter().enumerate() {
        if line.is_empty() || is_header(line) || TIMING_LINE.is_match(line) {
            continue;
        }

        // Cue identifiers and SRT sequence numbers sit right above a timing line.
        if lines
            .get(idx + 1)
            .is_some_and(|next| TIMING_LINE.is_match(next))
        {
            continue;
        }

        if kept.last() != Some(&line.as_str()) {
            kept.push(line);
        }
    }

    kept.join("\n")
}

/// Strip markup and entities until stable, then collapse whitespace.
fn normalize_line(line: &str) -> String {
    let mut current = line.to_string();
    loop {
        let mut next = MARKUP.replace_all(&current, "").into_owned();
        for (entity, replacement) in ENTITIES {
            next = next.replace(entity, replacement);
        }
        if next == current {
            break;
        }
        current = next;
    }

    current.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn is_header(line: &str) -> bool {
    line.starts_with("WEBVTT")
        || line.starts_with("Kind:")
        || line.starts_with("Language:")
        || line == "NOTE"
        || line.starts_with("NOTE ")
        || line == "STYLE"
        || line == "REGION"
        || line.starts_with("::cue")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_removes_headers_timestamps_and_tags() {
        let raw = "WEBVTT
Kind: captions
Language: ru

00:00:00.100 --> 00:00:01.200 align:start position:0%
Привет<00:00:00.500><c> мир</c>

00:00:01.200 --> 00:00:02.200
Привет мир
";
        let cleaned = clean_transcript(raw);
        assert!(!cleaned.contains("WEBVTT"));
        assert!(!cleaned.contains("-->"));
        assert!(!cleaned.contains("<c>"));
        assert_eq!(cleaned, "Привет мир");
    }

    #[test]
    fn test_srt_numbering_and_styling() {
        let raw = "1
00:00:01,000 --> 00:00:02,500
<i>Hello</i>   world

2
00:00:02,500 --> 00:00:04,000
{\\an8}Second &amp; last line
";
        assert_eq!(clean_transcript(raw), "Hello world\nSecond & last line");
    }

    #[test]
    fn test_rolling_youtube_captions_are_deduplicated() {
        let raw = "WEBVTT

00:00:00.000 --> 00:00:02.000
first line

00:00:02.000 --> 00:00:02.010
first line
second line

00:00:02.010 --> 00:00:04.000
second line
third line
";
        assert_eq!(clean_transcript(raw), "first line\nsecond line\nthird line");
    }

    #[test]
    fn test_vtt_cue_identifiers_and_short_timestamps() {
        let raw = "WEBVTT

intro
00:01.000 --> 00:02.000
Hi there

NOTE this is a comment

00:02.000 --> 00:03.000
General Kenobi
";
        assert_eq!(clean_transcript(raw), "Hi there\nGeneral Kenobi");
    }

    #[test]
    fn test_plain_numbers_in_text_survive() {
        let raw = "00:00:01.000 --> 00:00:02.000
In the year

00:00:02.000 --> 00:00:03.000
2024
";
        assert_eq!(clean_transcript(raw), "In the year\n2024");
    }

    #[test]
    fn test_idempotent() {
        let inputs = [
            "WEBVTT\n\n00:00:00.000 --> 00:00:01.000\n<c>a</c>  b\n\n00:00:01.000 --> 00:00:02.000\na b\nc\n",
            "1\n00:00:01,000 --> 00:00:02,000\n&amp;lt;b&amp;gt;bold&amp;lt;/b&amp;gt;\n",
            "<<b>i>nested</i>",
            "already clean\ntext here",
            "Kind: <c>x</c>\n<c>Kind: y</c>",
            "line\n\n\nline\n",
            "garbage \0 binary",
            "",
        ];

        for input in inputs {
            let once = clean_transcript(input);
            assert_eq!(clean_transcript(&once), once, "not idempotent for {input:?}");
        }
    }

    #[test]
    fn test_clean_text_is_unchanged() {
        let text = "already clean\ntext here";
        assert_eq!(clean_transcript(text), text);
    }

    #[test]
    fn test_binary_input_is_empty() {
        assert_eq!(clean_transcript("WEBVTT\0\u{1}\u{2}"), "");
    }

    #[test]
    fn test_header_only_payload_is_empty() {
        assert_eq!(clean_transcript("WEBVTT\nKind: captions\nLanguage: en\n\n"), "");
    }
}
