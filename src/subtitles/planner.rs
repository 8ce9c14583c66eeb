//! Extraction tier planning.

use super::{ExtractionTier, SubtitleKind};
use crate::config::SubtitleSettings;

/// yt-dlp wildcard used when no language chain is configured at all.
pub const ANY_LANGUAGE: &str = "all";

/// YouTube's marker for the original-language track (`ru-orig`).
const ORIGINAL_TRACK_SUFFIX: &str = "orig";

/// Upper bound on the number of planned tiers.
pub const MAX_TIERS: usize = 4;

/// Builds the ordered list of extraction attempts for a request.
///
/// Planning is pure: the same settings and language override always give
/// the same plan.
#[derive(Debug, Clone)]
pub struct TierPlanner {
    primary: Vec<String>,
    fallback: Vec<String>,
    include_regular_first: bool,
    fallback_regular_on_empty: bool,
    fallback_langs_on_empty: bool,
}

impl TierPlanner {
    pub fn from_settings(settings: &SubtitleSettings) -> Self {
        Self {
            primary: parse_lang_chain(&settings.sub_langs),
            fallback: parse_lang_chain(&settings.sub_langs_fallback),
            // Manual mode keeps the first request footprint minimal.
            include_regular_first: settings.include_regular_subs && !settings.manual_mode,
            fallback_regular_on_empty: settings.fallback_regular_on_empty,
            fallback_langs_on_empty: settings.fallback_langs_on_empty,
        }
    }

    /// Language chain the first tier will use.
    pub fn resolve_primary(&self, lang_override: Option<&str>) -> Vec<String> {
        let requested = lang_override.map(parse_lang_chain).unwrap_or_default();
        if !requested.is_empty() {
            return requested;
        }
        if !self.primary.is_empty() {
            return self.primary.clone();
        }
        if !self.fallback.is_empty() {
            return self.fallback.clone();
        }
        vec![ANY_LANGUAGE.to_string()]
    }

    /// Configured fallback language chain.
    pub fn fallback(&self) -> &[String] {
        &self.fallback
    }

    /// Plan the attempts for a request.
    pub fn plan(&self, lang_override: Option<&str>) -> Vec<ExtractionTier> {
        let primary = self.resolve_primary(lang_override);
        let mut chains = vec![primary.clone()];

        if self.fallback_langs_on_empty && !self.fallback.is_empty() && self.fallback != primary {
            chains.push(self.fallback.clone());
        }

        let mut tiers = Vec::with_capacity(MAX_TIERS);
        for langs in chains {
            let first_kind = if self.include_regular_first {
                SubtitleKind::Both
            } else {
                SubtitleKind::Auto
            };
            tiers.push(ExtractionTier {
                rank: tiers.len() + 1,
                langs: langs.clone(),
                kind: first_kind,
            });

            if self.fallback_regular_on_empty && !first_kind.includes_regular() {
                tiers.push(ExtractionTier {
                    rank: tiers.len() + 1,
                    langs,
                    kind: SubtitleKind::Regular,
                });
            }
        }

        tiers
    }
}

/// Split a comma separated language preference into codes.
///
/// Entries are trimmed and put in YouTube's canonical case; empty and
/// repeated entries are dropped. yt-dlp matches `--sub-langs` case-sensitively,
/// so this chain is exactly what both the tool and the cache key see.
pub fn parse_lang_chain(value: &str) -> Vec<String> {
    let mut langs: Vec<String> = Vec::new();
    for lang in value.split(',').map(str::trim).filter(|l| !l.is_empty()) {
        let lang = canonical_lang(lang);
        if !langs.contains(&lang) {
            langs.push(lang);
        }
    }
    langs
}

/// `RU` -> `ru`, `pt-br` -> `pt-BR`, `ZH-HANS` -> `zh-Hans`, `en-ORIG` -> `en-orig`.
fn canonical_lang(code: &str) -> String {
    code.split('-')
        .enumerate()
        .map(|(i, part)| {
            let alpha = part.chars().all(|c| c.is_ascii_alphabetic());
            match part.len() {
                _ if i == 0 => part.to_ascii_lowercase(),
                _ if part.eq_ignore_ascii_case(ORIGINAL_TRACK_SUFFIX) => ORIGINAL_TRACK_SUFFIX.to_string(),
                2 if alpha => part.to_ascii_uppercase(),
                4 if alpha => {
                    let lower = part.to_ascii_lowercase();
                    let mut chars = lower.chars();
                    chars
                        .next()
                        .map(|first| first.to_ascii_uppercase().to_string() + chars.as_str())
                        .unwrap_or_default()
                }
                _ => part.to_ascii_lowercase(),
            }
        })
        .collect::<Vec<_>>()
        .join("-")
}
