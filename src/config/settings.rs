//! Configuration settings for the analyzer.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub server: ServerSettings,
    pub subtitles: SubtitleSettings,
    pub llm: LlmSettings,
    pub cache: CacheSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Root directory for per-request working directories.
    pub temp_dir: String,
    /// Keep per-request working directories after the run (for debugging).
    pub keep_temp_files: bool,
    /// Include diagnostics in API responses.
    pub debug: bool,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            temp_dir: std::env::temp_dir().to_string_lossy().into_owned(),
            keep_temp_files: false,
            debug: false,
            log_level: "info".to_string(),
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}

/// Subtitle extraction settings (yt-dlp).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SubtitleSettings {
    /// yt-dlp executable name or path.
    pub binary: String,
    /// Netscape cookie file passed to yt-dlp (copied before use).
    pub cookies_path: Option<String>,
    /// Extra extractor arguments, whitespace separated.
    pub extractor_args: String,
    /// Keep the first attempt minimal: never request regular subtitles up front.
    pub manual_mode: bool,
    /// Request regular subtitles together with auto-generated ones on the first attempt.
    pub include_regular_subs: bool,
    /// Retry with regular subtitles when auto-generated ones are empty.
    pub fallback_regular_on_empty: bool,
    /// Retry with the fallback language chain when the primary one yields nothing.
    pub fallback_langs_on_empty: bool,
    /// Primary language chain (comma separated).
    pub sub_langs: String,
    /// Fallback language chain (comma separated).
    pub sub_langs_fallback: String,
    /// Per-invocation timeout for yt-dlp.
    pub timeout_secs: u64,
}

impl Default for SubtitleSettings {
    fn default() -> Self {
        Self {
            binary: "yt-dlp".to_string(),
            cookies_path: None,
            extractor_args: "--js-runtimes node --remote-components ejs:github --extractor-args youtube:player_client=web".to_string(),
            manual_mode: true,
            include_regular_subs: false,
            fallback_regular_on_empty: true,
            fallback_langs_on_empty: true,
            sub_langs: "ru,ru-orig".to_string(),
            sub_langs_fallback: "en,en-orig".to_string(),
            timeout_secs: 120,
        }
    }
}

/// LLM settings for answer generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    /// Model identifier sent to the completion endpoint.
    pub model: String,
    pub temperature: f32,
    /// Base URL of an OpenAI-compatible API.
    pub api_base: String,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
    /// Transcript characters sent as context.
    pub max_transcript_chars: usize,
    pub timeout_secs: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            model: "openai/gpt-4o-mini".to_string(),
            temperature: 0.2,
            api_base: "https://openrouter.ai/api/v1".to_string(),
            api_key_env: "OPENROUTER_API_KEY".to_string(),
            max_transcript_chars: 12_000,
            timeout_secs: 60,
        }
    }
}

/// Result cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// Entry lifetime in seconds. Zero or negative disables caching.
    pub ttl_secs: i64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self { ttl_secs: 900 }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Directory with an `analysis.toml` overriding the default prompts.
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}

impl Settings {
    /// Load settings from the default configuration file, then apply environment overrides.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        let mut settings = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            Settings::default()
        };

        settings.apply_env_with(|key| std::env::var(key).ok());
        Ok(settings)
    }

    /// Apply environment overrides using the given lookup.
    ///
    /// Variable names match the container deployment (`YTDLP_*`, `LLM_*`, ...).
    /// Unparsable values leave the current setting untouched.
    pub fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string());

        if let Some(v) = get("LOG_LEVEL").filter(|v| !v.is_empty()) {
            self.general.log_level = v.to_lowercase();
        }
        override_bool(&mut self.general.keep_temp_files, get("YTDLP_KEEP_TEMP"));
        override_bool(&mut self.general.debug, get("YTDLP_DEBUG"));

        if let Some(v) = get("HOST").filter(|v| !v.is_empty()) {
            self.server.host = v;
        }
        override_parsed(&mut self.server.port, get("PORT"));

        if let Some(v) = get("YTDLP_BIN").filter(|v| !v.is_empty()) {
            self.subtitles.binary = v;
        }
        if let Some(v) = get("YTDLP_COOKIES_PATH") {
            self.subtitles.cookies_path = if v.is_empty() { None } else { Some(v) };
        }
        if let Some(v) = get("YTDLP_EXTRA_ARGS") {
            self.subtitles.extractor_args = v;
        }
        override_bool(&mut self.subtitles.manual_mode, get("YTDLP_MANUAL_MODE"));
        override_bool(&mut self.subtitles.include_regular_subs, get("YTDLP_INCLUDE_REGULAR_SUBS"));
        override_bool(
            &mut self.subtitles.fallback_regular_on_empty,
            get("YTDLP_FALLBACK_REGULAR_ON_EMPTY"),
        );
        override_bool(
            &mut self.subtitles.fallback_langs_on_empty,
            get("YTDLP_FALLBACK_LANGS_ON_EMPTY"),
        );
        if let Some(v) = get("YTDLP_SUB_LANGS") {
            self.subtitles.sub_langs = v;
        }
        if let Some(v) = get("YTDLP_SUB_LANGS_FALLBACK") {
            self.subtitles.sub_langs_fallback = v;
        }
        override_parsed(&mut self.subtitles.timeout_secs, get("YTDLP_TIMEOUT_SEC"));

        if let Some(v) = get("LLM_MODEL").filter(|v| !v.is_empty()) {
            self.llm.model = v;
        }
        override_parsed(&mut self.llm.temperature, get("LLM_TEMPERATURE"));
        if let Some(v) = get("LLM_API_BASE").filter(|v| !v.is_empty()) {
            self.llm.api_base = v;
        }

        override_parsed(&mut self.cache.ttl_secs, get("ANALYZE_CACHE_TTL_SEC"));
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("ytva")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded temp directory path.
    pub fn temp_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.temp_dir)
    }

    /// Get the expanded cookie file path, if configured.
    pub fn cookies_path(&self) -> Option<PathBuf> {
        self.subtitles
            .cookies_path
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(Self::expand_path)
    }
}

/// Parse a truthy/falsy flag the way the deployment scripts write them.
pub fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn override_bool(target: &mut bool, value: Option<String>) {
    if let Some(flag) = value.as_deref().and_then(parse_flag) {
        *target = flag;
    }
}

fn override_parsed<T: std::str::FromStr>(target: &mut T, value: Option<String>) {
    if let Some(parsed) = value.and_then(|v| v.parse().ok()) {
        *target = parsed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.subtitles.sub_langs, "ru,ru-orig");
        assert_eq!(settings.subtitles.sub_langs_fallback, "en,en-orig");
        assert!(settings.subtitles.manual_mode);
        assert!(!settings.subtitles.include_regular_subs);
        assert!(settings.subtitles.fallback_regular_on_empty);
        assert_eq!(settings.cache.ttl_secs, 900);
        assert_eq!(settings.llm.model, "openai/gpt-4o-mini");
    }

    #[test]
    fn test_env_overrides() {
        let mut settings = Settings::default();
        settings.apply_env_with(lookup(&[
            ("YTDLP_MANUAL_MODE", "off"),
            ("YTDLP_INCLUDE_REGULAR_SUBS", "YES"),
            ("YTDLP_SUB_LANGS", " de,fr "),
            ("YTDLP_COOKIES_PATH", "/app/cookies.txt"),
            ("ANALYZE_CACHE_TTL_SEC", "0"),
            ("LLM_TEMPERATURE", "0.5"),
            ("PORT", "9000"),
        ]));

        assert!(!settings.subtitles.manual_mode);
        assert!(settings.subtitles.include_regular_subs);
        assert_eq!(settings.subtitles.sub_langs, "de,fr");
        assert_eq!(
            settings.cookies_path(),
            Some(PathBuf::from("/app/cookies.txt"))
        );
        assert_eq!(settings.cache.ttl_secs, 0);
        assert_eq!(settings.llm.temperature, 0.5);
        assert_eq!(settings.server.port, 9000);
    }

    #[test]
    fn test_invalid_env_values_are_ignored() {
        let mut settings = Settings::default();
        settings.apply_env_with(lookup(&[
            ("ANALYZE_CACHE_TTL_SEC", "soon"),
            ("YTDLP_DEBUG", "maybe"),
            ("YTDLP_COOKIES_PATH", "  "),
        ]));

        assert_eq!(settings.cache.ttl_secs, 900);
        assert!(!settings.general.debug);
        assert_eq!(settings.cookies_path(), None);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            [subtitles]
            sub_langs = "uk"

            [cache]
            ttl_secs = 60
            "#,
        )
        .unwrap();

        assert_eq!(settings.subtitles.sub_langs, "uk");
        assert_eq!(settings.subtitles.sub_langs_fallback, "en,en-orig");
        assert_eq!(settings.cache.ttl_secs, 60);
        assert_eq!(settings.server.port, 8000);
    }

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag("On"), Some(true));
        assert_eq!(parse_flag("0"), Some(false));
        assert_eq!(parse_flag(""), None);
    }
}
