//! Configuration module.
//!
//! Handles loading application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{AnalysisPrompts, Prompts};
pub use settings::{
    parse_flag, CacheSettings, GeneralSettings, LlmSettings, PromptSettings, ServerSettings,
    Settings, SubtitleSettings,
};
