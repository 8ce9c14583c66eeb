//! yt-video-analyzer - subtitle-based YouTube video analysis
//!
//! Extracts a transcript from a video's subtitles through `yt-dlp` and asks
//! an LLM to summarize it or answer a question about it, behind a small
//! HTTP API.
//!
//! # Architecture
//!
//! - `config` - Settings, environment overrides and prompt templates
//! - `subtitles` - Tier planning, yt-dlp extraction, cleaning and classification
//! - `cache` - In-memory TTL cache for pipeline results
//! - `answer` - Prompt building and LLM completion
//! - `orchestrator` - Pipeline coordination
//! - `cli` - Command line interface and HTTP server
//!
//! # Example
//!
//! ```rust,no_run
//! use yt_video_analyzer::config::Settings;
//! use yt_video_analyzer::orchestrator::{AnalyzeRequest, Orchestrator};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let orchestrator = Orchestrator::new(settings)?;
//!
//!     let request = AnalyzeRequest::new("https://www.youtube.com/watch?v=dQw4w9WgXcQ").with_lang("en");
//!     let response = orchestrator.analyze(&request).await?;
//!     println!("{}: {:?}", response.status, response.answer);
//!
//!     Ok(())
//! }
//! ```

pub mod answer;
pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod subtitles;

pub use error::{AnalyzerError, Result};
