//! Answer generation over a cleaned transcript.

mod openai;

pub use openai::OpenAiCompletionClient;

use crate::config::{LlmSettings, Prompts};
use crate::error::{AnalyzerError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument};

/// Cache slot shared by the default prompt and generic "analyze" phrasings.
pub const DEFAULT_PROMPT_KEY: &str = "default";

/// Instructions treated as "just analyze the video".
const GENERIC_INSTRUCTIONS: &[&str] = &[
    "analyze",
    "analyse",
    "analyze this",
    "analyze this video",
    "analyze the video",
    "analysis",
    "summarize",
    "summarise",
    "summary",
    "summarize this video",
    "анализ",
    "проанализируй",
    "проанализируй видео",
    "разбор",
    "сделай разбор",
];

/// A single chat completion call.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub model: String,
    pub temperature: f32,
    pub system: String,
    pub user: String,
}

/// Trait for LLM completion backends.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Return the generated text for the request.
    async fn complete(&self, request: CompletionRequest) -> Result<String>;
}

/// Builds prompts from a transcript and delegates to a completion client.
pub struct AnswerGenerator {
    client: Arc<dyn CompletionClient>,
    prompts: Prompts,
    model: String,
    temperature: f32,
    max_transcript_chars: usize,
}

impl AnswerGenerator {
    pub fn new(client: Arc<dyn CompletionClient>, prompts: Prompts, settings: &LlmSettings) -> Self {
        Self {
            client,
            prompts,
            model: settings.model.clone(),
            temperature: settings.temperature,
            max_transcript_chars: settings.max_transcript_chars,
        }
    }

    /// Build the user message for the completion call.
    pub fn build_prompt(&self, transcript: &str, instruction: Option<&str>) -> String {
        let instruction = match instruction {
            Some(text) if !is_generic_instruction(text) => text.trim().to_string(),
            _ => self.prompts.analysis.default_instruction.clone(),
        };

        let mut vars = HashMap::new();
        vars.insert("instruction".to_string(), instruction);
        vars.insert(
            "transcript".to_string(),
            truncate_chars(transcript, self.max_transcript_chars).to_string(),
        );

        self.prompts.render_with_custom(&self.prompts.analysis.user, &vars)
    }

    /// Generate an answer for the transcript.
    #[instrument(skip(self, transcript), fields(chars = transcript.len()))]
    pub async fn generate(&self, transcript: &str, instruction: Option<&str>) -> Result<String> {
        let request = CompletionRequest {
            model: self.model.clone(),
            temperature: self.temperature,
            system: self.prompts.analysis.system.clone(),
            user: self.build_prompt(transcript, instruction),
        };

        let answer = self.client.complete(request).await?;
        let answer = answer.trim();
        if answer.is_empty() {
            return Err(AnalyzerError::Llm("Empty response from LLM".to_string()));
        }

        info!("Generated answer ({} chars)", answer.len());
        Ok(answer.to_string())
    }
}

/// Whether the instruction is empty or a generic request to analyze the video.
pub fn is_generic_instruction(instruction: &str) -> bool {
    let normalized = normalize_instruction(instruction);
    normalized.is_empty() || GENERIC_INSTRUCTIONS.contains(&normalized.as_str())
}

/// Key identifying an instruction in the answer cache.
pub fn prompt_key(instruction: Option<&str>) -> String {
    match instruction {
        Some(text) if !is_generic_instruction(text) => normalize_instruction(text),
        _ => DEFAULT_PROMPT_KEY.to_string(),
    }
}

fn normalize_instruction(instruction: &str) -> String {
    let collapsed = instruction
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    collapsed
        .trim_end_matches(|c: char| c.is_ascii_punctuation())
        .trim()
        .to_string()
}

/// Cut `text` to at most `max` characters on a char boundary.
fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct RecordingClient {
        reply: String,
        calls: Mutex<Vec<CompletionRequest>>,
    }

    #[async_trait]
    impl CompletionClient for RecordingClient {
        async fn complete(&self, request: CompletionRequest) -> Result<String> {
            self.calls.lock().unwrap().push(request);
            Ok(self.reply.clone())
        }
    }

    fn generator(reply: &str) -> (AnswerGenerator, Arc<RecordingClient>) {
        let client = Arc::new(RecordingClient {
            reply: reply.to_string(),
            calls: Mutex::new(Vec::new()),
        });
        let generator = AnswerGenerator::new(client.clone(), Prompts::default(), &LlmSettings::default());
        (generator, client)
    }

    #[test]
    fn test_generic_instructions() {
        assert!(is_generic_instruction(""));
        assert!(is_generic_instruction("   "));
        assert!(is_generic_instruction("Analyze"));
        assert!(is_generic_instruction("  analyze   this video! "));
        assert!(is_generic_instruction("Проанализируй"));
        assert!(!is_generic_instruction("What tools does the author use?"));
    }

    #[test]
    fn test_default_prompt_for_generic_instruction() {
        let (generator, _) = generator("ok");
        let default = generator.build_prompt("hello", None);
        let generic = generator.build_prompt("hello", Some("analyze"));

        assert_eq!(default, generic);
        assert!(default.contains(&Prompts::default().analysis.default_instruction));
        assert!(default.contains("hello"));
    }

    #[test]
    fn test_custom_instruction_is_used() {
        let (generator, _) = generator("ok");
        let prompt = generator.build_prompt("transcript body", Some("  List the recipes  "));
        assert!(prompt.starts_with("List the recipes"));
        assert!(prompt.contains("transcript body"));
    }

    #[test]
    fn test_transcript_is_truncated_on_char_boundary() {
        let client = Arc::new(RecordingClient {
            reply: String::new(),
            calls: Mutex::new(Vec::new()),
        });
        let settings = LlmSettings {
            max_transcript_chars: 3,
            ..LlmSettings::default()
        };
        let generator = AnswerGenerator::new(client, Prompts::default(), &settings);

        let prompt = generator.build_prompt("приветствие", None);
        assert!(prompt.ends_with("при"));
    }

    #[test]
    fn test_prompt_key() {
        assert_eq!(prompt_key(None), DEFAULT_PROMPT_KEY);
        assert_eq!(prompt_key(Some("Analyze.")), DEFAULT_PROMPT_KEY);
        assert_eq!(prompt_key(Some("What  is X?")), "what is x");
    }

    #[tokio::test]
    async fn test_generate_passes_model_and_prompts() {
        let (generator, client) = generator("  Summary text \n");
        let answer = generator.generate("transcript", Some("Explain X")).await.unwrap();

        assert_eq!(answer, "Summary text");
        let calls = client.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].model, "openai/gpt-4o-mini");
        assert_eq!(calls[0].system, Prompts::default().analysis.system);
        assert!(calls[0].user.contains("Explain X"));
    }

    #[tokio::test]
    async fn test_blank_reply_is_error() {
        let (generator, _) = generator("   ");
        let err = generator.generate("transcript", None).await.unwrap_err();
        assert!(matches!(err, AnalyzerError::Llm(_)));
    }
}
