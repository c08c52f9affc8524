use crate::ai::generator::ContentGenerator;
use crate::config::AiConfig;
use crate::error::{Error, Result};
use crate::logger;
use async_trait::async_trait;
use openrouter_api::{
    models::provider_preferences::ProviderPreferences,
    models::provider_preferences::ProviderSort,
    types::chat::{ChatCompletionRequest, Message},
};
use serde::Serialize;

pub const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1/";
pub const DEFAULT_MODEL: &str = "openai/gpt-oss-120b";
pub const DEFAULT_TEMPERATURE: f32 = 0.3;
pub const DEFAULT_MAX_TOKENS: u32 = 8192;

/// Source text beyond this many characters is dropped before prompting.
pub const MAX_SOURCE_CHARS: usize = 30_000;

#[derive(Debug, Clone, Serialize)]
pub struct ModelConfig {
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: Some(DEFAULT_TEMPERATURE),
            max_tokens: Some(DEFAULT_MAX_TOKENS),
        }
    }
}

fn truncate_source(text: &str) -> &str {
    match text.char_indices().nth(MAX_SOURCE_CHARS) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

fn questions_prompt(source: &str, count: usize) -> String {
    format!(
        r#"Create {count} multiple-choice questions from the study material below.

Respond ONLY with a JSON array (no markdown, no extra text) where each element is:
{{
    "id": integer, counting from 0,
    "text": "the question",
    "options": ["option 1", "option 2", "option 3", "option 4"],
    "answerIndices": [zero-based indices of every correct option]
}}
- Use more than one answer index only when several options are correct.

Material:
{source}
"#,
        count = count,
        source = truncate_source(source)
    )
}

fn flashcards_prompt(source: &str, count: usize) -> String {
    format!(
        r#"Create {count} flashcards from the study material below.

Respond ONLY with a JSON array (no markdown, no extra text) where each element is:
{{
    "id": integer, counting from 0,
    "front": "term or prompt",
    "back": "definition or answer",
    "explanation": "optional short explanation, or null"
}}

Material:
{source}
"#,
        count = count,
        source = truncate_source(source)
    )
}

/// Question and flashcard generation through OpenRouter.
#[derive(Debug)]
pub struct OpenRouterGenerator {
    client: openrouter_api::OpenRouterClient<openrouter_api::Ready>,
    config: ModelConfig,
}

impl OpenRouterGenerator {
    pub fn new(config: &AiConfig) -> Result<Self> {
        let client = openrouter_api::OpenRouterClient::new()
            .with_base_url(OPENROUTER_BASE_URL)
            .and_then(|c| c.with_api_key(config.api_key.clone()))
            .map_err(|e| Error::Generation(format!("Failed to create OpenRouter client: {}", e)))?;

        Ok(Self {
            client,
            config: config.model.clone(),
        })
    }

    async fn complete(&self, prompt: String) -> std::result::Result<String, String> {
        let messages = vec![
            Message::text(
                "system",
                "You are an educational assistant that writes study material as strict JSON.",
            ),
            Message::text("user", &prompt),
        ];

        let provider = ProviderPreferences::new().with_sort(ProviderSort::Throughput);

        let request = ChatCompletionRequest {
            model: self.config.model.clone(),
            messages,
            provider: Some(provider),
            stream: None,
            response_format: None,
            tools: None,
            tool_choice: None,
            models: None,
            transforms: None,
            route: None,
            user: None,
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
            top_p: None,
            top_k: None,
            frequency_penalty: None,
            presence_penalty: None,
            repetition_penalty: None,
            min_p: None,
            top_a: None,
            seed: None,
            stop: None,
            logit_bias: None,
            logprobs: None,
            top_logprobs: None,
            prediction: None,
            parallel_tool_calls: None,
            verbosity: None,
        };

        let response = self
            .client
            .chat()
            .map_err(|e| format!("OpenRouter API error: {}", e))?
            .chat_completion(request)
            .await
            .map_err(|e| format!("OpenRouter API error: {}", e))?;

        let Some(choice) = response.choices.first() else {
            return Err("No response choices received".to_string());
        };

        match &choice.message.content {
            openrouter_api::MessageContent::Text(text) => Ok(text.clone()),
            openrouter_api::MessageContent::Parts(parts) => {
                let text_parts: Vec<String> = parts
                    .iter()
                    .filter_map(|p| {
                        if let openrouter_api::ContentPart::Text(tc) = p {
                            Some(tc.text.clone())
                        } else {
                            None
                        }
                    })
                    .collect();
                Ok(text_parts.join("\n"))
            }
        }
    }
}

#[async_trait]
impl ContentGenerator for OpenRouterGenerator {
    async fn generate_questions(
        &self,
        source_text: &str,
        count: usize,
    ) -> std::result::Result<String, String> {
        logger::log(&format!("Requesting {} questions from {}", count, self.config.model));
        self.complete(questions_prompt(source_text, count)).await
    }

    async fn generate_flashcards(
        &self,
        source_text: &str,
        count: usize,
    ) -> std::result::Result<String, String> {
        logger::log(&format!("Requesting {} flashcards from {}", count, self.config.model));
        self.complete(flashcards_prompt(source_text, count)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_source_respects_char_boundaries() {
        let long = "é".repeat(MAX_SOURCE_CHARS + 10);
        let truncated = truncate_source(&long);
        assert_eq!(truncated.chars().count(), MAX_SOURCE_CHARS);
        assert_eq!(truncate_source("short"), "short");
    }

    #[test]
    fn test_prompts_name_schema_fields() {
        let prompt = questions_prompt("Photosynthesis converts light.", 5);
        assert!(prompt.contains("Create 5 multiple-choice questions"));
        assert!(prompt.contains("answerIndices"));
        assert!(prompt.contains("Photosynthesis converts light."));

        let prompt = flashcards_prompt("Cells", 3);
        assert!(prompt.contains("\"front\""));
        assert!(prompt.contains("explanation"));
    }

    #[test]
    fn test_model_config_defaults() {
        let config = ModelConfig::default();
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.temperature, Some(DEFAULT_TEMPERATURE));
    }
}
