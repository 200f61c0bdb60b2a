//! OpenAiSummarizer implementation.

use std::time::Duration;

use reqwest::Client;
use summarizer_core::{
    async_trait, ContextDocument, ProcessResult, Summarizer, SummarizerError,
};
use tracing::{debug, warn};

use crate::api_types::{ApiError, ChatCompletionRequest, ChatCompletionResponse, ChatMessage};
use crate::config::OpenAiConfig;
use crate::parse::parse_process_result;

/// Request timeout for completion calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(90);

/// A summarizer backed by an OpenAI-compatible chat-completion API.
///
/// The context document is serialized into a single user-role
/// instruction; the reply is parsed leniently and degrades to a
/// raw-text summary when the model returns no JSON object.
pub struct OpenAiSummarizer {
    client: Client,
    config: OpenAiConfig,
}

impl OpenAiSummarizer {
    /// Create a new summarizer with the given configuration.
    pub fn new(config: OpenAiConfig) -> Result<Self, SummarizerError> {
        if config.api_key.is_empty() {
            return Err(SummarizerError::Configuration(
                "API key is empty".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| {
                SummarizerError::Configuration(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self { client, config })
    }

    /// Create a summarizer from environment variables.
    ///
    /// See [`OpenAiConfig::from_env`] for the variables read.
    pub fn from_env() -> Result<Self, SummarizerError> {
        Self::new(OpenAiConfig::from_env()?)
    }

    /// Get the configuration.
    pub fn config(&self) -> &OpenAiConfig {
        &self.config
    }

    /// Render a context document into the completion instruction.
    fn render_instruction(context: &ContextDocument) -> Result<String, SummarizerError> {
        let document = serde_json::to_string_pretty(context).map_err(|e| {
            SummarizerError::Completion(format!("failed to serialize context: {}", e))
        })?;

        Ok(format!(
            "You are an assistant observing a group chat on behalf of its owner.\n\
             \n\
             The JSON document below describes the conversation:\n\
             - \"messages\" is the chronological conversation; \"sender\" values are raw platform identifiers.\n\
             - \"sender_map\" maps every raw identifier to the name to use. The entry mapped to \"yourself\" is the owner. Always refer to people through this map, never by raw identifier.\n\
             - \"previous_summary\" and \"previous_tasks\" are your previous run for this room (null when there is none).\n\
             - \"pending_tasks\" are the owner's open tasks with their ids.\n\
             - \"goals\" and \"response_rules\" govern what to produce and how to write it.\n\
             \n\
             {}\n\
             \n\
             Respond with only a JSON object and nothing else - no prose, no code fences. The object must contain exactly the fields declared in \"output_format\": \"summary\", \"reply\", \"needs_more_information\", \"task_updates\" (id, status, note per entry), and \"new_todos\".",
            document
        ))
    }

    /// Make a chat completion request.
    async fn chat_completion(&self, instruction: String) -> Result<String, SummarizerError> {
        let url = format!("{}/v1/chat/completions", self.config.api_url);

        let request = ChatCompletionRequest {
            model: self.config.model.clone(),
            messages: vec![ChatMessage::user(instruction)],
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        debug!(model = %request.model, "sending completion request");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| SummarizerError::Network(format!("Failed to send request: {}", e)))?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();

            // Try to parse as API error
            if let Ok(api_error) = serde_json::from_str::<ApiError>(&error_text) {
                return Err(SummarizerError::Completion(format!(
                    "API error ({}): {}",
                    status.as_u16(),
                    api_error.error.message
                )));
            }

            return Err(SummarizerError::Completion(format!(
                "API error ({}): {}",
                status.as_u16(),
                error_text
            )));
        }

        let completion: ChatCompletionResponse = response.json().await.map_err(|e| {
            SummarizerError::Completion(format!("Failed to parse response: {}", e))
        })?;

        if let Some(usage) = &completion.usage {
            debug!(
                "Token usage - prompt: {}, completion: {}, total: {}",
                usage.prompt_tokens, usage.completion_tokens, usage.total_tokens
            );
        }

        let text = completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_else(|| {
                warn!("no content in completion response");
                String::new()
            });

        Ok(text)
    }
}

#[async_trait]
impl Summarizer for OpenAiSummarizer {
    async fn complete(&self, context: &ContextDocument) -> Result<ProcessResult, SummarizerError> {
        let instruction = Self::render_instruction(context)?;
        let text = self.chat_completion(instruction).await?;
        Ok(parse_process_result(&text))
    }

    fn name(&self) -> &str {
        "OpenAiSummarizer"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use summarizer_core::{
        ContextMessage, Goals, OutputFormat, ResponseRules, RoomDescriptor, SELF_SENTINEL,
    };

    fn sample_context() -> ContextDocument {
        let mut sender_map = BTreeMap::new();
        sender_map.insert("@bot:x".to_string(), SELF_SENTINEL.to_string());
        sender_map.insert("@alice:x".to_string(), "Alice".to_string());

        ContextDocument {
            room: RoomDescriptor {
                alias: "k7pw".to_string(),
                name: Some("Family".to_string()),
            },
            messages: vec![ContextMessage {
                sender: "@alice:x".to_string(),
                content: "when is the meeting?".to_string(),
            }],
            sender_map,
            previous_summary: None,
            previous_tasks: None,
            pending_tasks: Vec::new(),
            goals: Goals::default(),
            response_rules: ResponseRules::default(),
            output_format: OutputFormat::default(),
        }
    }

    #[test]
    fn test_new_rejects_empty_api_key() {
        let result = OpenAiSummarizer::new(OpenAiConfig::default());
        assert!(matches!(result, Err(SummarizerError::Configuration(_))));
    }

    #[test]
    fn test_summarizer_name() {
        let config = OpenAiConfig::builder().api_key("test-key").build();
        let summarizer = OpenAiSummarizer::new(config).unwrap();
        assert_eq!(summarizer.name(), "OpenAiSummarizer");
    }

    #[test]
    fn test_render_instruction_carries_document_and_rules() {
        let instruction = OpenAiSummarizer::render_instruction(&sample_context()).unwrap();

        assert!(instruction.contains("when is the meeting?"));
        assert!(instruction.contains("sender_map"));
        assert!(instruction.contains("never by raw identifier"));
        assert!(instruction.contains("only a JSON object"));
        assert!(instruction.contains("new_todos"));
    }
}
