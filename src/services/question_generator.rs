use async_openai::{config::OpenAIConfig, Client};
use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde_json::json;

use crate::{
    config::Config,
    constants::quiz_prompt::build_question_prompt,
    errors::GeneratorError,
    models::domain::{GeneratedQuestion, LocationContext},
};

/// One request/response exchange with a text generator. Implementations never
/// retry; the pipeline owns the retry policy.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QuestionGenerator: Send + Sync {
    async fn generate(
        &self,
        transcript: &str,
        remaining: usize,
        location: &LocationContext,
    ) -> Result<Vec<GeneratedQuestion>, GeneratorError>;
}

pub struct OpenAiQuestionGenerator {
    client: Client<OpenAIConfig>,
    model: String,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

impl OpenAiQuestionGenerator {
    pub fn new(config: &Config) -> Self {
        let openai_config = OpenAIConfig::new()
            .with_api_key(config.openai_api_key.expose_secret())
            .with_api_base(&config.openai_api_base);

        Self {
            client: Client::with_config(openai_config),
            model: config.openai_model.clone(),
            temperature: config.openai_temperature,
        }
    }
}

#[async_trait]
impl QuestionGenerator for OpenAiQuestionGenerator {
    async fn generate(
        &self,
        transcript: &str,
        remaining: usize,
        location: &LocationContext,
    ) -> Result<Vec<GeneratedQuestion>, GeneratorError> {
        let prompt = build_question_prompt(transcript, remaining, location);
        let request = json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }],
            "temperature": self.temperature,
        });

        log::debug!(
            "Requesting {} questions from model {}",
            remaining,
            self.model
        );

        let completion: ChatCompletion = self
            .client
            .chat()
            .create_byot(request)
            .await
            .map_err(|e| GeneratorError::Provider(e.to_string()))?;

        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or(GeneratorError::EmptyResponse)?;

        parse_question_batch(&content)
    }
}

/// Parses generator output as a JSON array of questions.
///
/// The raw text is parsed strictly first. If that fails, the slice between the
/// first `[` and the last `]` is parsed instead, which recovers arrays wrapped
/// in prose or markdown fences.
pub fn parse_question_batch(raw: &str) -> Result<Vec<GeneratedQuestion>, GeneratorError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(GeneratorError::EmptyResponse);
    }

    match serde_json::from_str::<Vec<GeneratedQuestion>>(raw) {
        Ok(questions) => Ok(questions),
        Err(strict_err) => {
            log::warn!("Generator output is not a bare JSON array, scanning for one");
            let embedded = extract_array_slice(raw).ok_or_else(|| {
                GeneratorError::MalformedOutput(format!("no JSON array found ({strict_err})"))
            })?;
            serde_json::from_str::<Vec<GeneratedQuestion>>(embedded)
                .map_err(|e| GeneratorError::MalformedOutput(e.to_string()))
        }
    }
}

fn extract_array_slice(raw: &str) -> Option<&str> {
    let start = raw.find('[')?;
    let end = raw.rfind(']')?;
    (start < end).then(|| &raw[start..=end])
}
