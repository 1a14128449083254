use std::env;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use crate::errors::{AppError, AppResult};

const PLACEHOLDER_PLATFORM_KEY: &str = "platform_api_key";
const PLACEHOLDER_OPENAI_KEY: &str = "openai_api_key";

#[derive(Clone, Debug)]
pub struct Config {
    pub platform_api_host: String,
    pub platform_exam_api_host: String,
    pub platform_api_key: SecretString,
    pub platform_user_id: String,
    pub platform_namespace: String,
    pub platform_user_agent: String,
    pub platform_institute_id: String,
    pub openai_api_key: SecretString,
    pub openai_api_base: String,
    pub openai_model: String,
    pub openai_temperature: f32,
    pub web_server_host: String,
    pub web_server_port: u16,
    pub question_count: usize,
    pub max_generation_rounds: usize,
    pub generation_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub min_transcript_chars: usize,
    pub default_grade: String,
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parsed_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            platform_api_host: var_or("PLATFORM_API_HOST", "http://localhost:4000"),
            platform_exam_api_host: var_or("PLATFORM_EXAM_API_HOST", "http://localhost:4001"),
            platform_api_key: SecretString::from(var_or(
                "PLATFORM_API_KEY",
                PLACEHOLDER_PLATFORM_KEY,
            )),
            platform_user_id: var_or("PLATFORM_USER_ID", "platform_user_id"),
            platform_namespace: var_or("PLATFORM_NAMESPACE", "default"),
            platform_user_agent: var_or(
                "PLATFORM_USER_AGENT",
                concat!("session-test-generator/", env!("CARGO_PKG_VERSION")),
            ),
            platform_institute_id: var_or("PLATFORM_INSTITUTE_ID", "institute_id"),
            openai_api_key: SecretString::from(var_or("OPENAI_API_KEY", PLACEHOLDER_OPENAI_KEY)),
            openai_api_base: var_or("OPENAI_API_BASE", "https://api.openai.com/v1"),
            openai_model: var_or("OPENAI_MODEL", "gpt-3.5-turbo"),
            openai_temperature: parsed_or("OPENAI_TEMPERATURE", 0.3),
            web_server_host: var_or("WEB_SERVER_HOST", "127.0.0.1"),
            web_server_port: parsed_or("WEB_SERVER_PORT", 3000),
            question_count: parsed_or("QUESTION_COUNT", 20),
            max_generation_rounds: parsed_or("MAX_GENERATION_ROUNDS", 5),
            generation_timeout_secs: parsed_or("GENERATION_TIMEOUT_SECS", 30),
            request_timeout_secs: parsed_or("REQUEST_TIMEOUT_SECS", 30),
            min_transcript_chars: parsed_or("MIN_TRANSCRIPT_CHARS", 30),
            default_grade: var_or("DEFAULT_GRADE", "8"),
        }
    }

    pub fn generation_timeout(&self) -> Duration {
        Duration::from_secs(self.generation_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Rejects configurations that still carry placeholder credentials or
    /// counts that would make the generation loop meaningless.
    pub fn validate_for_production(&self) -> AppResult<()> {
        if self.platform_api_key.expose_secret() == PLACEHOLDER_PLATFORM_KEY {
            return Err(AppError::ConfigError(
                "PLATFORM_API_KEY is using its default value".to_string(),
            ));
        }

        if self.openai_api_key.expose_secret() == PLACEHOLDER_OPENAI_KEY {
            return Err(AppError::ConfigError(
                "OPENAI_API_KEY is using its default value".to_string(),
            ));
        }

        if self.question_count == 0 {
            return Err(AppError::ConfigError(
                "QUESTION_COUNT must be at least 1".to_string(),
            ));
        }

        if self.max_generation_rounds == 0 {
            return Err(AppError::ConfigError(
                "MAX_GENERATION_ROUNDS must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    #[cfg(test)]
    pub fn test_config() -> Self {
        Self {
            platform_api_host: "http://platform.test".to_string(),
            platform_exam_api_host: "http://exam.platform.test".to_string(),
            platform_api_key: SecretString::from("test_platform_key".to_string()),
            platform_user_id: "teacher-1".to_string(),
            platform_namespace: "test-namespace".to_string(),
            platform_user_agent: "session-test-generator/test".to_string(),
            platform_institute_id: "institute-1".to_string(),
            openai_api_key: SecretString::from("test_openai_key".to_string()),
            openai_api_base: "http://llm.test/v1".to_string(),
            openai_model: "gpt-3.5-turbo".to_string(),
            openai_temperature: 0.3,
            web_server_host: "127.0.0.1".to_string(),
            web_server_port: 3000,
            question_count: 5,
            max_generation_rounds: 5,
            generation_timeout_secs: 30,
            request_timeout_secs: 30,
            min_transcript_chars: 30,
            default_grade: "8".to_string(),
        }
    }
}
