use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::Serialize;
use thiserror::Error;

/// Failure of a single generation round against the language model.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeneratorError {
    #[error("empty response from question generator")]
    EmptyResponse,

    #[error("malformed generator output: {0}")]
    MalformedOutput(String),

    #[error("question generator request failed: {0}")]
    Provider(String),

    #[error("question generator timed out after {0}ms")]
    Timeout(u64),
}

impl GeneratorError {
    /// Whether the next round may be attempted after this failure.
    pub fn is_retryable(&self) -> bool {
        matches!(self, GeneratorError::Timeout(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    #[error("missing field '{field}' in question {index}")]
    IncompleteQuestionRecord { index: usize, field: &'static str },

    #[error("unknown question type '{value}' in question {index}")]
    InvalidQuestionType { index: usize, value: String },

    #[error("no questions generated")]
    NoQuestionsGenerated,

    #[error(transparent)]
    Generator(#[from] GeneratorError),
}

#[derive(Debug, Clone, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Upstream request failed: {0}")]
    UpstreamError(String),

    #[error("Transcript error: {0}")]
    TranscriptError(String),

    #[error("Question generation failed: {0}")]
    GenerationError(#[from] PipelineError),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: bool,
    pub message: String,
    pub code: u16,
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::UpstreamError(_)
            | AppError::TranscriptError(_)
            | AppError::GenerationError(_)
            | AppError::ConfigError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorResponse {
            error: true,
            message: self.to_string(),
            code: self.status_code().as_u16(),
        })
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::UpstreamError(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::ValidationError(err.to_string())
    }
}

pub type AppResult<T> = Result<T, AppError>;
