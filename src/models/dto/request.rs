use serde::Deserialize;
use validator::Validate;

use crate::errors::{AppError, AppResult};

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct GenerateTestRequest {
    #[validate(
        required(message = "session_id is required in the request body"),
        length(min = 1, message = "session_id must not be empty")
    )]
    pub session_id: Option<String>,
}

impl GenerateTestRequest {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: Some(session_id.into()),
        }
    }

    /// Validates the body and yields the trimmed session id.
    pub fn into_session_id(self) -> AppResult<String> {
        self.validate()?;
        self.session_id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .ok_or_else(|| {
                AppError::ValidationError("session_id is required in the request body".to_string())
            })
    }
}

/// Body of the platform's `transcript-generated` notification.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TranscriptWebhookRequest {
    #[serde(default)]
    pub payload: Option<TranscriptWebhookPayload>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TranscriptWebhookPayload {
    #[serde(default, rename = "sessionId")]
    pub session_id: Option<String>,
}

impl TranscriptWebhookRequest {
    pub fn session_id(&self) -> AppResult<String> {
        self.payload
            .as_ref()
            .and_then(|p| p.session_id.as_deref())
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .ok_or_else(|| {
                AppError::ValidationError("sessionId not found in webhook payload".to_string())
            })
    }
}
