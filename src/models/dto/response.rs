use serde::Serialize;

use crate::models::domain::GeneratedTest;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateTestResponse {
    pub success: bool,
    pub message: String,
    pub test_id: String,
    pub question_count: usize,
    pub requested_count: usize,
    pub shortfall: usize,
}

impl From<GeneratedTest> for GenerateTestResponse {
    fn from(generated: GeneratedTest) -> Self {
        let shortfall = generated.shortfall();
        let message = if shortfall == 0 {
            "Test created, questions added, settings updated and published successfully"
                .to_string()
        } else {
            format!(
                "Test published with {} of {} requested questions",
                generated.question_count, generated.requested_count
            )
        };

        GenerateTestResponse {
            success: true,
            message,
            test_id: generated.test_id,
            question_count: generated.question_count,
            requested_count: generated.requested_count,
            shortfall,
        }
    }
}

/// Returned when a webhook names a session that was already handled.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateDeliveryResponse {
    pub success: bool,
    pub duplicate: bool,
    pub session_id: String,
    pub message: String,
}

impl DuplicateDeliveryResponse {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            success: true,
            duplicate: true,
            session_id: session_id.into(),
            message: "Session already processed or in progress".to_string(),
        }
    }
}
