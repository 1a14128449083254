use reqwest::Response;
use serde::de::DeserializeOwned;

use crate::errors::{AppError, AppResult};

const MAX_ERROR_BODY: usize = 500;

/// Returns the response unchanged when it is 2xx, otherwise an upstream
/// error carrying `context`, the status and the start of the body.
pub async fn ensure_success(response: Response, context: &str) -> AppResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(upstream_error(context, status.as_u16(), &body))
}

/// Checks the status and decodes the JSON body as `T`.
pub async fn json_body<T: DeserializeOwned>(response: Response, context: &str) -> AppResult<T> {
    let response = ensure_success(response, context).await?;
    response
        .json::<T>()
        .await
        .map_err(|e| AppError::UpstreamError(format!("{context}: invalid response body: {e}")))
}

pub fn upstream_error(context: &str, status: u16, body: &str) -> AppError {
    let body = body.trim();
    let snippet: String = body.chars().take(MAX_ERROR_BODY).collect();
    if snippet.is_empty() {
        AppError::UpstreamError(format!("{context}: status {status}"))
    } else {
        AppError::UpstreamError(format!("{context}: status {status}: {snippet}"))
    }
}
