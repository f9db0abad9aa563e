// src/utils/http.rs

//! HTTP client utilities.

use std::time::Duration;

use crate::error::{AppError, Result};
use crate::models::RemoteConfig;

/// Create a configured asynchronous HTTP client.
pub fn create_async_client(config: &RemoteConfig) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()
        .map_err(|e| AppError::config(format!("failed to build HTTP client: {e}")))
}

/// Send a request and return the body of a successful response.
///
/// Connection failures, timeouts and non-2xx statuses all surface as
/// `AppError::Transport` tagged with `context`.
pub async fn send_for_text(request: reqwest::RequestBuilder, context: &str) -> Result<String> {
    let response = request
        .send()
        .await
        .map_err(|e| AppError::transport(context, e))?;

    let response = response
        .error_for_status()
        .map_err(|e| AppError::transport(context, e))?;

    response
        .text()
        .await
        .map_err(|e| AppError::transport(context, e))
}
