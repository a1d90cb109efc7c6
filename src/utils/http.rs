// src/utils/http.rs

//! HTTP client utilities.

use std::time::Duration;

use reqwest::RequestBuilder;

use crate::error::{AppError, Result};
use crate::models::CrawlerConfig;

/// Create a configured asynchronous HTTP client.
pub fn create_async_client(config: &CrawlerConfig) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;
    Ok(client)
}

/// Send a request and return the body, treating any non-2xx status as a transport error.
pub async fn fetch_text(request: RequestBuilder) -> Result<String> {
    let response = request.send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(AppError::transport(response.url().as_str(), status));
    }
    Ok(response.text().await?)
}
