use std::time::Duration;

use reqwest::{Client, StatusCode};
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue};
use trawl_core::config::{DEFAULT_USER_AGENT, HarvestSettings};
use trawl_core::error::AppError;
use trawl_core::traits::Fetcher;

/// HTTP fetcher using reqwest.
///
/// Downloads raw bodies (HTML or JSON) with a configurable User-Agent and
/// timeout. Pacing is not done here; wrap it in a `PageFetcher` so every
/// request passes the compliance gate first.
#[derive(Clone)]
pub struct ReqwestFetcher {
    client: Client,
    timeout_secs: u64,
}

impl ReqwestFetcher {
    pub fn new() -> Result<Self, AppError> {
        Self::with_options(Duration::from_secs(30), DEFAULT_USER_AGENT)
    }

    pub fn from_settings(settings: &HarvestSettings) -> Result<Self, AppError> {
        Self::with_options(settings.timeout, &settings.user_agent)
    }

    pub fn with_options(timeout: Duration, user_agent: &str) -> Result<Self, AppError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml,application/json;q=0.9,*/*;q=0.8"),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.8,uk;q=0.6"));

        let client = Client::builder()
            .user_agent(user_agent)
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::ConfigError(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            timeout_secs: timeout.as_secs(),
        })
    }

    fn send_error(&self, e: reqwest::Error) -> AppError {
        if e.is_timeout() {
            AppError::Timeout(self.timeout_secs)
        } else if e.is_connect() {
            AppError::NetworkError(format!("Connection failed: {e}"))
        } else {
            AppError::HttpError(e.to_string())
        }
    }
}

fn status_error(status: StatusCode, url: &str) -> Option<AppError> {
    let code = status.as_u16();
    match status {
        s if s.is_success() => None,
        StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS => Some(AppError::HttpError(format!(
            "HTTP {code} for {url} (refused, slow down or check the compliance policy)"
        ))),
        _ => Some(AppError::HttpError(format!("HTTP {code} for {url}"))),
    }
}

impl Fetcher for ReqwestFetcher {
    async fn fetch(&self, url: &str) -> Result<String, AppError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.send_error(e))?;

        if let Some(error) = status_error(response.status(), url) {
            tracing::debug!(%url, status = response.status().as_u16(), "Non-success status");
            return Err(error);
        }

        response
            .text()
            .await
            .map_err(|e| AppError::HttpError(format!("Failed to read response body: {e}")))
    }
}
