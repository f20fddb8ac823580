//! Shared HTTP plumbing for the API adapters
//!
//! A thin wrapper over `reqwest::Client` that applies a timeout, maps HTTP
//! status codes onto `SourceError`, and retries throttled or failed
//! requests with backoff.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;

use crate::ports::SourceError;

/// Per-provider request settings
#[derive(Debug, Clone)]
pub struct HttpSettings {
    /// Request timeout
    pub timeout: Duration,
    /// Number of attempts before giving up
    pub max_retries: u32,
    /// Base delay for backoff (milliseconds)
    pub retry_base_delay_ms: u64,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(20),
            max_retries: 3,
            retry_base_delay_ms: 500,
        }
    }
}

/// JSON-over-HTTP client for one provider
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    provider: &'static str,
    settings: HttpSettings,
}

impl ApiClient {
    pub fn new(provider: &'static str, settings: HttpSettings) -> Result<Self, SourceError> {
        let http = Client::builder()
            .timeout(settings.timeout)
            .user_agent(concat!("chain-investigator/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SourceError::Network(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            provider,
            settings,
        })
    }

    pub fn provider(&self) -> &'static str {
        self.provider
    }

    /// GET `url` with query parameters and headers, decoding the body as `T`
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
        headers: &[(&'static str, String)],
    ) -> Result<T, SourceError> {
        let attempts = self.settings.max_retries.max(1);
        let mut last_error = None;

        for attempt in 0..attempts {
            let mut request = self.http.get(url).query(query);
            for (name, value) in headers {
                request = request.header(*name, value);
            }

            match request.send().await {
                Ok(response) => {
                    let status = response.status();

                    // Handle rate limiting with exponential backoff
                    if status == StatusCode::TOO_MANY_REQUESTS {
                        last_error = Some(SourceError::RateLimited {
                            provider: self.provider.to_string(),
                        });
                        if attempt + 1 < attempts {
                            let backoff = Duration::from_millis(
                                self.settings.retry_base_delay_ms * 2u64.pow(attempt + 1),
                            );
                            tracing::warn!(
                                "{} rate limited (429), backing off for {:?} (attempt {}/{})",
                                self.provider,
                                backoff,
                                attempt + 1,
                                attempts
                            );
                            tokio::time::sleep(backoff).await;
                        }
                        continue;
                    }

                    // Retry on server errors (5xx)
                    if status.is_server_error() {
                        last_error = Some(SourceError::Network(format!(
                            "{} server error: {}",
                            self.provider, status
                        )));
                        if attempt + 1 < attempts {
                            tokio::time::sleep(self.linear_backoff(attempt)).await;
                        }
                        continue;
                    }

                    if status == StatusCode::NOT_FOUND {
                        return Err(SourceError::NotFound(format!("{} returned {}", self.provider, status)));
                    }

                    if status.is_client_error() {
                        return Err(SourceError::Rejected(format!("{} returned {}", self.provider, status)));
                    }

                    let body = response.text().await.map_err(SourceError::from)?;
                    return serde_json::from_str(&body).map_err(|e| {
                        SourceError::MalformedResponse(format!("{}: {}", self.provider, e))
                    });
                }
                Err(e) => {
                    let err = SourceError::from(e);
                    if !err.is_retryable() {
                        return Err(err);
                    }
                    tracing::debug!("{} request failed: {} (attempt {}/{})", self.provider, err, attempt + 1, attempts);
                    last_error = Some(err);
                    if attempt + 1 < attempts {
                        tokio::time::sleep(self.linear_backoff(attempt)).await;
                    }
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            SourceError::Network(format!("{}: max retries exceeded", self.provider))
        }))
    }

    fn linear_backoff(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.settings.retry_base_delay_ms * (attempt as u64 + 1))
    }
}

/// Parse a `0x`-prefixed hex quantity
pub fn parse_hex_u128(value: &str) -> Result<u128, SourceError> {
    let digits = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .ok_or_else(|| SourceError::MalformedResponse(format!("expected hex quantity, got '{}'", value)))?;
    if digits.is_empty() {
        return Ok(0);
    }
    u128::from_str_radix(digits, 16)
        .map_err(|e| SourceError::MalformedResponse(format!("bad hex quantity '{}': {}", value, e)))
}

pub fn parse_hex_u64(value: &str) -> Result<u64, SourceError> {
    let wide = parse_hex_u128(value)?;
    u64::try_from(wide)
        .map_err(|_| SourceError::MalformedResponse(format!("hex quantity '{}' exceeds u64", value)))
}
