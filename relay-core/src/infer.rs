use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::{error, info, warn};

use crate::{Config, Error};

/// Retry settings for the inference transport.
///
/// Only gateway statuses are retried, at the transport level; a response
/// that arrived intact is never re-posted.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff_factor: Duration,
    pub retry_on: Vec<StatusCode>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 10,
            backoff_factor: Duration::from_millis(100),
            retry_on: vec![
                StatusCode::BAD_GATEWAY,
                StatusCode::SERVICE_UNAVAILABLE,
                StatusCode::GATEWAY_TIMEOUT,
            ],
        }
    }
}

impl RetryPolicy {
    fn should_retry(&self, status: StatusCode) -> bool {
        self.retry_on.contains(&status)
    }

    /// Delay before retry number `attempt` (1-based), doubling each time.
    fn delay(&self, attempt: u32) -> Duration {
        self.backoff_factor * 2u32.saturating_pow(attempt.saturating_sub(1))
    }
}

/// Client for the WebUI's synchronous txt2img endpoint.
///
/// Wraps the process-wide pooled `reqwest::Client`, so connections are
/// reused across jobs.
#[derive(Debug, Clone)]
pub struct InferenceClient {
    client: Client,
    base_url: String,
    timeout: Duration,
    retry: RetryPolicy,
}

impl InferenceClient {
    pub fn new(client: Client, config: &Config) -> Self {
        Self {
            client,
            base_url: config.api_base.trim_end_matches('/').to_string(),
            timeout: config.request_timeout,
            retry: config.retry.clone(),
        }
    }

    /// POST `payload` to the txt2img endpoint and return the decoded JSON
    /// body verbatim.
    pub async fn txt2img(&self, payload: &Value) -> Result<Value, Error> {
        match self.post_json("/txt2img", payload).await {
            Ok(body) => {
                info!("inference completed");
                Ok(body)
            }
            Err(e) => {
                error!(error = %e, "inference failed");
                Err(e)
            }
        }
    }

    async fn post_json(&self, path: &str, payload: &Value) -> Result<Value, Error> {
        let url = format!("{}{}", self.base_url, path);
        let mut attempt = 0u32;
        loop {
            let response = self
                .client
                .post(&url)
                .json(payload)
                .timeout(self.timeout)
                .send()
                .await?;

            let status = response.status();
            if self.retry.should_retry(status) {
                if attempt >= self.retry.max_retries {
                    return Err(Error::RetriesExhausted {
                        attempts: attempt + 1,
                        status,
                    });
                }
                attempt += 1;
                let delay = self.retry.delay(attempt);
                warn!(%status, attempt, ?delay, "transient upstream error, retrying");
                tokio::time::sleep(delay).await;
                continue;
            }

            // Whatever the endpoint answered with is the job result, error
            // statuses included; only a body that fails to decode raises.
            let body = response.text().await?;
            return Ok(serde_json::from_str(&body)?);
        }
    }
}
