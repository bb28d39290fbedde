//! HTTP probes against the deployed service.
//!
//! Two concerns live here: the readiness poll that replaces the old
//! fixed-sleep wait (bounded attempts, exponential backoff, hard deadline),
//! and the smoke probes for the health and embedding routes. Response
//! structs only name the fields the orchestrator prints; everything else in
//! the payload is ignored.

use std::time::{Duration, Instant};

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::time::sleep;
use tracing::debug;

use crate::config::ReadinessConfig;
use crate::error::{DeployError, Result};

/// Per-request timeout for health checks. Kept short so a hung service
/// doesn't stall the poll loop.
const HEALTH_REQUEST_TIMEOUT: Duration = Duration::from_secs(3);

/// Per-request timeout for embedding calls. The first inference after a
/// cold start can be slow.
const EMBED_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Response body of `GET /health`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HealthReport {
    pub status: String,
    #[serde(default)]
    pub model: Option<String>,
}

/// Selected fields of the `POST /embed` response.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EmbedReport {
    pub dimensions: usize,
    pub model: String,
    pub processing_time: f64,
}

/// Selected fields of the `POST /embed/batch` response.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BatchReport {
    pub count: usize,
    pub dimensions: usize,
    pub model: String,
    pub processing_time: f64,
}

/// Outcome of a successful readiness wait.
#[derive(Debug, Clone, Serialize)]
pub struct ReadyReport {
    pub health: HealthReport,
    pub attempts: u32,
    pub waited_ms: u64,
}

/// HTTP client bound to the service's base URL.
#[derive(Debug, Clone)]
pub struct ServiceProbe {
    client: Client,
    base_url: String,
}

impl ServiceProbe {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn health_url(&self) -> String {
        format!("{}/health", self.base_url)
    }

    /// One-shot health check.
    pub async fn health(&self) -> Result<HealthReport> {
        let response = self
            .client
            .get(self.health_url())
            .timeout(HEALTH_REQUEST_TIMEOUT)
            .send()
            .await?
            .error_for_status()?;
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Poll the health endpoint until it answers or the deadline passes.
    ///
    /// The delay between attempts starts at `initial_delay_ms`, doubles
    /// after each failure, and is capped at `max_delay_ms`. Once the next
    /// sleep would cross `timeout_secs`, the poll gives up with a
    /// [`DeployError::ReadinessTimeout`].
    pub async fn wait_ready(&self, readiness: &ReadinessConfig) -> Result<ReadyReport> {
        let deadline = Duration::from_secs(readiness.timeout_secs);
        let max_delay = Duration::from_millis(readiness.max_delay_ms);
        let mut delay = Duration::from_millis(readiness.initial_delay_ms);
        let start = Instant::now();
        let mut attempts: u32 = 0;

        loop {
            attempts += 1;
            match self.health().await {
                Ok(health) => {
                    return Ok(ReadyReport {
                        health,
                        attempts,
                        waited_ms: start.elapsed().as_millis() as u64,
                    });
                }
                Err(e) => {
                    debug!("health attempt {} failed: {}", attempts, e);
                }
            }

            if start.elapsed() + delay >= deadline {
                return Err(DeployError::ReadinessTimeout {
                    url: self.health_url(),
                    attempts,
                    waited_secs: start.elapsed().as_secs(),
                });
            }

            sleep(delay).await;
            delay = next_delay(delay, max_delay);
        }
    }

    /// Smoke-test the single-text embedding route.
    pub async fn embed(&self, text: &str) -> Result<EmbedReport> {
        let response = self
            .client
            .post(format!("{}/embed", self.base_url))
            .timeout(EMBED_REQUEST_TIMEOUT)
            .json(&json!({ "text": text }))
            .send()
            .await?
            .error_for_status()?;
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Smoke-test the batch embedding route.
    pub async fn embed_batch(&self, texts: &[String]) -> Result<BatchReport> {
        let response = self
            .client
            .post(format!("{}/embed/batch", self.base_url))
            .timeout(EMBED_REQUEST_TIMEOUT)
            .json(&json!({ "texts": texts }))
            .send()
            .await?
            .error_for_status()?;
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

/// Next backoff delay: doubled, capped.
fn next_delay(current: Duration, max: Duration) -> Duration {
    (current * 2).min(max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn probe_for(server: &MockServer) -> ServiceProbe {
        ServiceProbe::new(server.base_url())
    }

    #[test]
    fn test_next_delay_doubles_until_capped() {
        let max = Duration::from_millis(5_000);
        let mut delay = Duration::from_millis(500);

        delay = next_delay(delay, max);
        assert_eq!(delay, Duration::from_millis(1_000));
        delay = next_delay(delay, max);
        assert_eq!(delay, Duration::from_millis(2_000));
        delay = next_delay(delay, max);
        assert_eq!(delay, Duration::from_millis(4_000));
        delay = next_delay(delay, max);
        assert_eq!(delay, Duration::from_millis(5_000));
        delay = next_delay(delay, max);
        assert_eq!(delay, Duration::from_millis(5_000));
    }

    #[tokio::test]
    async fn test_health_parses_status_and_model() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/health");
            then.status(200)
                .json_body(json!({ "status": "healthy", "model": "nomic-embed-text-v1" }));
        });

        let health = probe_for(&server).health().await.unwrap();
        assert_eq!(health.status, "healthy");
        assert_eq!(health.model.as_deref(), Some("nomic-embed-text-v1"));
    }

    #[tokio::test]
    async fn test_health_error_status_is_an_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/health");
            then.status(500)
                .json_body(json!({ "status": "error", "message": "Model not loaded" }));
        });

        assert!(probe_for(&server).health().await.is_err());
    }

    #[tokio::test]
    async fn test_wait_ready_returns_on_first_success() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/health");
            then.status(200).json_body(json!({ "status": "healthy" }));
        });

        let readiness = ReadinessConfig {
            timeout_secs: 5,
            initial_delay_ms: 50,
            max_delay_ms: 200,
        };
        let report = probe_for(&server).wait_ready(&readiness).await.unwrap();
        assert_eq!(report.attempts, 1);
        assert_eq!(report.health.status, "healthy");
    }

    #[tokio::test]
    async fn test_wait_ready_times_out_with_distinct_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/health");
            then.status(503);
        });

        let readiness = ReadinessConfig {
            timeout_secs: 1,
            initial_delay_ms: 100,
            max_delay_ms: 200,
        };
        let err = probe_for(&server).wait_ready(&readiness).await.unwrap_err();
        match err {
            DeployError::ReadinessTimeout { attempts, .. } => {
                assert!(attempts >= 2, "should have retried before giving up");
            }
            other => panic!("expected ReadinessTimeout, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_embed_parses_selected_fields() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST)
                .path("/embed")
                .json_body_partial(r#"{ "text": "hello" }"#);
            then.status(200).json_body(json!({
                "embedding": [0.1, 0.2, 0.3],
                "dimensions": 768,
                "model": "nomic-embed-text-v1",
                "processing_time": 0.042
            }));
        });

        let report = probe_for(&server).embed("hello").await.unwrap();
        assert_eq!(report.dimensions, 768);
        assert_eq!(report.model, "nomic-embed-text-v1");
        assert!(report.processing_time > 0.0);
    }

    #[tokio::test]
    async fn test_embed_batch_parses_selected_fields() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/embed/batch");
            then.status(200).json_body(json!({
                "embeddings": [[0.1], [0.2]],
                "count": 2,
                "dimensions": 768,
                "model": "nomic-embed-text-v1",
                "processing_time": 0.08
            }));
        });

        let texts = vec!["one".to_string(), "two".to_string()];
        let report = probe_for(&server).embed_batch(&texts).await.unwrap();
        assert_eq!(report.count, 2);
        assert_eq!(report.dimensions, 768);
    }
}
