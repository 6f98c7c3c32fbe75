//! Outbound job queue client.
//!
//! # Responsibility
//! - POST batches of jobs to the configured queue endpoint.
//! - Probe endpoint reachability with a HEAD request.
//!
//! # Invariants
//! - `enqueue` fails with `NotConfigured` before any network I/O when the
//!   endpoint is missing.
//! - Non-2xx responses become `Queue error <status>: <body>`.
//! - No retries; overlapping calls are independent (last response wins).

use crate::config::QueueConfig;
use crate::gateway::{GatewayError, GatewayResult};
use crate::util::generate_id;
use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use uuid::Uuid;

const GATEWAY: &str = "queue";

/// One job accepted by the queue endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueJob {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub job_type: String,
    pub payload: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl QueueJob {
    pub fn new(
        job_type: impl Into<String>,
        payload: serde_json::Value,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: generate_id(),
            job_type: job_type.into(),
            payload,
            created_at: now,
        }
    }
}

/// Outcome of a reachability probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectivityStatus {
    pub ok: bool,
    /// HTTP status, or `0` when no response was received.
    pub status: u16,
    pub status_text: String,
}

pub struct QueueClient {
    config: QueueConfig,
    http: reqwest::Client,
}

impl QueueClient {
    pub fn new(config: QueueConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .unwrap_or_else(|err| {
                warn!("event=queue_client_build module=queue status=error error={err}");
                reqwest::Client::new()
            });
        Self { config, http }
    }

    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    /// Sends `jobs` as one JSON array.
    pub async fn enqueue(&self, jobs: &[QueueJob]) -> GatewayResult<()> {
        let endpoint = self.endpoint()?;
        let started_at = Instant::now();

        let mut request = self.http.post(endpoint).json(jobs);
        if let Some(token) = self.config.token.as_deref() {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|source| GatewayError::Transport {
                gateway: GATEWAY,
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(
                "event=queue_enqueue module=queue status=error http_status={} jobs={} duration_ms={}",
                status.as_u16(),
                jobs.len(),
                started_at.elapsed().as_millis()
            );
            return Err(GatewayError::Queue {
                status: status.as_u16(),
                body,
            });
        }

        info!(
            "event=queue_enqueue module=queue status=ok jobs={} duration_ms={}",
            jobs.len(),
            started_at.elapsed().as_millis()
        );
        Ok(())
    }

    /// HEAD probe against the endpoint. Never fails.
    pub async fn check_connectivity(&self) -> ConnectivityStatus {
        let endpoint = match self.endpoint() {
            Ok(endpoint) => endpoint,
            Err(err) => {
                return ConnectivityStatus {
                    ok: false,
                    status: 0,
                    status_text: err.to_string(),
                }
            }
        };

        let mut request = self.http.head(endpoint);
        if let Some(token) = self.config.token.as_deref() {
            request = request.bearer_auth(token);
        }

        match request.send().await {
            Ok(response) => {
                let status = response.status();
                ConnectivityStatus {
                    ok: status.is_success(),
                    status: status.as_u16(),
                    status_text: status.canonical_reason().unwrap_or_default().to_string(),
                }
            }
            Err(err) => {
                warn!("event=queue_head module=queue status=error error={err}");
                ConnectivityStatus {
                    ok: false,
                    status: 0,
                    status_text: err.to_string(),
                }
            }
        }
    }

    fn endpoint(&self) -> GatewayResult<&str> {
        self.config
            .endpoint
            .as_deref()
            .map(str::trim)
            .filter(|endpoint| !endpoint.is_empty())
            .ok_or(GatewayError::NotConfigured)
    }
}
