//! Client for the proposals REST API.

use crate::config::ApiConfig;
use crate::engine::status::ProposalStatus;
use crate::engine::urgency::{self, UrgencyTier};
use crate::gateway::{GatewayError, GatewayResult};
use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

const GATEWAY: &str = "proposals_api";

/// Proposal as served by `/api/proposals`.
///
/// `status` stays a raw label since the API is not bound to the lifecycle
/// vocabulary; use [`ProposalSummary::lifecycle_status`] to interpret it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalSummary {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub agency: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
}

impl ProposalSummary {
    pub fn lifecycle_status(&self) -> Option<ProposalStatus> {
        ProposalStatus::parse(&self.status)
    }

    pub fn urgency(&self, now: DateTime<Utc>) -> UrgencyTier {
        urgency::classify(self.due_date, now)
    }
}

pub struct ProposalsApi {
    base_url: String,
    http: reqwest::Client,
}

impl ProposalsApi {
    pub fn new(config: &ApiConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .unwrap_or_else(|err| {
                warn!("event=api_client_build module=api status=error error={err}");
                reqwest::Client::new()
            });
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http,
        }
    }

    /// `GET /api/proposals`.
    pub async fn list_proposals(&self) -> GatewayResult<Vec<ProposalSummary>> {
        self.get_json("/api/proposals", "proposals").await
    }

    /// `GET /api/proposals/:id`.
    pub async fn get_proposal(&self, id: &str) -> GatewayResult<ProposalSummary> {
        self.get_json(&format!("/api/proposals/{}", id.trim()), "proposal")
            .await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, resource: &str) -> GatewayResult<T> {
        let transport = |source| GatewayError::Transport {
            gateway: GATEWAY,
            source,
        };

        let response = self
            .http
            .get(format!("{}{path}", self.base_url))
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        if !status.is_success() {
            warn!(
                "event=api_get module=api status=error path={path} http_status={}",
                status.as_u16()
            );
            return Err(GatewayError::LoadFailed {
                resource: resource.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.json::<T>().await.map_err(transport)?;
        info!("event=api_get module=api status=ok path={path}");
        Ok(body)
    }
}
