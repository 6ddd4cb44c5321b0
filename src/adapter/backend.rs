//! HTTP client for the lead intake backend.

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::CalculatorConfig;
use crate::error::{BackendError, ConfigError};
use crate::lead::{LeadId, LeadRecord, RecommendationResult};

use super::LeadBackend;

#[derive(Debug, Deserialize)]
struct FormCheckResponse {
    exists: bool,
}

#[derive(Debug, Deserialize)]
struct CreatedLead {
    id: LeadId,
}

#[derive(Debug, Deserialize)]
struct CreateLeadResponse {
    lead: CreatedLead,
}

/// Talks to `/lead`, `/lead/formcheck` and `/lead/{id}`.
pub struct LeadApiClient {
    base_url: String,
    client: reqwest::Client,
}

impl LeadApiClient {
    pub fn new(
        base_url: impl Into<String>,
        timeout: std::time::Duration,
    ) -> Result<Self, ConfigError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn from_config(config: &CalculatorConfig) -> Result<Self, ConfigError> {
        Self::new(config.backend_url.clone(), config.http_timeout)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

#[async_trait]
impl LeadBackend for LeadApiClient {
    async fn email_exists(&self, email: &str) -> Result<bool, BackendError> {
        let resp = self
            .client
            .post(self.url("/lead/formcheck"))
            .json(&serde_json::json!({ "hospitalEmail": email }))
            .send()
            .await
            .map_err(|e| BackendError::DuplicateCheck {
                reason: e.to_string(),
            })?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(BackendError::DuplicateCheck {
                reason: format!("HTTP {status}: {body}"),
            });
        }

        let body: FormCheckResponse = resp.json().await.map_err(|e| BackendError::InvalidResponse {
            endpoint: "/lead/formcheck".into(),
            reason: e.to_string(),
        })?;
        Ok(body.exists)
    }

    async fn create_lead(&self, lead: &LeadRecord) -> Result<LeadId, BackendError> {
        let resp = self
            .client
            .post(self.url("/lead"))
            .json(lead)
            .send()
            .await
            .map_err(|e| BackendError::Submission {
                reason: e.to_string(),
                status: None,
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            tracing::warn!(status = %status, body = %body, "Lead submission rejected");
            return Err(BackendError::Submission {
                reason: format!("HTTP {status}"),
                status: Some(status.as_u16()),
            });
        }

        let body: CreateLeadResponse = resp.json().await.map_err(|e| BackendError::Submission {
            reason: format!("unreadable response: {e}"),
            status: Some(status.as_u16()),
        })?;
        Ok(body.lead.id)
    }

    async fn recommendations(&self, id: &LeadId) -> Result<RecommendationResult, BackendError> {
        let resp = self
            .client
            .get(self.url(&format!("/lead/{id}")))
            .send()
            .await
            .map_err(|e| BackendError::RecommendationFetch {
                lead_id: id.to_string(),
                reason: e.to_string(),
            })?;

        if !resp.status().is_success() {
            return Err(BackendError::RecommendationFetch {
                lead_id: id.to_string(),
                reason: format!("HTTP {}", resp.status()),
            });
        }

        resp.json()
            .await
            .map_err(|e| BackendError::RecommendationFetch {
                lead_id: id.to_string(),
                reason: format!("unreadable response: {e}"),
            })
    }
}
