//! ViaCEP postal-code lookup client.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::CalculatorConfig;
use crate::error::{ConfigError, LookupError};
use crate::form::AddressFields;

use super::AddressLookup;

/// Raw ViaCEP payload. Unknown codes come back as `{"erro": true}`
/// (older deployments send the string `"true"`).
#[derive(Debug, Deserialize)]
struct ViaCepResponse {
    #[serde(default)]
    logradouro: String,
    #[serde(default)]
    bairro: String,
    #[serde(default)]
    localidade: String,
    #[serde(default)]
    uf: String,
    #[serde(default)]
    erro: Option<serde_json::Value>,
}

impl ViaCepResponse {
    fn is_not_found(&self) -> bool {
        match &self.erro {
            Some(serde_json::Value::Bool(flag)) => *flag,
            Some(serde_json::Value::String(s)) => s == "true",
            _ => false,
        }
    }
}

/// HTTP client for `GET {base}/{cep}/json/`.
pub struct ViaCepClient {
    base_url: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl ViaCepClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ConfigError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
            client,
        })
    }

    pub fn from_config(config: &CalculatorConfig) -> Result<Self, ConfigError> {
        Self::new(config.cep_url.clone(), config.http_timeout)
    }

    fn url(&self, cep: &str) -> String {
        format!("{}/{cep}/json/", self.base_url)
    }
}

#[async_trait]
impl AddressLookup for ViaCepClient {
    async fn lookup(&self, cep: &str) -> Result<AddressFields, LookupError> {
        if cep.len() != 8 || !cep.chars().all(|c| c.is_ascii_digit()) {
            return Err(LookupError::InvalidCep { cep: cep.into() });
        }

        let resp = self.client.get(self.url(cep)).send().await.map_err(|e| {
            if e.is_timeout() {
                LookupError::Timeout {
                    cep: cep.into(),
                    timeout: self.timeout,
                }
            } else {
                LookupError::RequestFailed {
                    cep: cep.into(),
                    reason: e.to_string(),
                }
            }
        })?;

        let status = resp.status();
        if status == reqwest::StatusCode::NOT_FOUND || status == reqwest::StatusCode::BAD_REQUEST {
            return Err(LookupError::NotFound { cep: cep.into() });
        }
        if !status.is_success() {
            return Err(LookupError::RequestFailed {
                cep: cep.into(),
                reason: format!("HTTP {status}"),
            });
        }

        let body: ViaCepResponse = resp.json().await.map_err(|e| LookupError::InvalidResponse {
            cep: cep.into(),
            reason: e.to_string(),
        })?;

        if body.is_not_found() {
            return Err(LookupError::NotFound { cep: cep.into() });
        }

        tracing::debug!(cep, city = %body.localidade, uf = %body.uf, "Postal code resolved");

        Ok(AddressFields {
            street: body.logradouro,
            neighborhood: body.bairro,
            city: body.localidade,
            state: body.uf,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_viacep_url() {
        let client = ViaCepClient::new("https://viacep.com.br/ws/", Duration::from_secs(1)).unwrap();
        assert_eq!(client.url("01001000"), "https://viacep.com.br/ws/01001000/json/");
    }

    #[test]
    fn not_found_flag_variants() {
        let flagged: ViaCepResponse = serde_json::from_str(r#"{"erro": true}"#).unwrap();
        let legacy: ViaCepResponse = serde_json::from_str(r#"{"erro": "true"}"#).unwrap();
        let found: ViaCepResponse =
            serde_json::from_str(r#"{"logradouro": "Praça da Sé", "uf": "SP"}"#).unwrap();
        assert!(flagged.is_not_found());
        assert!(legacy.is_not_found());
        assert!(!found.is_not_found());
    }

    #[tokio::test]
    async fn rejects_malformed_cep_without_a_request() {
        let client = ViaCepClient::new("http://127.0.0.1:9", Duration::from_secs(1)).unwrap();
        let err = client.lookup("1234").await.unwrap_err();
        assert!(matches!(err, LookupError::InvalidCep { .. }));
    }
}
