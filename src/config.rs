//! Configuration types.

use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;

/// Default lead backend base URL.
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";
/// Default postal-code lookup base URL (ViaCEP).
pub const DEFAULT_CEP_URL: &str = "https://viacep.com.br/ws";
/// Default external contact channel offered on a duplicate e-mail.
pub const DEFAULT_CONTACT_URL: &str = "https://wa.me/5511999999999";

/// Calculator configuration.
#[derive(Debug, Clone)]
pub struct CalculatorConfig {
    /// Base URL of the lead intake backend (`/lead`, `/lead/formcheck`).
    pub backend_url: String,
    /// Base URL of the postal-code lookup service.
    pub cep_url: String,
    /// Timeout applied to every outbound HTTP request.
    pub http_timeout: Duration,
    /// Link shown when an e-mail already has a report ("request a new one").
    pub contact_url: String,
    /// Port the wizard HTTP API listens on.
    pub bind_port: u16,
    /// Origin allowed by CORS. `None` allows any origin.
    pub allowed_origin: Option<String>,
    /// Sessions untouched for this long are dropped.
    pub session_idle: Duration,
}

impl Default for CalculatorConfig {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            cep_url: DEFAULT_CEP_URL.to_string(),
            http_timeout: Duration::from_secs(10),
            contact_url: DEFAULT_CONTACT_URL.to_string(),
            bind_port: 8080,
            allowed_origin: None,
            session_idle: Duration::from_secs(30 * 60),
        }
    }
}

impl CalculatorConfig {
    /// Build configuration from `CME_*` environment variables, falling back
    /// to defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let backend_url = var("CME_BACKEND_URL")
            .map(|s| s.trim_end_matches('/').to_string())
            .unwrap_or(defaults.backend_url);

        let cep_url = var("CME_CEP_URL")
            .map(|s| s.trim_end_matches('/').to_string())
            .unwrap_or(defaults.cep_url);

        let http_timeout = parse_or("CME_HTTP_TIMEOUT_SECS", var("CME_HTTP_TIMEOUT_SECS"), 10u64)
            .max(1);

        let contact_url = var("CME_CONTACT_URL").unwrap_or(defaults.contact_url);

        let bind_port = parse_or("CME_BIND_PORT", var("CME_BIND_PORT"), defaults.bind_port);

        let allowed_origin = var("CME_ALLOWED_ORIGIN")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty() && s != "*");

        let session_idle = parse_or(
            "CME_SESSION_IDLE_SECS",
            var("CME_SESSION_IDLE_SECS"),
            defaults.session_idle.as_secs(),
        );

        Self {
            backend_url,
            cep_url,
            http_timeout: Duration::from_secs(http_timeout),
            contact_url,
            bind_port,
            allowed_origin,
            session_idle: Duration::from_secs(session_idle),
        }
    }
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        key: key.to_string(),
        message: format!("{raw:?}: {e}"),
    })
}

fn parse_or<T>(key: &str, raw: Option<String>, default: T) -> T
where
    T: FromStr,
    T::Err: Display,
{
    match raw.as_deref().map(|s| parse_value(key, s)) {
        Some(Ok(value)) => value,
        Some(Err(e)) => {
            tracing::warn!(error = %e, "Using default");
            default
        }
        None => default,
    }
}
