//! Session-scoped wrapper around the external collaborators.
//!
//! Adds the guarantees the raw clients do not give: one lookup per distinct
//! postal code, last-request-wins ordering for lookups, and a per-session
//! cache of the duplicate e-mail verdict.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::{BackendError, LookupError};
use crate::form::AddressFields;
use crate::form::values::digits_only;
use crate::lead::{LeadId, LeadRecord, RecommendationResult};

use super::{AddressLookup, LeadBackend};

/// Identifies one issued lookup. Only the ticket of the latest request may
/// apply its result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupTicket {
    pub cep: String,
    generation: u64,
}

/// Outcome of `resolve_address`.
#[derive(Debug)]
pub enum AddressResolution {
    /// Not an 8-digit postal code; no request was made.
    Skipped,
    /// This postal code was already requested; no new request was made.
    AlreadyRequested,
    Resolved {
        ticket: LookupTicket,
        address: AddressFields,
    },
    Failed {
        ticket: LookupTicket,
        error: LookupError,
    },
}

#[derive(Debug, Default)]
struct CepState {
    last_requested: Option<String>,
    generation: u64,
}

#[derive(Debug, Clone)]
struct EmailVerdict {
    email: String,
    exists: bool,
}

pub struct LeadGateway {
    lookup: Arc<dyn AddressLookup>,
    backend: Arc<dyn LeadBackend>,
    cep: Mutex<CepState>,
    email_check: Mutex<Option<EmailVerdict>>,
}

impl LeadGateway {
    pub fn new(lookup: Arc<dyn AddressLookup>, backend: Arc<dyn LeadBackend>) -> Self {
        Self {
            lookup,
            backend,
            cep: Mutex::new(CepState::default()),
            email_check: Mutex::new(None),
        }
    }

    /// Resolve a postal code (masked or not) into address fields.
    ///
    /// Only 8-digit codes are looked up, and each distinct code only once in
    /// a row. Failures are logged and returned, never raised.
    pub async fn resolve_address(&self, cep: &str) -> AddressResolution {
        let digits = digits_only(cep);
        if digits.len() != 8 {
            return AddressResolution::Skipped;
        }

        let ticket = {
            let mut state = self.cep.lock().await;
            if state.last_requested.as_deref() == Some(digits.as_str()) {
                debug!(cep = %digits, "Postal code already requested, skipping lookup");
                return AddressResolution::AlreadyRequested;
            }
            state.last_requested = Some(digits.clone());
            state.generation += 1;
            LookupTicket {
                cep: digits,
                generation: state.generation,
            }
        };

        match self.lookup.lookup(&ticket.cep).await {
            Ok(address) => AddressResolution::Resolved { ticket, address },
            Err(error) => {
                warn!(cep = %ticket.cep, error = %error, "Postal code lookup failed");
                AddressResolution::Failed { ticket, error }
            }
        }
    }

    /// Whether `ticket` belongs to the most recent lookup.
    pub async fn is_current(&self, ticket: &LookupTicket) -> bool {
        self.cep.lock().await.generation == ticket.generation
    }

    /// Ask the backend whether `email` already has a report.
    ///
    /// The verdict for the last checked address is cached for the session,
    /// so an unchanged e-mail never hits the backend twice. Concurrent
    /// checks are serialized behind the cache.
    pub async fn check_duplicate(&self, email: &str) -> Result<bool, BackendError> {
        let email = email.trim();
        let key = email.to_lowercase();

        let mut cached = self.email_check.lock().await;
        if let Some(verdict) = cached.as_ref().filter(|v| v.email == key) {
            debug!(email = %email, exists = verdict.exists, "Duplicate check served from cache");
            return Ok(verdict.exists);
        }

        let exists = self.backend.email_exists(email).await.inspect_err(|e| {
            warn!(email = %email, error = %e, "Duplicate check failed");
        })?;

        info!(email = %email, exists, "Duplicate check completed");
        *cached = Some(EmailVerdict { email: key, exists });
        Ok(exists)
    }

    /// Post the frozen lead.
    pub async fn submit(&self, record: &LeadRecord) -> Result<LeadId, BackendError> {
        info!(email = %record.hospital_email, hospital = %record.hospital_name, "Submitting lead");
        let id = self.backend.create_lead(record).await?;
        info!(lead_id = %id, "Lead created");
        Ok(id)
    }

    pub async fn fetch_recommendations(
        &self,
        id: &LeadId,
    ) -> Result<RecommendationResult, BackendError> {
        let result = self.backend.recommendations(id).await?;
        info!(
            lead_id = %id,
            autoclaves = result.autoclave_recommendations.len(),
            washers = result.washer_recommendations.len(),
            "Recommendations fetched"
        );
        Ok(result)
    }

    /// Forget session caches. In-flight lookups from before the reset can
    /// no longer apply.
    pub async fn reset(&self) {
        {
            let mut state = self.cep.lock().await;
            state.last_requested = None;
            state.generation += 1;
        }
        *self.email_check.lock().await = None;
    }
}
