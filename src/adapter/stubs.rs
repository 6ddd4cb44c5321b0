//! In-process collaborators for unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::error::{BackendError, LookupError};
use crate::form::AddressFields;
use crate::lead::{EquipmentRecommendation, LeadId, LeadRecord, RecommendationResult};

use super::{AddressLookup, LeadBackend};

/// Answers every postal code with an address derived from it. Codes can be
/// marked as failing, or held until the test releases them.
pub(crate) struct StubLookup {
    calls: AtomicUsize,
    failing: Mutex<HashSet<String>>,
    held: Mutex<HashMap<String, std::sync::Arc<Notify>>>,
}

impl StubLookup {
    pub(crate) fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            failing: Mutex::new(HashSet::new()),
            held: Mutex::new(HashMap::new()),
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn fail(&self, cep: &str) {
        self.failing.lock().unwrap().insert(cep.into());
    }

    /// Block lookups of `cep` until the returned handle is notified.
    pub(crate) fn hold(&self, cep: &str) -> std::sync::Arc<Notify> {
        let notify = std::sync::Arc::new(Notify::new());
        self.held.lock().unwrap().insert(cep.into(), notify.clone());
        notify
    }

    pub(crate) fn address_for(cep: &str) -> AddressFields {
        AddressFields {
            street: format!("Rua {cep}"),
            neighborhood: format!("Bairro {cep}"),
            city: format!("Cidade {cep}"),
            state: "PR".into(),
        }
    }
}

#[async_trait]
impl AddressLookup for StubLookup {
    async fn lookup(&self, cep: &str) -> Result<AddressFields, LookupError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let held = self.held.lock().unwrap().get(cep).cloned();
        if let Some(notify) = held {
            notify.notified().await;
        }
        if self.failing.lock().unwrap().contains(cep) {
            return Err(LookupError::NotFound { cep: cep.into() });
        }
        Ok(Self::address_for(cep))
    }
}

/// Scriptable lead backend with call counters.
pub(crate) struct StubBackend {
    pub(crate) exists: AtomicBool,
    pub(crate) fail_check: AtomicBool,
    pub(crate) fail_submit: AtomicBool,
    pub(crate) fail_fetch: AtomicBool,
    pub(crate) check_calls: AtomicUsize,
    pub(crate) submit_calls: AtomicUsize,
    pub(crate) fetch_calls: AtomicUsize,
    pub(crate) submit_delay: Mutex<Option<Duration>>,
    check_hold: Mutex<Option<std::sync::Arc<Notify>>>,
    pub(crate) submitted: Mutex<Vec<LeadRecord>>,
    pub(crate) fetched: Mutex<Vec<LeadId>>,
}

impl StubBackend {
    pub(crate) fn new() -> Self {
        Self {
            exists: AtomicBool::new(false),
            fail_check: AtomicBool::new(false),
            fail_submit: AtomicBool::new(false),
            fail_fetch: AtomicBool::new(false),
            check_calls: AtomicUsize::new(0),
            submit_calls: AtomicUsize::new(0),
            fetch_calls: AtomicUsize::new(0),
            submit_delay: Mutex::new(None),
            check_hold: Mutex::new(None),
            submitted: Mutex::new(Vec::new()),
            fetched: Mutex::new(Vec::new()),
        }
    }

    /// Block duplicate checks until the returned handle is notified.
    pub(crate) fn hold_checks(&self) -> std::sync::Arc<Notify> {
        let notify = std::sync::Arc::new(Notify::new());
        *self.check_hold.lock().unwrap() = Some(notify.clone());
        notify
    }

    pub(crate) fn sample_result() -> RecommendationResult {
        RecommendationResult {
            autoclave_recommendations: vec![EquipmentRecommendation {
                brand: "Baumer".into(),
                models: vec!["HI VAC 360".into()],
                price: "R$ 250.000 - R$ 310.000".into(),
            }],
            washer_recommendations: vec![EquipmentRecommendation {
                brand: "Steelco".into(),
                models: vec!["DS 610".into(), "DS 1000".into()],
                price: "R$ 180.000".into(),
            }],
        }
    }
}

#[async_trait]
impl LeadBackend for StubBackend {
    async fn email_exists(&self, _email: &str) -> Result<bool, BackendError> {
        self.check_calls.fetch_add(1, Ordering::SeqCst);
        let held = self.check_hold.lock().unwrap().take();
        if let Some(notify) = held {
            notify.notified().await;
        }
        if self.fail_check.load(Ordering::SeqCst) {
            return Err(BackendError::DuplicateCheck {
                reason: "connection refused".into(),
            });
        }
        Ok(self.exists.load(Ordering::SeqCst))
    }

    async fn create_lead(&self, lead: &LeadRecord) -> Result<LeadId, BackendError> {
        let n = self.submit_calls.fetch_add(1, Ordering::SeqCst) + 1;
        let delay = *self.submit_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_submit.load(Ordering::SeqCst) {
            return Err(BackendError::Submission {
                reason: "HTTP 503 Service Unavailable".into(),
                status: Some(503),
            });
        }
        self.submitted.lock().unwrap().push(lead.clone());
        Ok(LeadId(format!("lead-{n}")))
    }

    async fn recommendations(&self, id: &LeadId) -> Result<RecommendationResult, BackendError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        self.fetched.lock().unwrap().push(id.clone());
        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(BackendError::RecommendationFetch {
                lead_id: id.to_string(),
                reason: "HTTP 500 Internal Server Error".into(),
            });
        }
        Ok(Self::sample_result())
    }
}
