//! Session store: one wizard per visitor, keyed by a random id.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use crate::adapter::{AddressLookup, LeadApiClient, LeadBackend, ViaCepClient};
use crate::config::CalculatorConfig;
use crate::form::FormSchema;

use super::controller::WizardController;

struct SessionEntry {
    controller: Arc<WizardController>,
    last_seen: Instant,
}

/// Live wizard sessions. The adapters are shared; every session gets its
/// own controller, form record and gateway caches.
pub struct SessionStore {
    schema: Arc<FormSchema>,
    lookup: Arc<dyn AddressLookup>,
    backend: Arc<dyn LeadBackend>,
    contact_url: String,
    idle: Duration,
    sessions: RwLock<HashMap<Uuid, SessionEntry>>,
}

impl SessionStore {
    pub fn new(
        schema: Arc<FormSchema>,
        lookup: Arc<dyn AddressLookup>,
        backend: Arc<dyn LeadBackend>,
        contact_url: impl Into<String>,
        idle: Duration,
    ) -> Arc<Self> {
        Arc::new(Self {
            schema,
            lookup,
            backend,
            contact_url: contact_url.into(),
            idle,
            sessions: RwLock::new(HashMap::new()),
        })
    }

    /// Store for the CME questionnaire wired to the real HTTP clients.
    pub fn from_config(config: &CalculatorConfig) -> crate::Result<Arc<Self>> {
        let lookup = Arc::new(ViaCepClient::from_config(config)?);
        let backend = Arc::new(LeadApiClient::from_config(config)?);
        Ok(Self::new(
            Arc::new(FormSchema::cme()),
            lookup,
            backend,
            config.contact_url.clone(),
            config.session_idle,
        ))
    }

    /// Open a fresh session.
    pub async fn create(&self) -> (Uuid, Arc<WizardController>) {
        let id = Uuid::new_v4();
        let controller = Arc::new(WizardController::new(
            Arc::clone(&self.schema),
            Arc::clone(&self.lookup),
            Arc::clone(&self.backend),
            self.contact_url.clone(),
        ));
        let mut sessions = self.sessions.write().await;
        sessions.insert(
            id,
            SessionEntry {
                controller: Arc::clone(&controller),
                last_seen: Instant::now(),
            },
        );
        info!(session_id = %id, live = sessions.len(), "Wizard session opened");
        (id, controller)
    }

    /// The session's controller, marking it as active.
    pub async fn get(&self, id: Uuid) -> Option<Arc<WizardController>> {
        let mut sessions = self.sessions.write().await;
        let entry = sessions.get_mut(&id)?;
        entry.last_seen = Instant::now();
        Some(Arc::clone(&entry.controller))
    }

    pub async fn remove(&self, id: Uuid) -> bool {
        let removed = self.sessions.write().await.remove(&id).is_some();
        if removed {
            info!(session_id = %id, "Wizard session closed");
        }
        removed
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Drop sessions idle for at least the configured duration. Returns how
    /// many were dropped.
    pub async fn expire_idle(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|id, entry| {
            let keep = entry.last_seen.elapsed() < self.idle;
            if !keep {
                debug!(session_id = %id, "Wizard session expired");
            }
            keep
        });
        before - sessions.len()
    }
}

/// Spawn a background task that expires idle sessions every 60 seconds.
pub fn spawn_expiry_task(store: Arc<SessionStore>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(60));
        loop {
            interval.tick().await;
            let expired = store.expire_idle().await;
            if expired > 0 {
                info!(expired, "Expired idle wizard sessions");
            }
        }
    })
}
