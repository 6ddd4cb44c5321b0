//! WizardController: coordinates the form session, step transitions, the
//! duplicate e-mail gate, and the final submission.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::adapter::{AddressLookup, AddressResolution, LeadBackend, LeadGateway};
use crate::error::{ValidationError, WizardError};
use crate::form::{FieldId, FieldUpdate, FormSchema, FormSession, FormValues, Weekday};
use crate::lead::{LeadId, LeadRecord, RecommendationResult};

use super::phase::WizardPhase;

/// Blocking prompt shown when the e-mail already has a report on file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateConflict {
    pub email: String,
    /// External channel for requesting a new recommendation.
    pub contact_url: String,
}

/// Snapshot of the wizard for rendering.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WizardStatus {
    #[serde(flatten)]
    pub phase: WizardPhase,
    pub step_label: String,
    pub progress: f64,
    pub total_steps: usize,
    pub values: FormValues,
    pub surgery_days: Vec<&'static str>,
    pub errors: Vec<ValidationError>,
    pub submitting: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conflict: Option<DuplicateConflict>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submission_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lead_id: Option<LeadId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendations: Option<RecommendationResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendation_error: Option<String>,
}

/// Everything one session owns.
#[derive(Debug)]
struct WizardState {
    /// Bumped by `reset`; pending actions from an older session are dropped.
    generation: u64,
    phase: WizardPhase,
    session: FormSession,
    conflict: Option<DuplicateConflict>,
    submission_error: Option<String>,
    lead_id: Option<LeadId>,
    recommendations: Option<RecommendationResult>,
    recommendation_error: Option<String>,
}

impl WizardState {
    fn new(schema: Arc<FormSchema>, generation: u64) -> Self {
        Self {
            generation,
            phase: WizardPhase::default(),
            session: FormSession::new(schema),
            conflict: None,
            submission_error: None,
            lead_id: None,
            recommendations: None,
            recommendation_error: None,
        }
    }
}

/// Clears the in-flight flag when the submission attempt ends.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Drives one questionnaire session.
///
/// Shared between request handlers behind an `Arc`; the session state sits
/// behind a lock that is never held across a network call.
pub struct WizardController {
    schema: Arc<FormSchema>,
    gateway: LeadGateway,
    contact_url: String,
    state: RwLock<WizardState>,
    submitting: AtomicBool,
}

impl WizardController {
    pub fn new(
        schema: Arc<FormSchema>,
        lookup: Arc<dyn AddressLookup>,
        backend: Arc<dyn LeadBackend>,
        contact_url: impl Into<String>,
    ) -> Self {
        Self {
            state: RwLock::new(WizardState::new(Arc::clone(&schema), 0)),
            schema,
            gateway: LeadGateway::new(lookup, backend),
            contact_url: contact_url.into(),
            submitting: AtomicBool::new(false),
        }
    }

    pub fn schema(&self) -> &FormSchema {
        &self.schema
    }

    pub async fn phase(&self) -> WizardPhase {
        self.state.read().await.phase
    }

    /// Write a field, validate live, and resolve the address when the postal
    /// code becomes complete.
    pub async fn set_field(&self, field: FieldId, value: &str) -> Result<FieldUpdate, WizardError> {
        let update = {
            let mut state = self.state.write().await;
            if state.phase.is_terminal() {
                return Err(WizardError::AlreadySubmitted);
            }
            let update = state.session.set_field(field, value);
            if field == FieldId::HospitalEmail && update.changed {
                state.conflict = None;
            }
            update
        };

        if let Some(cep) = &update.resolve_cep {
            self.resolve_address(cep).await;
        }
        Ok(update)
    }

    /// Look up `cep` and fill the address fields. Returns whether the result
    /// was applied: failures, repeats, and results overtaken by a newer
    /// postal code are dropped.
    pub async fn resolve_address(&self, cep: &str) -> bool {
        let AddressResolution::Resolved { ticket, address } =
            self.gateway.resolve_address(cep).await
        else {
            return false;
        };

        let mut state = self.state.write().await;
        if !self.gateway.is_current(&ticket).await
            || state.session.values().digits(FieldId::Cep) != ticket.cep
            || state.phase.is_terminal()
        {
            debug!(cep = %ticket.cep, "Discarding superseded address lookup");
            return false;
        }

        state.session.apply_address(&address);
        info!(cep = %ticket.cep, city = %address.city, "Address filled from postal code");
        true
    }

    pub async fn toggle_day(&self, day: Weekday) -> Result<(), WizardError> {
        let mut state = self.state.write().await;
        if state.phase.is_terminal() {
            return Err(WizardError::AlreadySubmitted);
        }
        state.session.toggle_day(day);
        Ok(())
    }

    pub async fn toggle_all_days(&self) -> Result<(), WizardError> {
        let mut state = self.state.write().await;
        if state.phase.is_terminal() {
            return Err(WizardError::AlreadySubmitted);
        }
        state.session.toggle_all_days();
        Ok(())
    }

    pub async fn set_consent(&self, accepted: bool) -> Result<(), WizardError> {
        let mut state = self.state.write().await;
        if state.phase.is_terminal() {
            return Err(WizardError::AlreadySubmitted);
        }
        state.session.set_consent(accepted);
        Ok(())
    }

    /// Close the duplicate e-mail prompt without contacting anyone.
    pub async fn dismiss_conflict(&self) {
        self.state.write().await.conflict = None;
    }

    /// Step back one page. No validation; no-op on the first step and after
    /// submission.
    pub async fn go_back(&self) -> WizardPhase {
        let mut state = self.state.write().await;
        if let Some(previous) = state.phase.previous() {
            if state.phase.can_transition_to(previous, self.schema.total_steps()) {
                debug!(from = %state.phase, to = %previous, "Wizard step back");
                state.phase = previous;
            }
        }
        state.phase
    }

    /// Advance one step.
    ///
    /// The current step must validate. Leaving the e-mail step, and
    /// submitting from the last step, additionally require the duplicate
    /// gate to pass. From the last step this submits the lead and fetches
    /// its recommendations.
    pub async fn go_next(&self) -> Result<WizardPhase, WizardError> {
        let (generation, step, email, record) = {
            let mut state = self.state.write().await;
            let Some(step) = state.phase.step() else {
                return Err(WizardError::AlreadySubmitted);
            };

            let errors = state.session.check_step(step);
            if !errors.is_empty() {
                debug!(step, invalid = errors.len(), "Step advance blocked by validation");
                return Err(WizardError::Invalid { step, errors });
            }

            let record = if step == self.schema.last_step() {
                Some(self.freeze(&mut state.session)?)
            } else {
                None
            };

            let email = state.session.values().get(FieldId::HospitalEmail).trim().to_string();
            (state.generation, step, email, record)
        };

        let _in_flight = match record {
            Some(_) => Some(InFlight::acquire(&self.submitting).ok_or_else(|| {
                warn!("Ignoring submit while another submission is in flight");
                WizardError::SubmissionInFlight
            })?),
            None => None,
        };

        if Some(step) == self.schema.email_step() || record.is_some() {
            self.run_duplicate_gate(generation, &email).await?;
        }

        match record {
            None => self.advance_from(generation, step).await,
            Some(record) => self.submit(generation, record).await,
        }
    }

    /// Validate every step and build the frozen record.
    fn freeze(&self, session: &mut FormSession) -> Result<LeadRecord, WizardError> {
        for step in 0..self.schema.total_steps() {
            let errors = session.check_step(step);
            if !errors.is_empty() {
                return Err(WizardError::Invalid { step, errors });
            }
        }
        if !session.values().consent() {
            return Err(WizardError::ConsentRequired);
        }
        LeadRecord::from_form(session.values()).map_err(|errors| WizardError::Invalid {
            step: self.schema.last_step(),
            errors,
        })
    }

    /// Fails when the session was reset after `generation` was captured.
    fn ensure_generation(state: &WizardState, generation: u64) -> Result<(), WizardError> {
        if state.generation != generation {
            debug!(
                expected = generation,
                current = state.generation,
                "Dropping action from a reset session"
            );
            return Err(WizardError::SessionReset);
        }
        Ok(())
    }

    async fn run_duplicate_gate(&self, generation: u64, email: &str) -> Result<(), WizardError> {
        let exists = self.gateway.check_duplicate(email).await?;
        let mut state = self.state.write().await;
        Self::ensure_generation(&state, generation)?;
        if exists {
            info!(email = %email, "E-mail already has a report on file");
            state.conflict = Some(DuplicateConflict {
                email: email.to_string(),
                contact_url: self.contact_url.clone(),
            });
            return Err(WizardError::DuplicateEmail {
                email: email.to_string(),
            });
        }
        state.conflict = None;
        Ok(())
    }

    async fn advance_from(&self, generation: u64, step: usize) -> Result<WizardPhase, WizardError> {
        let mut state = self.state.write().await;
        Self::ensure_generation(&state, generation)?;
        let total = self.schema.total_steps();
        if state.phase == WizardPhase::Step(step) {
            if let Some(next) = state.phase.next(total) {
                if state.phase.can_transition_to(next, total) {
                    info!(from = %state.phase, to = %next, "Wizard step advanced");
                    state.phase = next;
                }
            }
        }
        Ok(state.phase)
    }

    async fn submit(&self, generation: u64, record: LeadRecord) -> Result<WizardPhase, WizardError> {
        Self::ensure_generation(&*self.state.read().await, generation)?;

        let lead_id = match self.gateway.submit(&record).await {
            Ok(id) => id,
            Err(e) => {
                warn!(error = %e, "Lead submission failed; record kept for retry");
                self.state.write().await.submission_error = Some(e.to_string());
                return Err(e.into());
            }
        };

        {
            let mut state = self.state.write().await;
            state.phase = WizardPhase::Submitted;
            state.lead_id = Some(lead_id.clone());
            state.submission_error = None;
        }

        let fetched = self.gateway.fetch_recommendations(&lead_id).await;
        let mut state = self.state.write().await;
        match fetched {
            Ok(result) => {
                state.recommendations = Some(result);
                state.recommendation_error = None;
            }
            Err(e) => {
                warn!(lead_id = %lead_id, error = %e, "Recommendations unavailable");
                state.recommendations = Some(RecommendationResult::default());
                state.recommendation_error = Some(e.to_string());
            }
        }
        Ok(WizardPhase::Submitted)
    }

    /// Recommendations, once the lead has been submitted.
    pub async fn result(&self) -> Option<RecommendationResult> {
        self.state.read().await.recommendations.clone()
    }

    pub async fn status(&self) -> WizardStatus {
        let state = self.state.read().await;
        let total = self.schema.total_steps();
        let values = state.session.values().clone();
        WizardStatus {
            phase: state.phase,
            step_label: state.phase.label(total),
            progress: state.phase.progress(total),
            total_steps: total,
            surgery_days: values.days().derived(),
            values,
            errors: state.session.errors().values().cloned().collect(),
            submitting: self.submitting.load(Ordering::Acquire),
            conflict: state.conflict.clone(),
            submission_error: state.submission_error.clone(),
            lead_id: state.lead_id.clone(),
            recommendations: state.recommendations.clone(),
            recommendation_error: state.recommendation_error.clone(),
        }
    }

    /// Discard the session and start an empty one.
    ///
    /// Installs the new session before clearing the gateway caches.
    pub async fn reset(&self) -> Result<(), WizardError> {
        if self.submitting.load(Ordering::Acquire) {
            return Err(WizardError::SubmissionInFlight);
        }
        {
            let mut state = self.state.write().await;
            let generation = state.generation + 1;
            *state = WizardState::new(Arc::clone(&self.schema), generation);
        }
        self.gateway.reset().await;
        info!("Wizard session reset");
        Ok(())
    }
}
