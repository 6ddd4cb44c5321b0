//! External collaborators: postal-code lookup and the lead backend.
//!
//! Both sit behind async traits so the wizard can run against the real
//! HTTP clients or against in-process stubs. All network failures are
//! converted into crate error types at this boundary.

pub mod backend;
pub mod gateway;
pub mod viacep;

#[cfg(test)]
pub(crate) mod stubs;

use async_trait::async_trait;

use crate::error::{BackendError, LookupError};
use crate::form::AddressFields;
use crate::lead::{LeadId, LeadRecord, RecommendationResult};

pub use backend::LeadApiClient;
pub use gateway::{AddressResolution, LeadGateway, LookupTicket};
pub use viacep::ViaCepClient;

/// Resolves an 8-digit postal code into address fields.
#[async_trait]
pub trait AddressLookup: Send + Sync {
    async fn lookup(&self, cep: &str) -> Result<AddressFields, LookupError>;
}

/// The lead intake backend.
#[async_trait]
pub trait LeadBackend: Send + Sync {
    /// `POST /lead/formcheck`: whether a report already exists for `email`.
    async fn email_exists(&self, email: &str) -> Result<bool, BackendError>;

    /// `POST /lead`: create the lead, returning its id.
    async fn create_lead(&self, lead: &LeadRecord) -> Result<LeadId, BackendError>;

    /// `GET /lead/{id}`: recommendations computed for a lead.
    async fn recommendations(&self, id: &LeadId) -> Result<RecommendationResult, BackendError>;
}
