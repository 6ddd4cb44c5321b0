//! Lead data: the record sent to the backend and the recommendations it
//! returns.

pub mod model;
pub mod recommendation;

pub use model::{CmeIntent, CmeStatus, EngineeringModel, LeadRecord, YesNo};
pub use recommendation::{EquipmentRecommendation, LeadId, RecommendationResult};
