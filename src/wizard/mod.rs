//! The multi-step questionnaire: phase machine, controller and sessions.

pub mod controller;
pub mod phase;
pub mod sessions;

pub use controller::{DuplicateConflict, WizardController, WizardStatus};
pub use phase::WizardPhase;
pub use sessions::{SessionStore, spawn_expiry_task};
