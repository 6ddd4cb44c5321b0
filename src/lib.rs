//! Calculadora CME: lead-capture questionnaire for sterilization-center
//! equipment recommendations.

pub mod adapter;
pub mod config;
pub mod error;
pub mod form;
pub mod lead;
pub mod routes;
pub mod wizard;

pub use error::{Error, Result};
