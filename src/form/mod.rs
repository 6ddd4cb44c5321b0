//! Questionnaire form: field ids, rules, schema, and the live session.
//!
//! Validation is schema-driven. Each field declares an ordered rule list
//! and, for conditional questions, the predicate under which it applies.
//! The session re-evaluates everything on each change and clears answers
//! whose question no longer applies, so stale values never reach
//! submission.

pub mod days;
pub mod field;
pub mod rules;
pub mod schema;
pub mod session;
pub mod values;

pub use days::{ALL_DAYS_TAG, DaySelection, Weekday};
pub use field::FieldId;
pub use rules::{Predicate, Rule};
pub use schema::{FieldSpec, FormSchema};
pub use session::{AddressFields, FieldUpdate, FormSession};
pub use values::FormValues;
