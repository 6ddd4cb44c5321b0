//! Live form state: values plus the errors currently shown to the user.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use tracing::debug;

use crate::error::ValidationError;

use super::days::Weekday;
use super::field::FieldId;
use super::schema::FormSchema;
use super::values::FormValues;

/// Address fields resolved from a postal code.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressFields {
    pub street: String,
    pub neighborhood: String,
    pub city: String,
    pub state: String,
}

/// Side effects a field update asks the caller to perform.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldUpdate {
    /// Whether the stored value changed.
    pub changed: bool,
    /// Digits of a complete (8-digit) postal code to resolve.
    pub resolve_cep: Option<String>,
    /// Fields reset because their governing answer changed.
    pub cleared: Vec<FieldId>,
}

/// One questionnaire being filled in.
///
/// Validation runs on every change. Errors are tracked for every field the
/// user has touched (or that a failed step advance surfaced), so untouched
/// fields do not shout before the user reaches them.
#[derive(Debug, Clone)]
pub struct FormSession {
    schema: Arc<FormSchema>,
    values: FormValues,
    touched: BTreeSet<FieldId>,
    errors: BTreeMap<FieldId, ValidationError>,
}

impl FormSession {
    pub fn new(schema: Arc<FormSchema>) -> Self {
        Self {
            schema,
            values: FormValues::new(),
            touched: BTreeSet::new(),
            errors: BTreeMap::new(),
        }
    }

    pub fn schema(&self) -> &FormSchema {
        &self.schema
    }

    pub fn values(&self) -> &FormValues {
        &self.values
    }

    /// Errors currently shown, keyed by field.
    pub fn errors(&self) -> &BTreeMap<FieldId, ValidationError> {
        &self.errors
    }

    pub fn error(&self, field: FieldId) -> Option<&ValidationError> {
        self.errors.get(&field)
    }

    /// Fresh validation of a single field, whether or not it was touched.
    pub fn validate_field(&self, field: FieldId) -> Option<ValidationError> {
        self.schema.spec(field).and_then(|spec| spec.validate(&self.values))
    }

    /// Write a text field and re-run validation.
    pub fn set_field(&mut self, field: FieldId, value: &str) -> FieldUpdate {
        if !field.is_text_input() {
            debug!(field = %field, "Ignoring direct write to derived field");
            return FieldUpdate::default();
        }

        let changed = self.values.set(field, value);
        self.touched.insert(field);
        let cleared = self.refresh();

        let resolve_cep = (field == FieldId::Cep && changed)
            .then(|| self.values.digits(FieldId::Cep))
            .filter(|digits| digits.len() == 8);

        FieldUpdate {
            changed,
            resolve_cep,
            cleared,
        }
    }

    pub fn toggle_all_days(&mut self) {
        self.values.days_mut().toggle_all_days();
        self.touched.insert(FieldId::SurgeryDays);
        self.refresh();
    }

    pub fn toggle_day(&mut self, day: Weekday) {
        self.values.days_mut().toggle_day(day);
        self.touched.insert(FieldId::SurgeryDays);
        self.refresh();
    }

    pub fn set_consent(&mut self, accepted: bool) {
        self.values.set_consent(accepted);
    }

    /// Overwrite the address fields with a lookup result. The postal code
    /// itself is never touched.
    pub fn apply_address(&mut self, address: &AddressFields) {
        for (field, value) in [
            (FieldId::Street, &address.street),
            (FieldId::Neighborhood, &address.neighborhood),
            (FieldId::City, &address.city),
            (FieldId::State, &address.state),
        ] {
            self.values.set(field, value.as_str());
            self.touched.insert(field);
        }
        self.refresh();
    }

    /// Validate every field on `step`, surfacing their errors. Returns the
    /// errors found; empty means the step is valid.
    pub fn check_step(&mut self, step: usize) -> Vec<ValidationError> {
        let ids: Vec<FieldId> = self.schema.fields_for_step(step).map(|f| f.id).collect();
        self.touched.extend(ids);
        self.refresh();
        self.schema.step_errors(step, &self.values)
    }

    pub fn is_step_valid(&self, step: usize) -> bool {
        self.schema.is_step_valid(step, &self.values)
    }

    /// Clear inapplicable conditional fields, then recompute shown errors.
    fn refresh(&mut self) -> Vec<FieldId> {
        let stale: Vec<FieldId> = self.schema.stale_fields(&self.values).collect();
        for field in &stale {
            debug!(field = %field, "Clearing inapplicable conditional field");
            self.values.clear(*field);
        }

        self.errors = self
            .touched
            .iter()
            .filter_map(|field| self.validate_field(*field).map(|e| (*field, e)))
            .collect();

        stale
    }
}
