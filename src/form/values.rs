//! Raw form input, as typed by the user.

use std::collections::BTreeMap;

use serde::Serialize;

use super::days::DaySelection;
use super::field::FieldId;

/// The in-progress questionnaire: raw text per field, the weekday
/// selector, and the consent checkbox.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FormValues {
    fields: BTreeMap<FieldId, String>,
    days: DaySelection,
    consent: bool,
}

impl FormValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw value of a text field, `""` when unset.
    pub fn get(&self, field: FieldId) -> &str {
        self.fields.get(&field).map(String::as_str).unwrap_or("")
    }

    /// Value used by validation. Surgery days read as the comma-joined
    /// derived tag list, so the usual `Required` rule applies to them.
    pub fn value(&self, field: FieldId) -> String {
        match field {
            FieldId::SurgeryDays => self.days.derived().join(","),
            _ => self.get(field).to_string(),
        }
    }

    /// Digits-only projection of a masked input (`12345-678` → `12345678`).
    pub fn digits(&self, field: FieldId) -> String {
        digits_only(self.get(field))
    }

    pub fn is_set(&self, field: FieldId) -> bool {
        !self.value(field).trim().is_empty()
    }

    /// Set a text field. Returns `true` when the stored value changed.
    pub fn set(&mut self, field: FieldId, value: impl Into<String>) -> bool {
        let value = value.into();
        if self.get(field) == value {
            return false;
        }
        if value.is_empty() {
            self.fields.remove(&field);
        } else {
            self.fields.insert(field, value);
        }
        true
    }

    /// Reset a field to unset. Returns `true` if it held a value.
    pub fn clear(&mut self, field: FieldId) -> bool {
        self.fields.remove(&field).is_some()
    }

    pub fn days(&self) -> &DaySelection {
        &self.days
    }

    pub fn days_mut(&mut self) -> &mut DaySelection {
        &mut self.days
    }

    pub fn consent(&self) -> bool {
        self.consent
    }

    pub fn set_consent(&mut self, accepted: bool) {
        self.consent = accepted;
    }
}

pub fn digits_only(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::days::Weekday;

    #[test]
    fn unset_fields_read_empty() {
        let values = FormValues::new();
        assert_eq!(values.get(FieldId::Customer), "");
        assert!(!values.is_set(FieldId::Customer));
    }

    #[test]
    fn set_reports_changes_only() {
        let mut values = FormValues::new();
        assert!(values.set(FieldId::City, "Curitiba"));
        assert!(!values.set(FieldId::City, "Curitiba"));
        assert!(values.set(FieldId::City, ""));
        assert!(!values.is_set(FieldId::City));
    }

    #[test]
    fn digits_strip_masks() {
        let mut values = FormValues::new();
        values.set(FieldId::Cep, "80010-010");
        values.set(FieldId::Cnpj, "12.345.678/0001-90");
        assert_eq!(values.digits(FieldId::Cep), "80010010");
        assert_eq!(values.digits(FieldId::Cnpj), "12345678000190");
    }

    #[test]
    fn surgery_days_value_follows_selector() {
        let mut values = FormValues::new();
        assert!(!values.is_set(FieldId::SurgeryDays));
        values.days_mut().toggle_day(Weekday::Tuesday);
        values.days_mut().toggle_day(Weekday::Saturday);
        assert_eq!(values.value(FieldId::SurgeryDays), "tuesday,saturday");
    }
}
