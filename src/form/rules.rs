//! Declarative field rules.
//!
//! Each field carries an ordered rule list; the first failing rule produces
//! the error shown for that field. Rules other than `Required` and
//! `ConditionalRequired` pass on empty input, so optional fields are only
//! checked once the user types something.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{ValidationError, ValidationErrorKind};

use super::field::FieldId;
use super::values::{FormValues, digits_only};

/// Characters a masked input may contain besides digits.
static MASK_CHARS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[\d\s().\-/]+$").unwrap());

/// Predicate over the current form, used for conditional requirement.
pub type Predicate = fn(&FormValues) -> bool;

/// A single validation rule.
#[derive(Debug, Clone)]
pub enum Rule {
    /// Fails when the value is empty.
    Required { message: String },
    /// Fails when the trimmed value has fewer than `min` characters.
    MinLength { min: usize, message: String },
    /// Fails when the value does not match. With `digits_only` the value may
    /// hold only digits and mask punctuation, and the regex is applied to
    /// the digits alone.
    Pattern {
        regex: Regex,
        digits_only: bool,
        message: String,
    },
    /// Fails unless the value parses as a number greater than zero.
    /// Accepts a decimal comma.
    PositiveNumber { message: String },
    /// Fails unless the value is one of the fixed options.
    OneOf {
        options: &'static [&'static str],
        message: String,
    },
    /// Required only while `when` holds for the current form.
    ConditionalRequired { when: Predicate, message: String },
}

impl Rule {
    pub fn required(message: &str) -> Self {
        Self::Required {
            message: message.into(),
        }
    }

    pub fn min_length(min: usize, message: &str) -> Self {
        Self::MinLength {
            min,
            message: message.into(),
        }
    }

    pub fn pattern(regex: &str, message: &str) -> Self {
        Self::Pattern {
            regex: Regex::new(regex).unwrap(),
            digits_only: false,
            message: message.into(),
        }
    }

    pub fn digits(regex: &str, message: &str) -> Self {
        Self::Pattern {
            regex: Regex::new(regex).unwrap(),
            digits_only: true,
            message: message.into(),
        }
    }

    pub fn positive_number(message: &str) -> Self {
        Self::PositiveNumber {
            message: message.into(),
        }
    }

    pub fn one_of(options: &'static [&'static str], message: &str) -> Self {
        Self::OneOf {
            options,
            message: message.into(),
        }
    }

    pub fn required_when(when: Predicate, message: &str) -> Self {
        Self::ConditionalRequired {
            when,
            message: message.into(),
        }
    }

    /// Evaluate this rule for `field` against the current form.
    pub fn check(&self, field: FieldId, form: &FormValues) -> Option<ValidationError> {
        let value = form.value(field);
        let trimmed = value.trim();

        let failed = match self {
            Self::Required { message } => trimmed
                .is_empty()
                .then_some((ValidationErrorKind::Required, message)),
            Self::ConditionalRequired { when, message } => (when(form) && trimmed.is_empty())
                .then_some((ValidationErrorKind::Required, message)),
            _ if trimmed.is_empty() => None,
            Self::MinLength { min, message } => (trimmed.chars().count() < *min)
                .then_some((ValidationErrorKind::TooShort, message)),
            Self::Pattern {
                regex,
                digits_only: strip,
                message,
            } => {
                let matches = if *strip {
                    MASK_CHARS.is_match(trimmed) && regex.is_match(&digits_only(trimmed))
                } else {
                    regex.is_match(trimmed)
                };
                (!matches).then_some((ValidationErrorKind::FormatInvalid, message))
            }
            Self::PositiveNumber { message } => {
                let positive = parse_decimal(trimmed).is_some_and(|n| n > 0.0);
                (!positive).then_some((ValidationErrorKind::FormatInvalid, message))
            }
            Self::OneOf { options, message } => {
                let known = options.iter().any(|o| *o == trimmed);
                (!known).then_some((ValidationErrorKind::FormatInvalid, message))
            }
        };

        failed.map(|(kind, message)| ValidationError::new(field, kind, message.clone()))
    }
}

/// Parse a user-typed decimal, accepting `12,5` as well as `12.5`.
pub fn parse_decimal(raw: &str) -> Option<f64> {
    let n: f64 = raw.trim().replace(',', ".").parse().ok()?;
    n.is_finite().then_some(n)
}
