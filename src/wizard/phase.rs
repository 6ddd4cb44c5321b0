//! Wizard phase state machine.

use serde::Serialize;

/// Where the wizard is.
///
/// Progresses linearly through `Step(0)..Step(total - 1)`, then to the
/// terminal `Submitted`. Steps can move back one at a time; nothing leaves
/// `Submitted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", content = "step", rename_all = "snake_case")]
pub enum WizardPhase {
    Step(usize),
    Submitted,
}

impl WizardPhase {
    /// Check if a transition from `self` to `target` is valid for a wizard
    /// of `total` steps.
    pub fn can_transition_to(&self, target: WizardPhase, total: usize) -> bool {
        match (*self, target) {
            (Self::Step(from), Self::Step(to)) => {
                to < total && (to == from + 1 || to + 1 == from)
            }
            (Self::Step(from), Self::Submitted) => from + 1 == total,
            (Self::Submitted, _) => false,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Submitted)
    }

    pub fn step(&self) -> Option<usize> {
        match self {
            Self::Step(step) => Some(*step),
            Self::Submitted => None,
        }
    }

    /// The phase after this one, if any.
    pub fn next(&self, total: usize) -> Option<WizardPhase> {
        match *self {
            Self::Step(step) if step + 1 < total => Some(Self::Step(step + 1)),
            Self::Step(_) => Some(Self::Submitted),
            Self::Submitted => None,
        }
    }

    /// The phase before this one, if any.
    pub fn previous(&self) -> Option<WizardPhase> {
        match *self {
            Self::Step(step) if step > 0 => Some(Self::Step(step - 1)),
            _ => None,
        }
    }

    /// Fraction of the questionnaire behind the user, in `[0, 1]`.
    pub fn progress(&self, total: usize) -> f64 {
        match *self {
            Self::Step(step) if total > 0 => step as f64 / total as f64,
            _ => 1.0,
        }
    }

    /// Step heading, e.g. "Passo 2 de 4".
    pub fn label(&self, total: usize) -> String {
        match *self {
            Self::Step(step) => format!("Passo {} de {total}", step + 1),
            Self::Submitted => "Confira o resultado!".to_string(),
        }
    }
}

impl Default for WizardPhase {
    fn default() -> Self {
        Self::Step(0)
    }
}

impl std::fmt::Display for WizardPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Step(step) => write!(f, "step_{step}"),
            Self::Submitted => write!(f, "submitted"),
        }
    }
}
