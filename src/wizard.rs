//! Wizard state machine — which form section the user is on.

use serde::{Deserialize, Serialize};

use crate::document::{FormDocument, RequiredField};
use crate::error::SubmitError;

/// The four wizard steps.
///
/// Progresses linearly: Solution → BusinessModel → Engine → Trust.
/// Serialized as its 1-based step number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum WizardStep {
    Solution,
    BusinessModel,
    Engine,
    Trust,
}

impl WizardStep {
    pub const FIRST: WizardStep = WizardStep::Solution;
    pub const LAST: WizardStep = WizardStep::Trust;
    pub const ALL: [WizardStep; 4] = [
        WizardStep::Solution,
        WizardStep::BusinessModel,
        WizardStep::Engine,
        WizardStep::Trust,
    ];

    /// 1-based step number.
    pub fn number(&self) -> u8 {
        match self {
            Self::Solution => 1,
            Self::BusinessModel => 2,
            Self::Engine => 3,
            Self::Trust => 4,
        }
    }

    pub fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(Self::Solution),
            2 => Some(Self::BusinessModel),
            3 => Some(Self::Engine),
            4 => Some(Self::Trust),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Solution => "Solución",
            Self::BusinessModel => "Modelo de negocio",
            Self::Engine => "Motor",
            Self::Trust => "Confianza",
        }
    }

    /// The following step, if any.
    pub fn next(&self) -> Option<WizardStep> {
        Self::from_number(self.number() + 1)
    }

    /// The preceding step, if any.
    pub fn prev(&self) -> Option<WizardStep> {
        self.number().checked_sub(1).and_then(Self::from_number)
    }

    pub fn is_last(&self) -> bool {
        *self == Self::LAST
    }
}

impl Default for WizardStep {
    fn default() -> Self {
        Self::FIRST
    }
}

impl std::fmt::Display for WizardStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "step {} ({})", self.number(), self.label())
    }
}

impl TryFrom<u8> for WizardStep {
    type Error = String;

    fn try_from(n: u8) -> Result<Self, Self::Error> {
        Self::from_number(n).ok_or_else(|| format!("wizard step out of range: {n}"))
    }
}

impl From<WizardStep> for u8 {
    fn from(step: WizardStep) -> Self {
        step.number()
    }
}

/// Wizard navigation state.
///
/// Navigation is never gated on validation; required fields are only
/// checked when submitting from the last step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Wizard {
    step: WizardStep,
}

impl Wizard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resume at a restored step.
    pub fn at(step: WizardStep) -> Self {
        Self { step }
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    /// Advance one step. No-op on the last step; returns whether it moved.
    pub fn next(&mut self) -> bool {
        match self.step.next() {
            Some(next) => {
                self.step = next;
                true
            }
            None => false,
        }
    }

    /// Go back one step. No-op on the first step; returns whether it moved.
    pub fn prev(&mut self) -> bool {
        match self.step.prev() {
            Some(prev) => {
                self.step = prev;
                true
            }
            None => false,
        }
    }

    pub fn progress_percent(&self) -> u8 {
        self.step.number() * 25
    }

    pub fn can_submit(&self, doc: &FormDocument) -> bool {
        doc.missing_required().is_empty()
    }

    /// Check that `doc` may be submitted from the current step.
    pub fn validate_submit(&self, doc: &FormDocument) -> Result<(), SubmitError> {
        if !self.step.is_last() {
            return Err(SubmitError::NotOnFinalStep { step: self.step });
        }
        let missing: Vec<RequiredField> = doc.missing_required();
        if !missing.is_empty() {
            return Err(SubmitError::Validation { missing });
        }
        Ok(())
    }

    pub fn reset(&mut self) {
        self.step = WizardStep::FIRST;
    }
}
