//! The onboarding/auth screen sequence as a state machine.
//!
//! Splash → (Home | LanguageNative) → LanguageTarget → Welcome → Goals →
//! Level → Login → (Home | Register | ForgotPassword). Register leads to Home
//! (or ProfileSetup when enabled), ForgotPassword leads back to Login.

pub mod controller;
pub mod reset;
pub mod step;
pub mod validation;

use serde::Serialize;

use crate::domain::AuthSession;
use crate::i18n::LocalePack;
use crate::ports::PortError;

pub use controller::{Collaborators, OnboardingFlowController};
pub use reset::{OtpChallenge, OtpInput, ResetPhase};
pub use step::{Action, OnboardingProgress, Selections, Step};
pub use validation::ValidationError;

/// Knobs that change the shape of the flow.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlowOptions {
    /// Route a successful registration through the profile setup screen
    /// instead of straight to home.
    pub profile_setup_after_register: bool,
}

/// The result of a successful transition.
#[derive(Debug, Clone, Serialize)]
pub struct Outcome {
    pub step: Step,
    /// Extra text the screen should show, e.g. a demo reset code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
    /// Set when this transition signed the user in.
    #[serde(skip)]
    pub session: Option<AuthSession>,
}

/// Why an action did not go through. The flow stays on its current step.
#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    /// Local input rule failed; `message` is already localized.
    #[error("{message}")]
    Validation {
        kind: ValidationError,
        message: String,
    },

    /// A collaborator call failed; `message` is already localized.
    #[error("{message}")]
    Collaborator {
        message: String,
        #[source]
        source: PortError,
    },

    #[error("action '{action}' is not available on step '{step}'")]
    InvalidAction {
        step: &'static str,
        action: &'static str,
    },

    #[error("another action is still pending")]
    Busy,
}

impl FlowError {
    /// Text suitable for an alert, in the language of `pack`.
    pub fn user_message(&self, pack: &LocalePack) -> String {
        match self {
            Self::Validation { message, .. } | Self::Collaborator { message, .. } => {
                message.clone()
            }
            Self::InvalidAction { .. } => pack.errors.not_available.clone(),
            Self::Busy => pack.errors.busy.clone(),
        }
    }
}
