//! Local input rules. A failure is shown to the user and never advances the flow.

use serde::Serialize;

use crate::i18n::LocalePack;

pub const MIN_PASSWORD_CHARS: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(rename_all = "snake_case")]
pub enum ValidationError {
    #[error("email address is not valid")]
    InvalidEmail,
    #[error("email or password is missing")]
    MissingCredentials,
    #[error("reset code is incomplete")]
    IncompleteCode,
    #[error("reset code does not match")]
    InvalidCode,
    #[error("password is too short")]
    PasswordTooShort,
    #[error("password confirmation does not match")]
    PasswordMismatch,
    #[error("no language selected")]
    NoLanguageSelected,
    #[error("target language equals native language")]
    SameLanguage,
    #[error("no goal selected")]
    NoGoalSelected,
    #[error("display name is empty")]
    MissingDisplayName,
}

impl ValidationError {
    /// The message shown to the user, in the current interface language.
    pub fn message<'a>(&self, pack: &'a LocalePack) -> &'a str {
        let errors = &pack.errors;
        match self {
            Self::InvalidEmail => &errors.invalid_email,
            Self::MissingCredentials => &errors.missing_credentials,
            Self::IncompleteCode => &errors.incomplete_code,
            Self::InvalidCode => &pack.forgot_password.invalid_code,
            Self::PasswordTooShort => &errors.password_too_short,
            Self::PasswordMismatch => &errors.password_mismatch,
            Self::NoLanguageSelected => &errors.no_language_selected,
            Self::SameLanguage => &errors.same_language,
            Self::NoGoalSelected => &errors.no_goal_selected,
            Self::MissingDisplayName => &errors.missing_display_name,
        }
    }
}

/// Syntactic plausibility only: non-empty and containing `@`.
pub fn check_email(email: &str) -> Result<(), ValidationError> {
    let email = email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(ValidationError::InvalidEmail);
    }
    Ok(())
}

pub fn check_credentials(email: &str, password: &str) -> Result<(), ValidationError> {
    if email.trim().is_empty() || password.is_empty() {
        return Err(ValidationError::MissingCredentials);
    }
    Ok(())
}

/// Length is counted in characters, not bytes.
pub fn check_new_password(password: &str, confirmation: &str) -> Result<(), ValidationError> {
    if password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(ValidationError::PasswordTooShort);
    }
    if password != confirmation {
        return Err(ValidationError::PasswordMismatch);
    }
    Ok(())
}
