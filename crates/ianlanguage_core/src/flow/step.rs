//! Onboarding steps, the actions a user can take on them, and the progress
//! accumulated along the way.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::domain::{
    Avatar, GoalId, LanguageCode, LevelGroup, Personality, ProfileGoal, SocialProvider,
};
use crate::flow::reset::ResetPhase;
use crate::ports::Route;

/// The screen the user is on, with exactly the state that screen needs.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum Step {
    Splash,
    LanguageNative {
        selected: Option<LanguageCode>,
    },
    LanguageTarget {
        native: LanguageCode,
        options: Vec<LanguageCode>,
        selected: Option<LanguageCode>,
    },
    Welcome,
    Goals {
        selected: BTreeSet<GoalId>,
    },
    Level {
        level: LevelGroup,
        personality: Personality,
    },
    Login {
        email: String,
    },
    Register,
    ForgotPassword {
        phase: ResetPhase,
    },
    ProfileSetup {
        display_name: String,
        avatar: Avatar,
        goals: BTreeSet<ProfileGoal>,
    },
    Home,
}

impl Step {
    pub fn language_native() -> Self {
        Self::LanguageNative { selected: None }
    }

    pub fn language_target(native: LanguageCode) -> Self {
        Self::LanguageTarget {
            native,
            options: LanguageCode::target_options(native),
            selected: None,
        }
    }

    pub fn goals() -> Self {
        Self::Goals {
            selected: BTreeSet::from([GoalId::DEFAULT]),
        }
    }

    pub fn level() -> Self {
        Self::Level {
            level: LevelGroup::default(),
            personality: Personality::default(),
        }
    }

    pub fn profile_setup(display_name: Option<String>) -> Self {
        Self::ProfileSetup {
            display_name: display_name.unwrap_or_default(),
            avatar: Avatar::default(),
            goals: BTreeSet::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Splash => "splash",
            Self::LanguageNative { .. } => "language_native",
            Self::LanguageTarget { .. } => "language_target",
            Self::Welcome => "welcome",
            Self::Goals { .. } => "goals",
            Self::Level { .. } => "level",
            Self::Login { .. } => "login",
            Self::Register => "register",
            Self::ForgotPassword { .. } => "forgot_password",
            Self::ProfileSetup { .. } => "profile_setup",
            Self::Home => "home",
        }
    }

    /// The screen that renders this step. Both language steps share one screen.
    pub fn route(&self) -> Route {
        match self {
            Self::Splash => Route::Splash,
            Self::LanguageNative { .. } | Self::LanguageTarget { .. } => Route::Language,
            Self::Welcome => Route::Welcome,
            Self::Goals { .. } => Route::Goals,
            Self::Level { .. } => Route::Level,
            Self::Login { .. } => Route::Login,
            Self::Register => Route::Register,
            Self::ForgotPassword { .. } => Route::ForgotPassword,
            Self::ProfileSetup { .. } => Route::ProfileSetup,
            Self::Home => Route::Home,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Home)
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ForgotPassword { phase } => write!(f, "forgot_password/{}", phase.name()),
            other => f.write_str(other.name()),
        }
    }
}

/// Something the user did on the current screen.
#[derive(Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    SelectLanguage {
        code: LanguageCode,
    },
    /// The screen's primary button (next, start, complete).
    Next,
    ToggleGoal {
        goal: GoalId,
    },
    SelectLevel {
        level: LevelGroup,
    },
    SelectPersonality {
        personality: Personality,
    },
    SignIn {
        email: String,
        password: String,
    },
    SignInWithProvider {
        provider: SocialProvider,
    },
    OpenRegister,
    OpenForgotPassword,
    Register {
        email: String,
        password: String,
        confirm_password: String,
        #[serde(default)]
        display_name: Option<String>,
    },
    BackToLogin,
    SendCode {
        email: String,
    },
    EnterDigit {
        index: usize,
        value: String,
    },
    VerifyCode,
    /// Fills all six boxes at once, then verifies.
    SubmitCode {
        code: String,
    },
    ResendCode,
    ResetPassword {
        new_password: String,
        confirm_password: String,
    },
    SetDisplayName {
        name: String,
    },
    SelectAvatar {
        avatar: Avatar,
    },
    ToggleProfileGoal {
        goal: ProfileGoal,
    },
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Self::SelectLanguage { .. } => "select_language",
            Self::Next => "next",
            Self::ToggleGoal { .. } => "toggle_goal",
            Self::SelectLevel { .. } => "select_level",
            Self::SelectPersonality { .. } => "select_personality",
            Self::SignIn { .. } => "sign_in",
            Self::SignInWithProvider { .. } => "sign_in_with_provider",
            Self::OpenRegister => "open_register",
            Self::OpenForgotPassword => "open_forgot_password",
            Self::Register { .. } => "register",
            Self::BackToLogin => "back_to_login",
            Self::SendCode { .. } => "send_code",
            Self::EnterDigit { .. } => "enter_digit",
            Self::VerifyCode => "verify_code",
            Self::SubmitCode { .. } => "submit_code",
            Self::ResendCode => "resend_code",
            Self::ResetPassword { .. } => "reset_password",
            Self::SetDisplayName { .. } => "set_display_name",
            Self::SelectAvatar { .. } => "select_avatar",
            Self::ToggleProfileGoal { .. } => "toggle_profile_goal",
        }
    }
}

// Actions carry passwords and codes; only the name is printed.
impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action")
            .field("type", &self.name())
            .finish_non_exhaustive()
    }
}

/// Choices confirmed on earlier steps.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Selections {
    pub native_language: Option<LanguageCode>,
    pub target_language: Option<LanguageCode>,
    pub goals: BTreeSet<GoalId>,
    pub level: Option<LevelGroup>,
    pub personality: Option<Personality>,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub avatar: Option<Avatar>,
    pub profile_goals: BTreeSet<ProfileGoal>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OnboardingProgress {
    pub step: Step,
    pub selections: Selections,
}

impl Default for OnboardingProgress {
    fn default() -> Self {
        Self {
            step: Step::Splash,
            selections: Selections::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_serializes_with_tag() {
        let json = serde_json::to_value(Step::language_target(LanguageCode::Vi)).unwrap();
        assert_eq!(json["step"], "language_target");
        assert_eq!(json["native"], "vi");
        assert_eq!(json["options"], serde_json::json!(["en", "zh-CN", "zh-TW"]));
    }

    #[test]
    fn forgot_password_nests_phase() {
        let step = Step::ForgotPassword {
            phase: ResetPhase::Email {
                email: String::new(),
            },
        };
        let json = serde_json::to_value(&step).unwrap();
        assert_eq!(json["step"], "forgot_password");
        assert_eq!(json["phase"]["phase"], "email");
        assert_eq!(step.to_string(), "forgot_password/email");
    }

    #[test]
    fn actions_deserialize_from_tagged_json() {
        let action: Action = serde_json::from_str(
            r#"{"type":"register","email":"a@b.c","password":"abc123","confirm_password":"abc123"}"#,
        )
        .unwrap();
        assert_eq!(action.name(), "register");

        let action: Action =
            serde_json::from_str(r#"{"type":"select_language","code":"zh-TW"}"#).unwrap();
        assert!(matches!(
            action,
            Action::SelectLanguage {
                code: LanguageCode::ZhTw
            }
        ));

        assert!(serde_json::from_str::<Action>(r#"{"type":"select_language","code":"fr"}"#).is_err());
    }

    #[test]
    fn debug_output_hides_secrets() {
        let action = Action::SignIn {
            email: "ian@example.com".to_string(),
            password: "hunter22".to_string(),
        };
        let printed = format!("{action:?}");
        assert!(printed.contains("sign_in"));
        assert!(!printed.contains("hunter22"));
    }

    #[test]
    fn goals_start_with_default_selected() {
        let Step::Goals { selected } = Step::goals() else {
            panic!("expected goals step");
        };
        assert_eq!(selected, BTreeSet::from([GoalId::Work]));
    }
}
