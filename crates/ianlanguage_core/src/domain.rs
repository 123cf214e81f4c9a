//! crates/ianlanguage_core/src/domain.rs
//!
//! Defines the pure, core data structures for the onboarding experience.
//! These types are independent of any storage backend or transport.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

//=========================================================================================
// Languages
//=========================================================================================

/// One of the supported interface/content languages.
///
/// The wire and storage form is exactly the string returned by [`LanguageCode::as_str`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LanguageCode {
    #[serde(rename = "en")]
    En,
    #[serde(rename = "vi")]
    Vi,
    #[serde(rename = "zh-CN")]
    ZhCn,
    #[serde(rename = "zh-TW")]
    ZhTw,
}

impl LanguageCode {
    /// Every supported code, in display order.
    pub const ALL: [LanguageCode; 4] = [Self::En, Self::Vi, Self::ZhCn, Self::ZhTw];

    pub const DEFAULT_NATIVE: LanguageCode = Self::En;
    pub const DEFAULT_TARGET: LanguageCode = Self::ZhCn;

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Vi => "vi",
            Self::ZhCn => "zh-CN",
            Self::ZhTw => "zh-TW",
        }
    }

    /// Display metadata for the language pickers.
    pub fn option(&self) -> LanguageOption {
        let (name, native_name, flag) = match self {
            Self::En => ("English", "English", "🇬🇧"),
            Self::Vi => ("Vietnamese", "Tiếng Việt", "🇻🇳"),
            Self::ZhCn => ("Chinese (Simplified)", "中文 (简体)", "🇨🇳"),
            Self::ZhTw => ("Chinese (Traditional)", "中文 (繁體)", "🇹🇼"),
        };
        LanguageOption {
            code: *self,
            name,
            native_name,
            flag,
        }
    }

    pub fn options() -> Vec<LanguageOption> {
        Self::ALL.iter().map(LanguageCode::option).collect()
    }

    /// The languages offered as a learning target once `native` is chosen.
    pub fn target_options(native: LanguageCode) -> Vec<LanguageCode> {
        Self::ALL.into_iter().filter(|code| *code != native).collect()
    }
}

impl fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string is not one of the supported language codes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported language code: {0}")]
pub struct UnsupportedLanguage(pub String);

impl FromStr for LanguageCode {
    type Err = UnsupportedLanguage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|code| code.as_str() == s)
            .ok_or_else(|| UnsupportedLanguage(s.to_string()))
    }
}

/// A language as presented on the selection screens.
#[derive(Debug, Clone, Serialize)]
pub struct LanguageOption {
    pub code: LanguageCode,
    pub name: &'static str,
    pub native_name: &'static str,
    pub flag: &'static str,
}

/// The (native, target) pair shared by every screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalizationState {
    /// The language the app's own interface is displayed in.
    pub native_language: LanguageCode,
    /// The language the user is learning.
    pub target_language: LanguageCode,
}

impl Default for LocalizationState {
    fn default() -> Self {
        Self {
            native_language: LanguageCode::DEFAULT_NATIVE,
            target_language: LanguageCode::DEFAULT_TARGET,
        }
    }
}

//=========================================================================================
// Personalization
//=========================================================================================

/// Why the user is learning; several may be selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalId {
    Work,
    Travel,
    Study,
    Hobby,
    Communication,
}

impl GoalId {
    pub const ALL: [GoalId; 5] = [
        Self::Work,
        Self::Travel,
        Self::Study,
        Self::Hobby,
        Self::Communication,
    ];

    /// Pre-selected when the goals step opens.
    pub const DEFAULT: GoalId = Self::Work;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LevelGroup {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

impl LevelGroup {
    pub const ALL: [LevelGroup; 3] = [Self::Beginner, Self::Intermediate, Self::Advanced];

    pub fn hsk_levels(&self) -> &'static str {
        match self {
            Self::Beginner => "HSK 1, 2, 3",
            Self::Intermediate => "HSK 4, 5",
            Self::Advanced => "HSK 6",
        }
    }
}

/// Tone of the AI tutor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Personality {
    Serious,
    #[default]
    Fun,
    Encouraging,
    Blunt,
}

impl Personality {
    pub const ALL: [Personality; 4] = [Self::Serious, Self::Fun, Self::Encouraging, Self::Blunt];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Avatar {
    #[default]
    Default,
    Happy,
    Cool,
    Study,
}

/// Interests collected on the profile setup screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileGoal {
    Travel,
    Work,
    Culture,
    Fun,
    School,
    Family,
}

//=========================================================================================
// Authentication
//=========================================================================================

/// An already-authenticated user, as reported by the authentication collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthSession {
    /// Opaque session token, handed back to the client as a cookie.
    pub id: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SocialProvider {
    Google,
}

/// Data submitted on the register screen.
#[derive(Debug, Clone)]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub display_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_codes_parse_from_their_wire_form() {
        for code in LanguageCode::ALL {
            assert_eq!(code.as_str().parse::<LanguageCode>().unwrap(), code);
        }
        assert!("fr".parse::<LanguageCode>().is_err());
        assert!("zh-cn".parse::<LanguageCode>().is_err());
    }

    #[test]
    fn display_matches_serde() {
        for code in LanguageCode::ALL {
            let json = serde_json::to_string(&code).unwrap();
            assert_eq!(json, format!("\"{code}\""));
        }
    }

    #[test]
    fn target_options_exclude_native() {
        let options = LanguageCode::target_options(LanguageCode::Vi);
        assert_eq!(
            options,
            vec![LanguageCode::En, LanguageCode::ZhCn, LanguageCode::ZhTw]
        );
    }

    #[test]
    fn defaults_differ() {
        let state = LocalizationState::default();
        assert_ne!(state.native_language, state.target_language);
        assert_eq!(LevelGroup::default(), LevelGroup::Beginner);
        assert_eq!(Personality::default(), Personality::Fun);
    }
}
