//! Typed locale packs, embedded at compile time.
//!
//! Each section struct denies unknown fields and has no optional fields, so a
//! pack that is missing a key (or carries an extra one) fails to load.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::error;

use crate::domain::{GoalId, LanguageCode, LevelGroup, Personality, ProfileGoal};

#[derive(Debug, thiserror::Error)]
pub enum I18nError {
    #[error("locale pack '{code}' is malformed: {source}")]
    MalformedPack {
        code: LanguageCode,
        #[source]
        source: serde_json::Error,
    },
}

/// Every user-facing string for one language.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LocalePack {
    pub common: CommonText,
    pub language: LanguageText,
    pub welcome: WelcomeText,
    pub goals: GoalsText,
    pub level: LevelText,
    pub auth: AuthText,
    pub forgot_password: ForgotPasswordText,
    pub profile: ProfileText,
    pub home: HomeText,
    pub errors: ErrorText,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CommonText {
    pub next: String,
    pub start: String,
    pub complete: String,
    pub back: String,
    pub loading: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LanguageText {
    pub native_title: String,
    pub native_subtitle: String,
    pub target_title: String,
    pub target_subtitle: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct WelcomeText {
    pub title: String,
    pub subtitle: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GoalsText {
    pub title: String,
    pub subtitle: String,
    pub work: String,
    pub work_desc: String,
    pub travel: String,
    pub travel_desc: String,
    pub study: String,
    pub study_desc: String,
    pub hobby: String,
    pub hobby_desc: String,
    pub communication: String,
    pub communication_desc: String,
}

impl GoalsText {
    /// Title and description of a goal card.
    pub fn card(&self, goal: GoalId) -> (&str, &str) {
        match goal {
            GoalId::Work => (&self.work, &self.work_desc),
            GoalId::Travel => (&self.travel, &self.travel_desc),
            GoalId::Study => (&self.study, &self.study_desc),
            GoalId::Hobby => (&self.hobby, &self.hobby_desc),
            GoalId::Communication => (&self.communication, &self.communication_desc),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LevelText {
    pub title: String,
    pub current_level: String,
    pub ai_personality: String,
    pub beginner: String,
    pub intermediate: String,
    pub advanced: String,
    pub serious: String,
    pub serious_desc: String,
    pub fun: String,
    pub fun_desc: String,
    pub encouraging: String,
    pub encouraging_desc: String,
    pub blunt: String,
    pub blunt_desc: String,
}

impl LevelText {
    pub fn level(&self, level: LevelGroup) -> &str {
        match level {
            LevelGroup::Beginner => &self.beginner,
            LevelGroup::Intermediate => &self.intermediate,
            LevelGroup::Advanced => &self.advanced,
        }
    }

    pub fn personality(&self, personality: Personality) -> (&str, &str) {
        match personality {
            Personality::Serious => (&self.serious, &self.serious_desc),
            Personality::Fun => (&self.fun, &self.fun_desc),
            Personality::Encouraging => (&self.encouraging, &self.encouraging_desc),
            Personality::Blunt => (&self.blunt, &self.blunt_desc),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AuthText {
    pub welcome_back: String,
    pub missed_you: String,
    pub email: String,
    pub password: String,
    pub sign_in: String,
    pub sign_in_with_google: String,
    pub or_continue_with: String,
    pub new_here: String,
    pub register: String,
    pub forgot_password: String,
    pub create_account: String,
    pub display_name: String,
    pub confirm_password: String,
    pub have_account: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ForgotPasswordText {
    pub title: String,
    pub subtitle: String,
    pub enter_email: String,
    pub send_code: String,
    pub enter_code: String,
    pub code_subtitle: String,
    pub verify_code: String,
    pub resend_code: String,
    pub new_password: String,
    pub confirm_new_password: String,
    pub reset_password: String,
    pub success_title: String,
    pub success_subtitle: String,
    pub back_to_login: String,
    pub invalid_code: String,
    /// Contains a `{code}` placeholder.
    pub demo_code: String,
}

impl ForgotPasswordText {
    pub fn demo_code_notice(&self, code: &str) -> String {
        self.demo_code.replace("{code}", code)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ProfileText {
    pub title: String,
    pub subtitle: String,
    pub choose_avatar: String,
    pub your_name: String,
    pub name_placeholder: String,
    pub goals_title: String,
    pub travel: String,
    pub work: String,
    pub culture: String,
    pub fun: String,
    pub school: String,
    pub family: String,
}

impl ProfileText {
    pub fn goal(&self, goal: ProfileGoal) -> &str {
        match goal {
            ProfileGoal::Travel => &self.travel,
            ProfileGoal::Work => &self.work,
            ProfileGoal::Culture => &self.culture,
            ProfileGoal::Fun => &self.fun,
            ProfileGoal::School => &self.school,
            ProfileGoal::Family => &self.family,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct HomeText {
    pub welcome: String,
    pub setup_complete: String,
    pub coming_soon: String,
    pub placeholder: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ErrorText {
    pub invalid_email: String,
    pub missing_credentials: String,
    pub incomplete_code: String,
    pub password_too_short: String,
    pub password_mismatch: String,
    pub no_language_selected: String,
    pub same_language: String,
    pub no_goal_selected: String,
    pub missing_display_name: String,
    pub sign_in_failed: String,
    pub sign_up_failed: String,
    pub email_taken: String,
    pub send_code_failed: String,
    pub reset_failed: String,
    pub not_available: String,
    pub busy: String,
}

impl LocalePack {
    /// Parses a pack from its JSON source.
    pub fn from_json(code: LanguageCode, source: &str) -> Result<Self, I18nError> {
        serde_json::from_str(source).map_err(|source| I18nError::MalformedPack { code, source })
    }

    /// The flattened, dot-separated key set, e.g. `forgotPassword.demoCode`.
    pub fn keys(&self) -> BTreeSet<String> {
        let mut keys = BTreeSet::new();
        if let Ok(value) = serde_json::to_value(self) {
            collect_keys(&value, "", &mut keys);
        }
        keys
    }
}

fn collect_keys(value: &serde_json::Value, prefix: &str, out: &mut BTreeSet<String>) {
    match value {
        serde_json::Value::Object(map) => {
            for (key, child) in map {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                collect_keys(child, &path, out);
            }
        }
        _ => {
            out.insert(prefix.to_string());
        }
    }
}

//=========================================================================================
// Translation table
//=========================================================================================

const EN: &str = include_str!("../../locales/en.json");
const VI: &str = include_str!("../../locales/vi.json");
const ZH_CN: &str = include_str!("../../locales/zh-CN.json");
const ZH_TW: &str = include_str!("../../locales/zh-TW.json");

/// The static translation table: one pack per supported language.
#[derive(Debug, Clone)]
pub struct Translations {
    packs: BTreeMap<LanguageCode, LocalePack>,
}

impl Translations {
    /// Loads the packs compiled into the binary.
    pub fn embedded() -> Result<Self, I18nError> {
        let sources = [
            (LanguageCode::En, EN),
            (LanguageCode::Vi, VI),
            (LanguageCode::ZhCn, ZH_CN),
            (LanguageCode::ZhTw, ZH_TW),
        ];
        let mut packs = BTreeMap::new();
        for (code, source) in sources {
            packs.insert(code, LocalePack::from_json(code, source)?);
        }
        Ok(Self { packs })
    }

    pub fn pack(&self, code: LanguageCode) -> Option<&LocalePack> {
        self.packs.get(&code)
    }

    /// Returns the pack for `code`, or the default pack if `code` has none.
    pub fn pack_or_default(&self, code: LanguageCode) -> &LocalePack {
        if let Some(pack) = self.packs.get(&code) {
            return pack;
        }
        error!(
            language = %code,
            "No locale pack for language; falling back to the default pack"
        );
        self.default_pack()
    }

    pub fn default_pack(&self) -> &LocalePack {
        // `embedded()` always inserts the default language.
        &self.packs[&LanguageCode::DEFAULT_NATIVE]
    }

    /// Builds a table from explicit packs. The default language must be present.
    pub fn from_packs(packs: BTreeMap<LanguageCode, LocalePack>) -> Option<Self> {
        packs
            .contains_key(&LanguageCode::DEFAULT_NATIVE)
            .then_some(Self { packs })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_embedded_pack_loads() {
        let translations = Translations::embedded().unwrap();
        for code in LanguageCode::ALL {
            assert!(translations.pack(code).is_some(), "missing pack for {code}");
        }
    }

    #[test]
    fn packs_share_one_key_set() {
        let translations = Translations::embedded().unwrap();
        let reference = translations.default_pack().keys();
        assert!(reference.contains("forgotPassword.demoCode"));
        for code in LanguageCode::ALL {
            assert_eq!(translations.pack(code).unwrap().keys(), reference, "{code}");
        }
    }

    #[test]
    fn a_missing_key_fails_to_load() {
        let mut value: serde_json::Value = serde_json::from_str(EN).unwrap();
        value["home"].as_object_mut().unwrap().remove("placeholder");
        let err = LocalePack::from_json(LanguageCode::En, &value.to_string()).unwrap_err();
        assert!(err.to_string().contains("placeholder"));
    }

    #[test]
    fn an_extra_key_fails_to_load() {
        let mut value: serde_json::Value = serde_json::from_str(VI).unwrap();
        value["home"]["extra"] = serde_json::json!("thừa");
        assert!(LocalePack::from_json(LanguageCode::Vi, &value.to_string()).is_err());
    }

    #[test]
    fn demo_code_notice_fills_placeholder() {
        let translations = Translations::embedded().unwrap();
        let notice = translations
            .default_pack()
            .forgot_password
            .demo_code_notice("123456");
        assert_eq!(notice, "Demo mode: your code is 123456");
    }

    #[test]
    fn missing_pack_falls_back_to_default() {
        let embedded = Translations::embedded().unwrap();
        let mut packs = BTreeMap::new();
        packs.insert(LanguageCode::En, embedded.default_pack().clone());
        let partial = Translations::from_packs(packs).unwrap();
        assert_eq!(
            partial.pack_or_default(LanguageCode::Vi).home.welcome,
            "Welcome!"
        );
    }
}
