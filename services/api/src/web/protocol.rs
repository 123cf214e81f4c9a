//! services/api/src/web/protocol.rs
//!
//! Defines the JSON payloads exchanged between the app client and the API server.

use crate::adapters::NavigationEvent;
use ianlanguage_core::domain::{LanguageOption, LocalizationState};
use ianlanguage_core::flow::Step;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

//=========================================================================================
// Languages
//=========================================================================================

#[derive(Serialize, ToSchema)]
pub struct LanguageResponse {
    #[schema(example = "zh-CN")]
    pub code: String,
    pub name: String,
    pub native_name: String,
    pub flag: String,
}

impl From<LanguageOption> for LanguageResponse {
    fn from(option: LanguageOption) -> Self {
        Self {
            code: option.code.to_string(),
            name: option.name.to_string(),
            native_name: option.native_name.to_string(),
            flag: option.flag.to_string(),
        }
    }
}

//=========================================================================================
// Flows
//=========================================================================================

/// The state of one onboarding flow after a request.
#[derive(Serialize, ToSchema)]
pub struct FlowResponse {
    pub flow_id: Uuid,
    /// The current step, tagged by `step`.
    #[schema(value_type = Object)]
    pub step: Step,
    #[schema(value_type = Object)]
    pub localization: LocalizationState,
    /// Text to show alongside the step, such as a demo reset code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
    /// Screen changes requested since the previous response, in order.
    pub navigation: Vec<NavigationEvent>,
    /// True once home is reached. The flow is gone after this response.
    pub finished: bool,
}

//=========================================================================================
// Errors
//=========================================================================================

/// A failure the client should show to the user.
#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    pub message: String,
}
