//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the language endpoints and the master
//! definition for the OpenAPI document.

use crate::adapters::{NavigationEvent, NavigationKind};
use crate::web::flows;
use crate::web::protocol::{ErrorResponse, FlowResponse, LanguageResponse};
use crate::web::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use ianlanguage_core::domain::LanguageCode;
use ianlanguage_core::i18n::LocalePack;
use std::sync::Arc;
use tracing::debug;
use utoipa::OpenApi;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        list_languages_handler,
        get_translations_handler,
        flows::create_flow_handler,
        flows::get_flow_handler,
        flows::flow_action_handler,
    ),
    components(
        schemas(LanguageResponse, FlowResponse, ErrorResponse, NavigationEvent, NavigationKind)
    ),
    tags(
        (name = "IanLanguage API", description = "Onboarding flow and interface translations for the IanLanguage app.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// List the supported languages with their display names and flags.
#[utoipa::path(
    get,
    path = "/languages",
    responses(
        (status = 200, description = "Supported languages in display order", body = [LanguageResponse])
    )
)]
pub async fn list_languages_handler() -> Json<Vec<LanguageResponse>> {
    Json(
        LanguageCode::options()
            .into_iter()
            .map(LanguageResponse::from)
            .collect(),
    )
}

/// Get every interface string for one language.
#[utoipa::path(
    get,
    path = "/translations/{code}",
    responses(
        (status = 200, description = "The locale pack, grouped by screen", body = Object),
        (status = 404, description = "Unsupported language code", body = ErrorResponse)
    ),
    params(
        ("code" = String, Path, description = "One of en, vi, zh-CN, zh-TW.")
    )
)]
pub async fn get_translations_handler(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> Result<Json<LocalePack>, (StatusCode, Json<ErrorResponse>)> {
    let not_found = |message: String| {
        (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse { message }),
        )
    };

    let code = code.parse::<LanguageCode>().map_err(|e| {
        debug!("Translations requested for {}", e);
        not_found(e.to_string())
    })?;
    let pack = state
        .translations
        .pack(code)
        .ok_or_else(|| not_found(format!("No translations for {}", code)))?;
    Ok(Json(pack.clone()))
}
