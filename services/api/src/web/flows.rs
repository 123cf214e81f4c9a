//! services/api/src/web/flows.rs
//!
//! Onboarding flow endpoints. A flow is created per device, driven one action
//! at a time, and dropped once it reaches home.

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use chrono::Utc;
use ianlanguage_core::domain::AuthSession;
use ianlanguage_core::flow::{Action, FlowError, Outcome};
use ianlanguage_core::ports::PortError;
use std::sync::Arc;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::web::middleware::{session_cookie, session_set_cookie, DeviceId};
use crate::web::protocol::{ErrorResponse, FlowResponse};
use crate::web::state::{AppState, FlowHandle};

type HandlerError = (StatusCode, Json<ErrorResponse>);

fn failure(status: StatusCode, message: impl Into<String>) -> HandlerError {
    (
        status,
        Json(ErrorResponse {
            message: message.into(),
        }),
    )
}

/// Maps a refused action to a status code and a message in the flow's language.
fn flow_failure(flow: &FlowHandle, err: FlowError) -> HandlerError {
    let status = match &err {
        FlowError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        FlowError::InvalidAction { .. } | FlowError::Busy => StatusCode::CONFLICT,
        FlowError::Collaborator {
            source: PortError::AlreadyExists(_),
            ..
        } => StatusCode::CONFLICT,
        FlowError::Collaborator { .. } => StatusCode::BAD_GATEWAY,
    };
    debug!(flow_id = %flow.id, %status, "Action refused: {}", err);
    let message = err.user_message(flow.controller.localization().resolve());
    failure(status, message)
}

fn flow_not_found(flow_id: Uuid) -> HandlerError {
    failure(StatusCode::NOT_FOUND, format!("Flow {} not found", flow_id))
}

/// Builds the response body, draining the navigation requested so far.
fn flow_response(flow: &FlowHandle, outcome: Outcome) -> FlowResponse {
    let finished = outcome.step.is_terminal();
    FlowResponse {
        flow_id: flow.id,
        step: outcome.step,
        localization: flow.controller.localization().state(),
        notice: outcome.notice,
        navigation: flow.navigator.drain(),
        finished,
    }
}

/// Adds the session cookie when the transition signed the user in.
fn with_session_cookie(
    mut response: Response,
    session: Option<&AuthSession>,
) -> Result<Response, HandlerError> {
    if let Some(session) = session {
        let cookie = session_set_cookie(&session.id, session.expires_at - Utc::now());
        let value = HeaderValue::from_str(&cookie).map_err(|e| {
            error!("Failed to build session cookie: {:?}", e);
            failure(StatusCode::INTERNAL_SERVER_ERROR, "Failed to create session")
        })?;
        response.headers_mut().insert(header::SET_COOKIE, value);
    }
    Ok(response)
}

//=========================================================================================
// Handlers
//=========================================================================================

/// Start an onboarding flow for this device.
///
/// Runs the splash step: saved language preferences are loaded and, if the
/// `session` cookie names a live session, the flow finishes at home at once.
#[utoipa::path(
    post,
    path = "/flows",
    responses(
        (status = 201, description = "Flow started", body = FlowResponse),
        (status = 400, description = "Missing x-device-id header", body = ErrorResponse)
    ),
    params(
        ("x-device-id" = String, Header, description = "Stable identifier of the calling device.")
    )
)]
pub async fn create_flow_handler(
    State(state): State<Arc<AppState>>,
    Extension(DeviceId(device_id)): Extension<DeviceId>,
    headers: HeaderMap,
) -> Result<Response, HandlerError> {
    let flow = state.new_flow(&device_id, session_cookie(&headers));
    let outcome = flow
        .controller
        .start()
        .await
        .map_err(|e| flow_failure(&flow, e))?;

    let body = flow_response(&flow, outcome);
    if body.finished {
        info!(flow_id = %flow.id, "Flow finished at splash");
    } else {
        info!(flow_id = %flow.id, "Flow started");
        state.flows.insert(flow).await;
    }
    Ok((StatusCode::CREATED, Json(body)).into_response())
}

/// Get the current state of a flow.
#[utoipa::path(
    get,
    path = "/flows/{flow_id}",
    responses(
        (status = 200, description = "Current flow state", body = FlowResponse),
        (status = 404, description = "No such flow for this device", body = ErrorResponse)
    ),
    params(
        ("flow_id" = Uuid, Path, description = "The flow id returned on creation."),
        ("x-device-id" = String, Header, description = "Stable identifier of the calling device.")
    )
)]
pub async fn get_flow_handler(
    State(state): State<Arc<AppState>>,
    Extension(DeviceId(device_id)): Extension<DeviceId>,
    Path(flow_id): Path<Uuid>,
) -> Result<Json<FlowResponse>, HandlerError> {
    let flow = state
        .flows
        .get(flow_id, &device_id)
        .await
        .ok_or_else(|| flow_not_found(flow_id))?;

    let progress = flow.controller.progress();
    Ok(Json(flow_response(
        &flow,
        Outcome {
            step: progress.step,
            notice: None,
            session: None,
        },
    )))
}

/// Attempt an action on the flow's current step.
///
/// The body is an action tagged by `type`, e.g. `{"type":"select_language","code":"vi"}`.
/// Sets the `session` cookie when the action signs the user in.
#[utoipa::path(
    post,
    path = "/flows/{flow_id}/actions",
    request_body(content = Object, description = "An action tagged by `type`."),
    responses(
        (status = 200, description = "Action applied", body = FlowResponse),
        (status = 404, description = "No such flow for this device", body = ErrorResponse),
        (status = 409, description = "Action not available now, or another is pending", body = ErrorResponse),
        (status = 422, description = "Input rejected", body = ErrorResponse),
        (status = 502, description = "A backing service failed", body = ErrorResponse)
    ),
    params(
        ("flow_id" = Uuid, Path, description = "The flow id returned on creation."),
        ("x-device-id" = String, Header, description = "Stable identifier of the calling device.")
    )
)]
pub async fn flow_action_handler(
    State(state): State<Arc<AppState>>,
    Extension(DeviceId(device_id)): Extension<DeviceId>,
    Path(flow_id): Path<Uuid>,
    Json(action): Json<Action>,
) -> Result<Response, HandlerError> {
    let flow = state
        .flows
        .get(flow_id, &device_id)
        .await
        .ok_or_else(|| flow_not_found(flow_id))?;

    let mut outcome = flow
        .controller
        .attempt(action)
        .await
        .map_err(|e| flow_failure(&flow, e))?;

    let session = outcome.session.take();
    let body = flow_response(&flow, outcome);
    if body.finished {
        info!(%flow_id, "Flow finished");
        state.flows.remove(flow_id).await;
    }
    with_session_cookie(Json(body).into_response(), session.as_ref())
}
