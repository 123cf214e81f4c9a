//! services/api/src/web/middleware.rs
//!
//! Request middleware and header helpers.

use axum::{
    extract::Request,
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use tracing::debug;

use crate::web::protocol::ErrorResponse;

pub const DEVICE_ID_HEADER: &str = "x-device-id";
pub const SESSION_COOKIE: &str = "session";

/// The device a request comes from. Preferences and flows are scoped to it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeviceId(pub String);

/// Middleware that reads the `x-device-id` header.
///
/// If present, inserts a [`DeviceId`] into request extensions for handlers to use.
/// If missing or blank, returns 400 Bad Request.
pub async fn require_device(mut req: Request, next: Next) -> Response {
    let device_id = req
        .headers()
        .get(DEVICE_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string);

    let Some(device_id) = device_id else {
        debug!("Rejecting request without a device id");
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                message: format!("{} header is required", DEVICE_ID_HEADER),
            }),
        )
            .into_response();
    };

    req.extensions_mut().insert(DeviceId(device_id));
    next.run(req).await
}

/// The auth session id from the `session` cookie, if any.
pub fn session_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .find_map(|c| {
            c.trim()
                .strip_prefix(SESSION_COOKIE)
                .and_then(|rest| rest.strip_prefix('='))
        })
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}

/// A `Set-Cookie` value carrying `session_id` for `max_age`.
pub fn session_set_cookie(session_id: &str, max_age: chrono::Duration) -> String {
    format!(
        "{}={}; HttpOnly; Secure; SameSite=Lax; Path=/; Max-Age={}",
        SESSION_COOKIE,
        session_id,
        max_age.num_seconds().max(0)
    )
}
