//! JSON API handlers grouped by domain.

pub mod auth;
pub mod movies;
pub mod polls;
pub mod vote;

use axum::Json;
use axum::http::HeaderMap;
use serde_json::{Value, json};

use crate::app::SharedState;
use crate::session::{self, SessionUser};

/// Standard error response.
pub fn err_json(status: u16, message: &str) -> (axum::http::StatusCode, Json<Value>) {
    (
        axum::http::StatusCode::from_u16(status)
            .unwrap_or(axum::http::StatusCode::INTERNAL_SERVER_ERROR),
        Json(json!({ "status": "error", "error": message })),
    )
}

/// Resolve the session user from the request cookies, if any.
pub fn current_user(state: &SharedState, headers: &HeaderMap) -> Option<SessionUser> {
    let sid = session::session_id_from_headers(headers)?;
    state.sessions().get(&sid)
}

/// Viewer context included in page-level responses.
pub fn user_context(user: Option<&SessionUser>) -> Value {
    match user {
        Some(u) => json!({
            "authenticated": true,
            "id": u.user_id,
            "name": u.name,
            "avatar_url": u.avatar_url,
        }),
        None => json!({ "authenticated": false }),
    }
}
