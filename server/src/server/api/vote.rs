//! Favourite toggle endpoint.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use serde_json::{Value, json};

use crate::app::SharedState;

use super::{current_user, err_json};

type ApiResult = Result<Json<Value>, (axum::http::StatusCode, Json<Value>)>;

/// GET /api/1/vote/{movie_id} — toggle a favourite for the session user.
///
/// Unauthenticated callers get a typed failure payload, not an HTTP error;
/// the frontend shows the login prompt off the `success` field.
pub async fn toggle_favourite(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(movie_id): Path<i64>,
) -> ApiResult {
    let Some(user) = current_user(&state, &headers) else {
        return Ok(Json(json!({
            "success": false,
            "message": "not logged in",
        })));
    };

    let favourited = state
        .db()
        .toggle_favourite(&user.user_id, movie_id)
        .map_err(|e| err_json(500, &e.to_string()))?;

    Ok(Json(json!({ "vote": favourited })))
}
