//! Poll management and voting endpoints.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::app::SharedState;

use super::{current_user, err_json, user_context};

type ApiResult = Result<Json<Value>, (axum::http::StatusCode, Json<Value>)>;

#[derive(Debug, Deserialize)]
pub struct CreatePollBody {
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct MovieBody {
    pub movie_id: i64,
}

/// GET /admin/ — all polls with their options and current tallies.
pub async fn list_polls(State(state): State<SharedState>, headers: HeaderMap) -> ApiResult {
    let user = current_user(&state, &headers);
    let polls = state
        .db()
        .get_all_polls()
        .map_err(|e| err_json(500, &e.to_string()))?;

    let mut out = Vec::with_capacity(polls.len());
    for poll in polls {
        let options = state
            .db()
            .get_poll_options(poll.id)
            .map_err(|e| err_json(500, &e.to_string()))?;
        let tallies = state
            .db()
            .get_poll_tallies(poll.id)
            .map_err(|e| err_json(500, &e.to_string()))?;
        out.push(json!({
            "poll": poll,
            "options": options,
            "tallies": tallies,
        }));
    }

    Ok(Json(json!({
        "user": user_context(user.as_ref()),
        "polls": out,
    })))
}

/// POST /admin/polls
pub async fn create_poll(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Json(body): Json<CreatePollBody>,
) -> ApiResult {
    let Some(user) = current_user(&state, &headers) else {
        return Err(err_json(401, "not logged in"));
    };

    let poll = state
        .db()
        .create_poll(&user.user_id, body.description.trim())
        .map_err(|e| err_json(500, &e.to_string()))?;
    Ok(Json(json!({ "status": "ok", "poll": poll })))
}

/// POST /admin/polls/{poll_id}/options
pub async fn add_option(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(poll_id): Path<i64>,
    Json(body): Json<MovieBody>,
) -> ApiResult {
    if current_user(&state, &headers).is_none() {
        return Err(err_json(401, "not logged in"));
    }
    ensure_poll_exists(&state, poll_id)?;

    state
        .db()
        .add_poll_option(poll_id, body.movie_id)
        .map_err(|e| err_json(500, &e.to_string()))?;
    let options = state
        .db()
        .get_poll_options(poll_id)
        .map_err(|e| err_json(500, &e.to_string()))?;
    Ok(Json(json!({ "status": "ok", "options": options })))
}

/// POST /api/1/polls/{poll_id}/vote — cast or replace the caller's vote.
pub async fn cast_vote(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(poll_id): Path<i64>,
    Json(body): Json<MovieBody>,
) -> ApiResult {
    let Some(user) = current_user(&state, &headers) else {
        return Ok(Json(json!({
            "success": false,
            "message": "not logged in",
        })));
    };
    ensure_poll_exists(&state, poll_id)?;

    let options = state
        .db()
        .get_poll_options(poll_id)
        .map_err(|e| err_json(500, &e.to_string()))?;
    if !options.iter().any(|o| o.movie_id == body.movie_id) {
        return Err(err_json(400, "movie is not an option in this poll"));
    }

    state
        .db()
        .cast_vote(poll_id, &user.user_id, body.movie_id)
        .map_err(|e| err_json(500, &e.to_string()))?;
    Ok(Json(json!({ "vote": body.movie_id })))
}

fn ensure_poll_exists(
    state: &SharedState,
    poll_id: i64,
) -> Result<(), (axum::http::StatusCode, Json<Value>)> {
    let poll = state
        .db()
        .get_poll(poll_id)
        .map_err(|e| err_json(500, &e.to_string()))?;
    if poll.is_none() {
        return Err(err_json(404, "poll not found"));
    }
    Ok(())
}
