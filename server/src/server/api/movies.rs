//! Movie feed, search, and profile endpoints.

use axum::extract::{Form, Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::app::SharedState;

use super::{current_user, err_json, user_context};

type ApiResult = Result<Json<Value>, (axum::http::StatusCode, Json<Value>)>;

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub terms: Option<String>,
}

/// Split a raw search string into terms, dropping empty tokens.
fn tokenize_terms(raw: &str) -> Vec<String> {
    raw.split_whitespace().map(str::to_string).collect()
}

/// GET / — home feed, most popular movies first.
pub async fn home(State(state): State<SharedState>, headers: HeaderMap) -> ApiResult {
    let user = current_user(&state, &headers);
    let movies = state
        .db()
        .get_popular_movies(user.as_ref().map(|u| u.user_id.as_str()))
        .map_err(|e| err_json(500, &e.to_string()))?;
    Ok(Json(json!({
        "user": user_context(user.as_ref()),
        "movies": movies,
    })))
}

/// GET /top — movies most favourited by our users.
pub async fn top_favourited(State(state): State<SharedState>, headers: HeaderMap) -> ApiResult {
    let user = current_user(&state, &headers);
    let movies = state
        .db()
        .get_top_favourited_movies(user.as_ref().map(|u| u.user_id.as_str()))
        .map_err(|e| err_json(500, &e.to_string()))?;
    Ok(Json(json!({
        "user": user_context(user.as_ref()),
        "movies": movies,
    })))
}

/// GET /search?terms=...
pub async fn search_get(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Query(params): Query<SearchParams>,
) -> ApiResult {
    run_search(&state, &headers, params.terms.as_deref().unwrap_or_default())
}

/// POST /search with form field `terms`.
pub async fn search_post(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Form(params): Form<SearchParams>,
) -> ApiResult {
    run_search(&state, &headers, params.terms.as_deref().unwrap_or_default())
}

fn run_search(state: &SharedState, headers: &HeaderMap, raw_terms: &str) -> ApiResult {
    let user = current_user(state, headers);
    let terms = tokenize_terms(raw_terms);

    // A blank query is an empty result page, not an error.
    let movies = if terms.is_empty() {
        Vec::new()
    } else {
        state
            .db()
            .search_movies(&terms, user.as_ref().map(|u| u.user_id.as_str()))
            .map_err(|e| err_json(500, &e.to_string()))?
    };

    Ok(Json(json!({
        "user": user_context(user.as_ref()),
        "terms": terms,
        "movies": movies,
    })))
}

/// GET /user/{user_id} — a user's favourited movies, flagged for the viewer.
pub async fn user_profile(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(user_id): Path<String>,
) -> ApiResult {
    let viewer = current_user(&state, &headers);
    let profile_user = state
        .db()
        .get_user(&user_id)
        .map_err(|e| err_json(500, &e.to_string()))?;
    let movies = state
        .db()
        .get_fav_movies(&user_id, viewer.as_ref().map(|u| u.user_id.as_str()))
        .map_err(|e| err_json(500, &e.to_string()))?;

    Ok(Json(json!({
        "user": user_context(viewer.as_ref()),
        "profile": profile_user.map(|u| json!({ "id": u.id, "name": u.name })),
        "movies": movies,
    })))
}

#[cfg(test)]
mod tests {
    use super::tokenize_terms;

    #[test]
    fn test_tokenize_terms() {
        assert_eq!(tokenize_terms("inter stellar"), vec!["inter", "stellar"]);
        assert_eq!(tokenize_terms("  inter   stellar  "), vec!["inter", "stellar"]);
        assert!(tokenize_terms("").is_empty());
        assert!(tokenize_terms("   ").is_empty());
    }
}
