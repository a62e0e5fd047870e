//! Login flow against the external identity provider.

use axum::Json;
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::http::header::SET_COOKIE;
use axum::response::{AppendHeaders, IntoResponse, Redirect, Response};
use serde::Deserialize;
use serde_json::Value;

use crate::app::SharedState;
use crate::session::{self, SessionUser};

use super::err_json;

type AuthResult = Result<Response, (axum::http::StatusCode, Json<Value>)>;

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
}

/// GET /auth/login — send the browser to the provider's consent page.
pub async fn login(State(state): State<SharedState>) -> AuthResult {
    let url = state
        .auth()
        .authorize_url()
        .map_err(|e| err_json(500, &e.to_string()))?;
    Ok(Redirect::temporary(&url).into_response())
}

/// GET /auth/callback?code=... — finish the OAuth flow.
///
/// Exchanges the code, fetches the profile, registers the user on first
/// login, and mints a session cookie.
pub async fn callback(
    State(state): State<SharedState>,
    Query(params): Query<CallbackParams>,
) -> AuthResult {
    let Some(code) = params.code.filter(|c| !c.is_empty()) else {
        return Err(err_json(400, "missing authorization code"));
    };

    let token = state
        .auth()
        .exchange_code(&code)
        .await
        .map_err(|e| err_json(502, &e.to_string()))?;
    let profile = state
        .identity_api()
        .get_profile(&token)
        .await
        .map_err(|e| err_json(502, &e.to_string()))?;

    let user = state
        .db()
        .get_or_create_user(&profile.id, &profile.name)
        .map_err(|e| err_json(500, &e.to_string()))?;
    let avatar_url = state.identity_api().get_avatar_url(&token, &user.id).await;

    tracing::info!(user_id = %user.id, "user logged in");
    let sid = state.sessions().create(SessionUser {
        user_id: user.id,
        name: user.name,
        avatar_url,
        created_at: chrono::Utc::now().timestamp(),
    });

    let cookie = session::set_cookie_value(&sid);
    Ok((AppendHeaders([(SET_COOKIE, cookie)]), Redirect::to("/")).into_response())
}

/// GET /auth/logout — drop the session and clear the cookie.
pub async fn logout(State(state): State<SharedState>, headers: HeaderMap) -> Response {
    if let Some(sid) = session::session_id_from_headers(&headers) {
        state.sessions().destroy(&sid);
    }
    let cookie = session::clear_cookie_value();
    (AppendHeaders([(SET_COOKIE, cookie)]), Redirect::to("/")).into_response()
}
