//! In-process session store keyed by a `sid` cookie.
//!
//! Single-node deployment, so sessions live in memory; restarting the
//! server logs everyone out, which matches the original behavior.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::http::HeaderMap;

pub const SESSION_COOKIE: &str = "sid";

/// Sessions older than this are discarded on lookup.
const SESSION_TTL_SECS: i64 = 30 * 24 * 60 * 60;

/// Authenticated user attached to a session.
#[derive(Debug, Clone)]
pub struct SessionUser {
    pub user_id: String,
    pub name: String,
    pub avatar_url: String,
    pub created_at: i64,
}

#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<Mutex<HashMap<String, SessionUser>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint a new session and return its id.
    pub fn create(&self, user: SessionUser) -> String {
        let sid = uuid::Uuid::new_v4().to_string();
        let mut sessions = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        sessions.insert(sid.clone(), user);
        sid
    }

    /// Look up a session, evicting it if it has outlived the TTL.
    pub fn get(&self, sid: &str) -> Option<SessionUser> {
        let mut sessions = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let user = sessions.get(sid).cloned()?;
        if chrono::Utc::now().timestamp() - user.created_at > SESSION_TTL_SECS {
            sessions.remove(sid);
            return None;
        }
        Some(user)
    }

    pub fn destroy(&self, sid: &str) {
        let mut sessions = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        sessions.remove(sid);
    }
}

/// Pull the session id out of the request's `Cookie` header.
pub fn session_id_from_headers(headers: &HeaderMap) -> Option<String> {
    let cookies = headers.get(axum::http::header::COOKIE)?.to_str().ok()?;
    cookies.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == SESSION_COOKIE && !value.is_empty()).then(|| value.to_string())
    })
}

/// `Set-Cookie` value establishing a session.
pub fn set_cookie_value(sid: &str) -> String {
    format!("{SESSION_COOKIE}={sid}; Path=/; HttpOnly; SameSite=Lax")
}

/// `Set-Cookie` value clearing the session cookie.
pub fn clear_cookie_value() -> String {
    format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::COOKIE;

    fn headers_with_cookie(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, value.parse().unwrap());
        headers
    }

    fn session_user(created_at: i64) -> SessionUser {
        SessionUser {
            user_id: "fb-1".into(),
            name: "Alice".into(),
            avatar_url: String::new(),
            created_at,
        }
    }

    #[test]
    fn test_session_round_trip() {
        let store = SessionStore::new();
        let sid = store.create(session_user(chrono::Utc::now().timestamp()));

        let user = store.get(&sid).unwrap();
        assert_eq!(user.user_id, "fb-1");

        store.destroy(&sid);
        assert!(store.get(&sid).is_none());
    }

    #[test]
    fn test_session_expiry() {
        let store = SessionStore::new();
        let now = chrono::Utc::now().timestamp();

        let fresh = store.create(session_user(now));
        let stale = store.create(session_user(now - SESSION_TTL_SECS - 1));

        assert!(store.get(&fresh).is_some());
        // Expired sessions are evicted on lookup
        assert!(store.get(&stale).is_none());
        assert!(store.get(&stale).is_none());
    }

    #[test]
    fn test_cookie_parsing() {
        let headers = headers_with_cookie("theme=dark; sid=abc123; lang=en");
        assert_eq!(session_id_from_headers(&headers).as_deref(), Some("abc123"));

        let headers = headers_with_cookie("theme=dark");
        assert!(session_id_from_headers(&headers).is_none());

        // Empty value is treated as no session
        let headers = headers_with_cookie("sid=");
        assert!(session_id_from_headers(&headers).is_none());

        assert!(session_id_from_headers(&HeaderMap::new()).is_none());
    }
}
