//! Identity provider client library.
//!
//! Provides OAuth authentication against the external identity provider
//! plus profile and avatar lookups. The application only ever needs the
//! provider-issued user id, display name, and profile picture URL.

pub mod api;
pub mod auth;

use serde::{Deserialize, Serialize};

/// Access token issued by the identity provider.
///
/// The caller is responsible for holding on to this for the session
/// lifetime; tokens are never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    pub expires_at: i64,
}

/// Fallback profile picture when the avatar lookup fails.
pub const DEFAULT_AVATAR_URL: &str = "https://i.imgur.com/IGUApaz.jpg";

/// Unified error type for the identity-client crate.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Code exchange failed: {0}")]
    ExchangeFailed(String),

    #[error("Identity API error (status {status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),
}

/// OAuth scopes requested from the provider.
pub const SCOPES: &[&str] = &["public_profile"];
