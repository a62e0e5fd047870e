//! OAuth code-exchange flow for the identity provider.
//!
//! Handles authorization URL generation and exchanging the callback code
//! for an access token. Everything past that (session state) belongs to
//! the application.

use chrono::Utc;
use serde::Deserialize;
use url::Url;

use crate::{AccessToken, IdentityError, SCOPES};

const AUTHORIZE_URL: &str = "https://www.facebook.com/v3.2/dialog/oauth";
const TOKEN_URL: &str = "https://graph.facebook.com/v3.2/oauth/access_token";

/// Token response from the provider's token endpoint.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    #[serde(rename = "type")]
    error_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: Option<ErrorBody>,
}

/// Manages the OAuth login flow against the identity provider.
pub struct IdentityAuth {
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    http: reqwest::Client,
}

impl IdentityAuth {
    pub fn new(client_id: String, client_secret: String, redirect_uri: String) -> Self {
        Self {
            client_id,
            client_secret,
            redirect_uri,
            http: reqwest::Client::new(),
        }
    }

    /// Generate the authorization URL the browser is redirected to.
    pub fn authorize_url(&self) -> Result<String, IdentityError> {
        let mut url = Url::parse(AUTHORIZE_URL)?;
        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", &self.client_id)
            .append_pair("redirect_uri", &self.redirect_uri)
            .append_pair("scope", &SCOPES.join(" "));
        Ok(url.to_string())
    }

    /// Exchange the callback authorization code for an access token.
    pub async fn exchange_code(&self, code: &str) -> Result<AccessToken, IdentityError> {
        let params = [
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("redirect_uri", self.redirect_uri.as_str()),
            ("code", code),
        ];

        let resp = self.http.get(TOKEN_URL).query(&params).send().await?;
        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            let err: ErrorResponse = serde_json::from_str(&body).unwrap_or(ErrorResponse {
                error: Some(ErrorBody {
                    message: Some(body.clone()),
                    error_type: Some(status.to_string()),
                }),
            });
            let detail = err.error.unwrap_or(ErrorBody {
                message: None,
                error_type: None,
            });
            return Err(IdentityError::ExchangeFailed(format!(
                "{}: {}",
                detail.error_type.unwrap_or_default(),
                detail.message.unwrap_or_default()
            )));
        }

        let token: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| IdentityError::ExchangeFailed(format!("failed to parse response: {e}")))?;

        // Provider default is roughly 60 days; fall back to an hour.
        let expires_at = Utc::now().timestamp() + token.expires_in.unwrap_or(3600);

        Ok(AccessToken {
            access_token: token.access_token,
            expires_at,
        })
    }
}
