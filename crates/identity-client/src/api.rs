//! Graph API client for profile and avatar lookups.

use serde::Deserialize;

use crate::{AccessToken, DEFAULT_AVATAR_URL, IdentityError};

const GRAPH_BASE: &str = "https://graph.facebook.com/v3.2";

/// Authenticated account profile from GET /me.
#[derive(Debug, Clone, Deserialize)]
pub struct Profile {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
struct PictureData {
    url: String,
}

#[derive(Debug, Deserialize)]
struct PictureResponse {
    data: PictureData,
}

/// Client for the identity provider's Graph API.
pub struct IdentityApiClient {
    http: reqwest::Client,
}

impl Default for IdentityApiClient {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentityApiClient {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
        }
    }

    /// Fetch the authenticated user's id and display name.
    pub async fn get_profile(&self, token: &AccessToken) -> Result<Profile, IdentityError> {
        let url = format!("{GRAPH_BASE}/me");
        let resp = self
            .http
            .get(&url)
            .query(&[
                ("fields", "id,name"),
                ("access_token", token.access_token.as_str()),
            ])
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(IdentityError::ApiError {
                status: status.as_u16(),
                message: body,
            });
        }
        Ok(serde_json::from_str(&body)?)
    }

    /// Fetch a user's profile picture URL. Avatar lookup is cosmetic: any
    /// failure falls back to [`DEFAULT_AVATAR_URL`].
    pub async fn get_avatar_url(&self, token: &AccessToken, user_id: &str) -> String {
        match self.fetch_avatar_url(token, user_id).await {
            Ok(url) => url,
            Err(e) => {
                tracing::debug!(user_id, "avatar lookup failed, using default: {e}");
                DEFAULT_AVATAR_URL.to_string()
            }
        }
    }

    async fn fetch_avatar_url(
        &self,
        token: &AccessToken,
        user_id: &str,
    ) -> Result<String, IdentityError> {
        let url = format!("{GRAPH_BASE}/{user_id}/picture");
        let resp = self
            .http
            .get(&url)
            .query(&[
                ("redirect", "false"),
                ("access_token", token.access_token.as_str()),
            ])
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(IdentityError::ApiError {
                status: status.as_u16(),
                message: body,
            });
        }
        let picture: PictureResponse = serde_json::from_str(&body)?;
        Ok(picture.data.url)
    }
}
