use std::sync::Arc;

use identity_client::api::IdentityApiClient;
use identity_client::auth::IdentityAuth;
use rankings_db::Database;

use crate::config::AppConfig;
use crate::session::SessionStore;

/// Application shared state accessible from all axum handlers.
#[derive(Clone)]
pub struct SharedState {
    inner: Arc<SharedStateInner>,
}

struct SharedStateInner {
    /// Database handle
    db: Database,
    /// Application configuration
    config: AppConfig,
    /// Logged-in sessions
    sessions: SessionStore,
    /// OAuth flow against the identity provider
    auth: IdentityAuth,
    /// Profile/avatar lookups
    identity_api: IdentityApiClient,
}

impl SharedState {
    /// Create shared state from an already-opened database and loaded config.
    pub fn new(db: Database, config: AppConfig) -> Self {
        let auth = IdentityAuth::new(
            config.client_id.clone(),
            config.client_secret.clone(),
            config.redirect_url.clone(),
        );

        Self {
            inner: Arc::new(SharedStateInner {
                db,
                config,
                sessions: SessionStore::new(),
                auth,
                identity_api: IdentityApiClient::new(),
            }),
        }
    }

    pub fn db(&self) -> &Database {
        &self.inner.db
    }

    pub fn server_port(&self) -> u16 {
        self.inner.config.server_port
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.inner.sessions
    }

    pub fn auth(&self) -> &IdentityAuth {
        &self.inner.auth
    }

    pub fn identity_api(&self) -> &IdentityApiClient {
        &self.inner.identity_api
    }
}
