//! Runtime application configuration loaded from the environment.

/// Runtime configuration. Immutable once the server is up.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_path: String,
    pub server_port: u16,
    pub client_id: String,
    pub client_secret: String,
    pub redirect_url: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: "rankings.db".into(),
            server_port: 8080,
            client_id: String::new(),
            client_secret: String::new(),
            redirect_url: "http://localhost:8080/auth/callback".into(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset.
    pub fn load() -> Self {
        let defaults = Self::default();
        let g = |key: &str, fallback: String| -> String {
            std::env::var(key)
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(fallback)
        };

        let server_port = std::env::var("SERVER_PORT")
            .ok()
            .and_then(|v| v.parse::<u16>().ok())
            .unwrap_or(defaults.server_port);

        Self {
            database_path: g("DATABASE_PATH", defaults.database_path),
            server_port,
            client_id: g("OAUTH_CLIENT_ID", defaults.client_id),
            client_secret: g("OAUTH_CLIENT_SECRET", defaults.client_secret),
            redirect_url: g("OAUTH_REDIRECT_URL", defaults.redirect_url),
        }
    }
}
