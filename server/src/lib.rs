//! Movie rankings web application.
//!
//! Users log in via an external identity provider, browse and search the
//! movie catalog, mark favourites, and vote in polls. Persistence lives in
//! the `rankings-db` crate; this crate owns the HTTP surface.

pub mod app;
pub mod config;
pub mod server;
pub mod session;

use rankings_db::Database;

use crate::config::AppConfig;

/// Load configuration and open the database.
pub fn init_foundation() -> anyhow::Result<(Database, AppConfig)> {
    let config = AppConfig::load();
    tracing::info!(path = %config.database_path, "Opening database");
    let db = Database::open(&config.database_path)?;
    Ok((db, config))
}
