//! User lookup and registration keyed by the external identity id.

use rusqlite::OptionalExtension;
use serde::{Deserialize, Serialize};

use crate::{Database, DbError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// External identity provider id.
    pub id: String,
    pub name: String,
}

/// Typed outcome of a registration attempt. Duplicate registration is an
/// expected case, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RegisterOutcome {
    Registered,
    AlreadyRegistered,
}

impl RegisterOutcome {
    pub fn success(self) -> bool {
        matches!(self, RegisterOutcome::Registered)
    }

    pub fn message(self) -> &'static str {
        match self {
            RegisterOutcome::Registered => "user registered",
            RegisterOutcome::AlreadyRegistered => "user already registered",
        }
    }
}

impl Database {
    pub fn get_user(&self, user_id: &str) -> Result<Option<User>, DbError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT id, name FROM users WHERE id = ?1")?;
            let user = stmt
                .query_row([user_id], |row| {
                    Ok(User {
                        id: row.get(0)?,
                        name: row.get(1)?,
                    })
                })
                .optional()?;
            Ok(user)
        })
    }

    /// Register a user under their external identity id. A second attempt
    /// for the same id reports [`RegisterOutcome::AlreadyRegistered`].
    pub fn register_user(&self, user_id: &str, name: &str) -> Result<RegisterOutcome, DbError> {
        self.with_conn(|conn| {
            let inserted = conn.execute(
                "INSERT INTO users (id, name) VALUES (?1, ?2)",
                rusqlite::params![user_id, name],
            );
            match inserted {
                Ok(_) => Ok(RegisterOutcome::Registered),
                Err(rusqlite::Error::SqliteFailure(e, _))
                    if e.code == rusqlite::ErrorCode::ConstraintViolation =>
                {
                    Ok(RegisterOutcome::AlreadyRegistered)
                }
                Err(e) => Err(e.into()),
            }
        })
    }

    /// Identity collaborator entry point: look up the user, registering
    /// them on first login.
    pub fn get_or_create_user(&self, user_id: &str, name: &str) -> Result<User, DbError> {
        if let Some(user) = self.get_user(user_id)? {
            return Ok(user);
        }
        let outcome = self.register_user(user_id, name)?;
        if outcome == RegisterOutcome::AlreadyRegistered {
            tracing::debug!(user_id, "lost registration race, re-reading user");
        }
        self.get_user(user_id)?
            .ok_or_else(|| DbError::NotFound(format!("user {user_id}")))
    }
}
