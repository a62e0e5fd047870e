//! Favourite membership: idempotent add/remove and the atomic toggle.

use rusqlite::OptionalExtension;

use crate::{Database, DbError};

impl Database {
    /// Idempotent: adding an existing favourite is a no-op.
    pub fn add_favourite(&self, user_id: &str, movie_id: i64) -> Result<(), DbError> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT OR IGNORE INTO favourites (user_id, movie_id) VALUES (?1, ?2)",
                rusqlite::params![user_id, movie_id],
            )?;
            Ok(())
        })
    }

    /// Idempotent: removing a non-existent favourite is a no-op.
    pub fn remove_favourite(&self, user_id: &str, movie_id: i64) -> Result<(), DbError> {
        self.with_conn(|conn| {
            conn.execute(
                "DELETE FROM favourites WHERE user_id = ?1 AND movie_id = ?2",
                rusqlite::params![user_id, movie_id],
            )?;
            Ok(())
        })
    }

    /// Toggle the favourite state for a (user, movie) pair and return the
    /// new state. Delete-then-insert inside one transaction, so concurrent
    /// toggles for the same pair cannot interleave between the existence
    /// check and the mutation. Any error rolls back to the last committed
    /// state.
    pub fn toggle_favourite(&self, user_id: &str, movie_id: i64) -> Result<bool, DbError> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;
            let deleted = tx.execute(
                "DELETE FROM favourites WHERE user_id = ?1 AND movie_id = ?2",
                rusqlite::params![user_id, movie_id],
            )?;
            let favourited = if deleted == 0 {
                tx.execute(
                    "INSERT OR IGNORE INTO favourites (user_id, movie_id) VALUES (?1, ?2)",
                    rusqlite::params![user_id, movie_id],
                )?;
                true
            } else {
                false
            };
            tx.commit()?;
            Ok(favourited)
        })
    }

    pub fn is_favourited(&self, user_id: &str, movie_id: i64) -> Result<bool, DbError> {
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare("SELECT 1 FROM favourites WHERE user_id = ?1 AND movie_id = ?2")?;
            let row = stmt
                .query_row(rusqlite::params![user_id, movie_id], |_| Ok(()))
                .optional()?;
            Ok(row.is_some())
        })
    }
}
