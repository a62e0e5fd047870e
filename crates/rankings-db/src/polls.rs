//! Polls: candidate movie options and single-vote-per-user tallies.

use rusqlite::OptionalExtension;
use serde::{Deserialize, Serialize};

use crate::{Database, DbError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Poll {
    pub id: i64,
    pub creator_user_id: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollOption {
    pub id: i64,
    pub poll_id: i64,
    pub movie_id: i64,
}

/// Vote count for one candidate movie in a poll.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollTally {
    pub movie_id: i64,
    pub votes: i64,
}

impl Database {
    pub fn create_poll(&self, creator_user_id: &str, description: &str) -> Result<Poll, DbError> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO polls (creator_user_id, description) VALUES (?1, ?2)",
                rusqlite::params![creator_user_id, description],
            )?;
            Ok(Poll {
                id: conn.last_insert_rowid(),
                creator_user_id: creator_user_id.to_string(),
                description: description.to_string(),
            })
        })
    }

    pub fn get_poll(&self, poll_id: i64) -> Result<Option<Poll>, DbError> {
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare("SELECT id, creator_user_id, description FROM polls WHERE id = ?1")?;
            let poll = stmt
                .query_row([poll_id], |row| {
                    Ok(Poll {
                        id: row.get(0)?,
                        creator_user_id: row.get(1)?,
                        description: row.get(2)?,
                    })
                })
                .optional()?;
            Ok(poll)
        })
    }

    pub fn get_all_polls(&self) -> Result<Vec<Poll>, DbError> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT id, creator_user_id, description FROM polls ORDER BY id")?;
            let rows = stmt.query_map([], |row| {
                Ok(Poll {
                    id: row.get(0)?,
                    creator_user_id: row.get(1)?,
                    description: row.get(2)?,
                })
            })?;
            rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
        })
    }

    /// Add a candidate movie to a poll. A movie may appear once per poll;
    /// re-adding is a no-op.
    pub fn add_poll_option(&self, poll_id: i64, movie_id: i64) -> Result<(), DbError> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT OR IGNORE INTO poll_options (poll_id, movie_id) VALUES (?1, ?2)",
                rusqlite::params![poll_id, movie_id],
            )?;
            Ok(())
        })
    }

    /// Candidate movies in insertion order.
    pub fn get_poll_options(&self, poll_id: i64) -> Result<Vec<PollOption>, DbError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, poll_id, movie_id FROM poll_options WHERE poll_id = ?1 ORDER BY id",
            )?;
            let rows = stmt.query_map([poll_id], |row| {
                Ok(PollOption {
                    id: row.get(0)?,
                    poll_id: row.get(1)?,
                    movie_id: row.get(2)?,
                })
            })?;
            rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
        })
    }

    /// Cast a vote. A user holds at most one vote per poll; voting again
    /// replaces the previous vote in a single upsert statement.
    pub fn cast_vote(&self, poll_id: i64, user_id: &str, movie_id: i64) -> Result<(), DbError> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO poll_votes (poll_id, movie_id, user_id) VALUES (?1, ?2, ?3) \
                 ON CONFLICT(poll_id, user_id) DO UPDATE SET movie_id = excluded.movie_id",
                rusqlite::params![poll_id, movie_id, user_id],
            )?;
            Ok(())
        })
    }

    pub fn get_user_vote(&self, poll_id: i64, user_id: &str) -> Result<Option<i64>, DbError> {
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare("SELECT movie_id FROM poll_votes WHERE poll_id = ?1 AND user_id = ?2")?;
            let movie_id = stmt
                .query_row(rusqlite::params![poll_id, user_id], |row| {
                    row.get::<_, i64>(0)
                })
                .optional()?;
            Ok(movie_id)
        })
    }

    /// Vote counts per candidate movie, most votes first.
    pub fn get_poll_tallies(&self, poll_id: i64) -> Result<Vec<PollTally>, DbError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT movie_id, COUNT(*) AS votes FROM poll_votes \
                 WHERE poll_id = ?1 GROUP BY movie_id ORDER BY votes DESC, movie_id",
            )?;
            let rows = stmt.query_map([poll_id], |row| {
                Ok(PollTally {
                    movie_id: row.get(0)?,
                    votes: row.get(1)?,
                })
            })?;
            rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
        })
    }
}
