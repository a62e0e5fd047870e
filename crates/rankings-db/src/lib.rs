//! SQLite database layer for the movie rankings application.

pub mod favourites;
pub mod movies;
pub mod polls;
pub mod schema;
pub mod users;

use std::path::Path;
use std::sync::{Arc, Mutex};

use rusqlite::Connection;

/// Thread-safe database handle wrapping a single SQLite connection.
///
/// Cheap to clone; writes are serialized by the inner mutex and SQLite's
/// WAL mode keeps readers unblocked.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open or create database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.configure()?;
        db.migrate()?;
        Ok(db)
    }

    /// Create an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.configure()?;
        db.migrate()?;
        Ok(db)
    }

    /// Access the underlying connection with a closure.
    pub fn with_conn<F, R>(&self, f: F) -> Result<R, DbError>
    where
        F: FnOnce(&Connection) -> Result<R, DbError>,
    {
        let conn = self.conn.lock().map_err(|_| DbError::LockPoisoned)?;
        f(&conn)
    }

    /// Access the underlying connection mutably (for transactions).
    pub fn with_conn_mut<F, R>(&self, f: F) -> Result<R, DbError>
    where
        F: FnOnce(&mut Connection) -> Result<R, DbError>,
    {
        let mut conn = self.conn.lock().map_err(|_| DbError::LockPoisoned)?;
        f(&mut conn)
    }

    fn configure(&self) -> Result<(), DbError> {
        self.with_conn(|conn| {
            conn.execute_batch(
                "PRAGMA journal_mode=WAL;
                 PRAGMA busy_timeout=5000;
                 PRAGMA foreign_keys=ON;",
            )?;
            Ok(())
        })
    }

    fn migrate(&self) -> Result<(), DbError> {
        self.with_conn(|conn| {
            schema::run_migrations(conn)?;
            Ok(())
        })
    }
}

/// Database error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Database lock poisoned")]
    LockPoisoned,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::movies::CatalogMovie;
    use crate::users::RegisterOutcome;

    fn test_db() -> Database {
        Database::open_in_memory().expect("Failed to create test DB")
    }

    fn movie(id: i64, title: &str, popularity: f64) -> CatalogMovie {
        CatalogMovie {
            id,
            title: title.into(),
            release_date: "2014-11-05".into(),
            overview: String::new(),
            language: "en".into(),
            poster_url: String::new(),
            backdrop_url: String::new(),
            genre_ids: vec![878, 12],
            vote_count: 0,
            vote_average: 0.0,
            popularity,
        }
    }

    fn seed_user(db: &Database, id: &str, name: &str) {
        assert!(db.register_user(id, name).unwrap().success());
    }

    #[test]
    fn test_open_and_migrate() {
        let db = test_db();
        // Tables exist and are empty
        assert!(db.get_all_polls().unwrap().is_empty());
        assert!(db.get_popular_movies(None).unwrap().is_empty());
    }

    #[test]
    fn test_register_user_unique() {
        let db = test_db();
        let first = db.register_user("fb-1", "Alice").unwrap();
        assert_eq!(first, RegisterOutcome::Registered);
        assert!(first.success());

        let second = db.register_user("fb-1", "Alice Again").unwrap();
        assert_eq!(second, RegisterOutcome::AlreadyRegistered);
        assert!(!second.success());
        assert_eq!(second.message(), "user already registered");

        // Still exactly one row, with the original name
        let user = db.get_user("fb-1").unwrap().unwrap();
        assert_eq!(user.name, "Alice");
    }

    #[test]
    fn test_get_or_create_user() {
        let db = test_db();
        assert!(db.get_user("fb-2").unwrap().is_none());

        let created = db.get_or_create_user("fb-2", "Bob").unwrap();
        assert_eq!(created.name, "Bob");

        // Second login keeps the existing record
        let again = db.get_or_create_user("fb-2", "Robert").unwrap();
        assert_eq!(again.name, "Bob");
    }

    #[test]
    fn test_toggle_favourite_round_trip() {
        let db = test_db();
        seed_user(&db, "u1", "Alice");
        db.upsert_movie(&movie(10, "Interstellar", 90.0)).unwrap();

        assert!(!db.is_favourited("u1", 10).unwrap());
        assert!(db.toggle_favourite("u1", 10).unwrap());
        assert!(db.is_favourited("u1", 10).unwrap());
        assert!(!db.toggle_favourite("u1", 10).unwrap());
        // Net state after two toggles equals the initial state
        assert!(!db.is_favourited("u1", 10).unwrap());
    }

    #[test]
    fn test_add_remove_favourite_idempotent() {
        let db = test_db();
        seed_user(&db, "u1", "Alice");
        db.upsert_movie(&movie(10, "Interstellar", 90.0)).unwrap();

        db.add_favourite("u1", 10).unwrap();
        db.add_favourite("u1", 10).unwrap();
        let favs = db.get_fav_movies("u1", None).unwrap();
        assert_eq!(favs.len(), 1);
        assert_eq!(favs[0].fav_count, 1);

        db.remove_favourite("u1", 10).unwrap();
        db.remove_favourite("u1", 10).unwrap();
        assert!(db.get_fav_movies("u1", None).unwrap().is_empty());
    }

    #[test]
    fn test_search_conjunction() {
        let db = test_db();
        db.upsert_movie(&movie(1, "Interstellar", 90.0)).unwrap();
        db.upsert_movie(&movie(2, "Intercept", 80.0)).unwrap();
        db.upsert_movie(&movie(3, "Stellar Days", 70.0)).unwrap();

        let hits = db
            .search_movies(&["inter".into(), "stellar".into()], None)
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "Interstellar");

        // Case-insensitive
        let hits = db.search_movies(&["INTER".into()], None).unwrap();
        assert_eq!(hits.len(), 2);

        // Terms are trimmed before matching
        let hits = db.search_movies(&[" stellar ".into()], None).unwrap();
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn test_search_contract_violations() {
        let db = test_db();
        assert!(matches!(
            db.search_movies(&[], None),
            Err(DbError::InvalidData(_))
        ));
        assert!(matches!(
            db.search_movies(&["ok".into(), "  ".into()], None),
            Err(DbError::InvalidData(_))
        ));
    }

    #[test]
    fn test_search_ordered_by_popularity() {
        let db = test_db();
        db.upsert_movie(&movie(1, "Alien", 50.0)).unwrap();
        db.upsert_movie(&movie(2, "Aliens", 90.0)).unwrap();
        db.upsert_movie(&movie(3, "Alien 3", 70.0)).unwrap();

        let hits = db.search_movies(&["alien".into()], None).unwrap();
        let pops: Vec<f64> = hits.iter().map(|m| m.popularity).collect();
        assert_eq!(pops, vec![90.0, 70.0, 50.0]);
    }

    #[test]
    fn test_favourite_flag_correctness() {
        let db = test_db();
        seed_user(&db, "u1", "Alice");
        seed_user(&db, "u2", "Bob");
        db.upsert_movie(&movie(1, "Interstellar", 90.0)).unwrap();
        db.upsert_movie(&movie(2, "Arrival", 80.0)).unwrap();
        db.upsert_movie(&movie(3, "Sunshine", 70.0)).unwrap();
        db.add_favourite("u1", 1).unwrap();
        db.add_favourite("u2", 2).unwrap();

        let listing = db.get_popular_movies(Some("u1")).unwrap();
        for m in &listing {
            assert_eq!(m.favourite, db.is_favourited("u1", m.id).unwrap());
        }
        // Anonymous viewer sees no flags
        let listing = db.get_popular_movies(None).unwrap();
        assert!(listing.iter().all(|m| !m.favourite));

        // The flag is viewer-relative on profile listings too
        let profile = db.get_fav_movies("u2", Some("u1")).unwrap();
        assert_eq!(profile.len(), 1);
        assert_eq!(profile[0].id, 2);
        assert!(!profile[0].favourite);
    }

    #[test]
    fn test_fav_count_aggregate() {
        let db = test_db();
        seed_user(&db, "u1", "Alice");
        seed_user(&db, "u2", "Bob");
        db.upsert_movie(&movie(1, "Interstellar", 90.0)).unwrap();
        db.add_favourite("u1", 1).unwrap();
        db.add_favourite("u2", 1).unwrap();

        let listing = db.get_popular_movies(None).unwrap();
        assert_eq!(listing[0].fav_count, 2);
    }

    #[test]
    fn test_top_favourited_ranking() {
        let db = test_db();
        seed_user(&db, "u1", "Alice");
        seed_user(&db, "u2", "Bob");

        let mut high_rated = movie(1, "Interstellar", 10.0);
        high_rated.vote_count = 5000;
        high_rated.vote_average = 8.6;
        let mut low_rated = movie(2, "Intercept", 99.0);
        low_rated.vote_count = 1000;
        low_rated.vote_average = 4.0;
        let mut crowd_pick = movie(3, "Arrival", 20.0);
        crowd_pick.vote_count = 100;
        crowd_pick.vote_average = 7.9;
        db.upsert_movies(&[high_rated, low_rated, crowd_pick])
            .unwrap();

        // Arrival has the most favourites; the other two tie on fav_count
        // and fall back to the weighted rating (vote_count/1000 * vote_average)
        db.add_favourite("u1", 3).unwrap();
        db.add_favourite("u2", 3).unwrap();
        db.add_favourite("u1", 1).unwrap();
        db.add_favourite("u2", 2).unwrap();

        let top = db.get_top_favourited_movies(None).unwrap();
        let ids: Vec<i64> = top.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![3, 1, 2]);
        // fav_count is non-increasing
        for pair in top.windows(2) {
            assert!(pair[0].fav_count >= pair[1].fav_count);
        }
    }

    #[test]
    fn test_popular_ordered_by_popularity() {
        let db = test_db();
        db.upsert_movie(&movie(1, "Sunshine", 40.0)).unwrap();
        db.upsert_movie(&movie(2, "Interstellar", 95.0)).unwrap();
        db.upsert_movie(&movie(3, "Arrival", 60.0)).unwrap();
        db.upsert_movie(&movie(4, "Moon", 60.0)).unwrap();

        let listing = db.get_popular_movies(None).unwrap();
        assert_eq!(listing.len(), 4);
        assert_eq!(listing[0].id, 2);
        for pair in listing.windows(2) {
            assert!(pair[0].popularity >= pair[1].popularity);
        }
    }

    #[test]
    fn test_get_fav_movies_absent_user() {
        let db = test_db();
        // Unknown user is an empty result, not an error
        assert!(db.get_fav_movies("nobody", None).unwrap().is_empty());
    }

    #[test]
    fn test_upsert_movie_refreshes_catalog() {
        let db = test_db();
        db.upsert_movie(&movie(1, "Interstelar", 90.0)).unwrap();

        let mut fixed = movie(1, "Interstellar", 95.0);
        fixed.vote_count = 30000;
        db.upsert_movie(&fixed).unwrap();

        let listing = db.get_popular_movies(None).unwrap();
        assert_eq!(listing.len(), 1);
        assert_eq!(listing[0].title, "Interstellar");
        assert_eq!(listing[0].vote_count, 30000);
        assert_eq!(listing[0].year, "2014");
        assert_eq!(listing[0].genre_ids, vec![878, 12]);
    }

    #[test]
    fn test_poll_options_unique_and_ordered() {
        let db = test_db();
        seed_user(&db, "u1", "Alice");
        db.upsert_movie(&movie(1, "Interstellar", 90.0)).unwrap();
        db.upsert_movie(&movie(2, "Arrival", 80.0)).unwrap();

        let poll = db.create_poll("u1", "best sci-fi").unwrap();
        db.add_poll_option(poll.id, 2).unwrap();
        db.add_poll_option(poll.id, 1).unwrap();
        db.add_poll_option(poll.id, 2).unwrap();

        let options = db.get_poll_options(poll.id).unwrap();
        let ids: Vec<i64> = options.iter().map(|o| o.movie_id).collect();
        assert_eq!(ids, vec![2, 1]);
    }

    #[test]
    fn test_poll_vote_overwrite() {
        let db = test_db();
        seed_user(&db, "u1", "Alice");
        seed_user(&db, "u2", "Bob");
        db.upsert_movie(&movie(1, "Interstellar", 90.0)).unwrap();
        db.upsert_movie(&movie(2, "Arrival", 80.0)).unwrap();

        let poll = db.create_poll("u1", "best sci-fi").unwrap();
        db.add_poll_option(poll.id, 1).unwrap();
        db.add_poll_option(poll.id, 2).unwrap();

        db.cast_vote(poll.id, "u1", 1).unwrap();
        db.cast_vote(poll.id, "u2", 1).unwrap();
        // Re-voting replaces the prior vote
        db.cast_vote(poll.id, "u1", 2).unwrap();

        assert_eq!(db.get_user_vote(poll.id, "u1").unwrap(), Some(2));
        assert_eq!(db.get_user_vote(poll.id, "u2").unwrap(), Some(1));

        let tallies = db.get_poll_tallies(poll.id).unwrap();
        assert_eq!(tallies.len(), 2);
        let total: i64 = tallies.iter().map(|t| t.votes).sum();
        assert_eq!(total, 2);
    }

    #[test]
    fn test_poll_lookup() {
        let db = test_db();
        seed_user(&db, "u1", "Alice");
        assert!(db.get_poll(99).unwrap().is_none());

        let poll = db.create_poll("u1", "movie night").unwrap();
        let found = db.get_poll(poll.id).unwrap().unwrap();
        assert_eq!(found.description, "movie night");
        assert_eq!(found.creator_user_id, "u1");

        assert_eq!(db.get_all_polls().unwrap().len(), 1);
    }
}
