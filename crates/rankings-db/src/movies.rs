//! Movie catalog queries: search, rankings, per-user favourites.

use std::collections::HashSet;

use rusqlite::{Row, params_from_iter};
use serde::{Deserialize, Serialize};

use crate::{Database, DbError};

/// Every listing endpoint is capped at this many rows.
pub const LIST_LIMIT: u32 = 50;

/// Catalog record as delivered by the upstream movie database. Only a bulk
/// catalog refresh writes these; the web application treats them as
/// read-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogMovie {
    pub id: i64,
    pub title: String,
    pub release_date: String,
    pub overview: String,
    pub language: String,
    pub poster_url: String,
    pub backdrop_url: String,
    pub genre_ids: Vec<i64>,
    pub vote_count: i64,
    pub vote_average: f64,
    pub popularity: f64,
}

/// Movie view model: catalog fields plus the favourite aggregate and the
/// per-viewer favourite flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Movie {
    pub id: i64,
    pub title: String,
    pub release_date: String,
    /// Release year, derived from `release_date`.
    pub year: String,
    pub overview: String,
    pub language: String,
    pub poster_url: String,
    pub backdrop_url: String,
    pub genre_ids: Vec<i64>,
    pub vote_count: i64,
    pub vote_average: f64,
    pub popularity: f64,
    /// Total favourites across all users.
    pub fav_count: i64,
    /// Whether the viewing user has favourited this movie.
    pub favourite: bool,
}

const MOVIE_COLUMNS: &str = "movies.id, movies.title, movies.release_date, movies.overview, \
     movies.language, movies.poster_url, movies.backdrop_url, movies.genre_ids, \
     movies.vote_count, movies.vote_average, movies.popularity";

fn movie_from_row(row: &Row<'_>) -> rusqlite::Result<Movie> {
    let release_date: String = row.get(2)?;
    let year = release_date
        .split('-')
        .next()
        .unwrap_or_default()
        .to_string();
    let genre_ids: String = row.get(7)?;
    Ok(Movie {
        id: row.get(0)?,
        title: row.get(1)?,
        year,
        release_date,
        overview: row.get(3)?,
        language: row.get(4)?,
        poster_url: row.get(5)?,
        backdrop_url: row.get(6)?,
        genre_ids: serde_json::from_str(&genre_ids).unwrap_or_default(),
        vote_count: row.get(8)?,
        vote_average: row.get(9)?,
        popularity: row.get(10)?,
        fav_count: row.get(11)?,
        favourite: false,
    })
}

impl Database {
    // --- Catalog refresh ---

    pub fn upsert_movie(&self, movie: &CatalogMovie) -> Result<(), DbError> {
        self.with_conn(|conn| {
            upsert_movie_stmt(conn, movie)?;
            Ok(())
        })
    }

    /// Bulk catalog refresh, one transaction for the whole batch.
    pub fn upsert_movies(&self, movies: &[CatalogMovie]) -> Result<(), DbError> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            for movie in movies {
                upsert_movie_stmt(&tx, movie)?;
            }
            tx.commit()?;
            Ok(())
        })
    }

    // --- Listings ---

    /// Search movies by title. Every term must match as a case-insensitive
    /// substring (AND semantics). Callers must pass at least one term and
    /// no term may be empty after trimming.
    pub fn search_movies(
        &self,
        terms: &[String],
        viewer: Option<&str>,
    ) -> Result<Vec<Movie>, DbError> {
        if terms.is_empty() {
            return Err(DbError::InvalidData("search requires at least one term".into()));
        }
        if terms.iter().any(|t| t.trim().is_empty()) {
            return Err(DbError::InvalidData("search terms must be non-empty".into()));
        }

        let predicate = (1..=terms.len())
            .map(|i| format!("title LIKE ?{i}"))
            .collect::<Vec<_>>()
            .join(" AND ");
        let sql = format!(
            "SELECT {MOVIE_COLUMNS}, COUNT(favourites.movie_id) AS fav_count \
             FROM movies LEFT JOIN favourites ON movies.id = favourites.movie_id \
             WHERE {predicate} \
             GROUP BY movies.id \
             ORDER BY popularity DESC \
             LIMIT {LIST_LIMIT}"
        );
        let patterns: Vec<String> = terms.iter().map(|t| format!("%{}%", t.trim())).collect();

        let mut movies = self.with_conn(|conn| {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params_from_iter(patterns.iter()), movie_from_row)?;
            rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
        })?;
        self.flag_favourites(&mut movies, viewer)?;
        Ok(movies)
    }

    /// Movies ranked by how often our users favourited them. Ties broken by
    /// the weighted catalog rating.
    pub fn get_top_favourited_movies(&self, viewer: Option<&str>) -> Result<Vec<Movie>, DbError> {
        let sql = format!(
            "SELECT {MOVIE_COLUMNS}, COUNT(favourites.movie_id) AS fav_count \
             FROM movies LEFT JOIN favourites ON movies.id = favourites.movie_id \
             GROUP BY movies.id \
             ORDER BY fav_count DESC, vote_count / 1000 * vote_average DESC \
             LIMIT {LIST_LIMIT}"
        );
        let mut movies = self.with_conn(|conn| {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map([], movie_from_row)?;
            rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
        })?;
        self.flag_favourites(&mut movies, viewer)?;
        Ok(movies)
    }

    /// Movies ranked by upstream popularity score.
    pub fn get_popular_movies(&self, viewer: Option<&str>) -> Result<Vec<Movie>, DbError> {
        let sql = format!(
            "SELECT {MOVIE_COLUMNS}, COUNT(favourites.movie_id) AS fav_count \
             FROM movies LEFT JOIN favourites ON movies.id = favourites.movie_id \
             GROUP BY movies.id \
             ORDER BY popularity DESC \
             LIMIT {LIST_LIMIT}"
        );
        let mut movies = self.with_conn(|conn| {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map([], movie_from_row)?;
            rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
        })?;
        self.flag_favourites(&mut movies, viewer)?;
        Ok(movies)
    }

    /// All movies favourited by `user_id`, flagged for `viewer`. An unknown
    /// user simply has no favourites.
    pub fn get_fav_movies(
        &self,
        user_id: &str,
        viewer: Option<&str>,
    ) -> Result<Vec<Movie>, DbError> {
        let sql = format!(
            "SELECT {MOVIE_COLUMNS}, \
                 (SELECT COUNT(*) FROM favourites f2 WHERE f2.movie_id = movies.id) AS fav_count \
             FROM movies JOIN favourites ON movies.id = favourites.movie_id \
             WHERE favourites.user_id = ?1 \
             ORDER BY favourites.id \
             LIMIT {LIST_LIMIT}"
        );
        let mut movies = self.with_conn(|conn| {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map([user_id], movie_from_row)?;
            rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
        })?;
        self.flag_favourites(&mut movies, viewer)?;
        Ok(movies)
    }

    // --- Favourite flagging ---

    /// Movie ids favourited by one user, as a set for the flag pass.
    fn favourite_movie_ids(&self, user_id: &str) -> Result<HashSet<i64>, DbError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT movie_id FROM favourites WHERE user_id = ?1")?;
            let rows = stmt.query_map([user_id], |row| row.get::<_, i64>(0))?;
            rows.collect::<Result<HashSet<_>, _>>().map_err(Into::into)
        })
    }

    fn flag_favourites(&self, movies: &mut [Movie], viewer: Option<&str>) -> Result<(), DbError> {
        let Some(viewer) = viewer else {
            return Ok(());
        };
        let favs = self.favourite_movie_ids(viewer)?;
        for movie in movies.iter_mut() {
            movie.favourite = favs.contains(&movie.id);
        }
        Ok(())
    }
}

fn upsert_movie_stmt(conn: &rusqlite::Connection, movie: &CatalogMovie) -> rusqlite::Result<()> {
    let genre_ids = serde_json::to_string(&movie.genre_ids).unwrap_or_else(|_| "[]".into());
    conn.execute(
        "INSERT INTO movies (id, title, release_date, overview, language, poster_url, \
             backdrop_url, genre_ids, vote_count, vote_average, popularity) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11) \
         ON CONFLICT(id) DO UPDATE SET \
             title = ?2, release_date = ?3, overview = ?4, language = ?5, poster_url = ?6, \
             backdrop_url = ?7, genre_ids = ?8, vote_count = ?9, vote_average = ?10, \
             popularity = ?11",
        rusqlite::params![
            movie.id,
            movie.title,
            movie.release_date,
            movie.overview,
            movie.language,
            movie.poster_url,
            movie.backdrop_url,
            genre_ids,
            movie.vote_count,
            movie.vote_average,
            movie.popularity,
        ],
    )?;
    Ok(())
}
