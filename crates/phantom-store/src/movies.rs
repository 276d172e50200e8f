//! Storage for [`Movie`] documents.

use chrono::{DateTime, Utc};
use phantom_shared::ObjectId;
use rusqlite::params;
use serde::de::DeserializeOwned;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::{Imdb, Movie, MovieFields, MovieSummary};

/// Columns backing [`MovieSummary`], qualified for use next to the FTS join.
pub(crate) const SUMMARY_COLUMNS: &str = "m.id, m.plot, m.genres, m.cast_members, m.poster, \
     m.title, m.year, m.imdb_rating, m.imdb_votes, m.imdb_id, m.countries";

const FULL_COLUMNS: &str = "m.id, m.title, m.plot, m.fullplot, m.genres, m.cast_members, \
     m.poster, m.countries, m.runtime, m.released, m.year, m.imdb_rating, m.imdb_votes, \
     m.imdb_id, m.details";

/// Column values of a movie that need encoding before binding.
struct EncodedMovie {
    genres: String,
    cast: String,
    countries: String,
    details: String,
    released: Option<i64>,
}

impl EncodedMovie {
    fn encode(fields: &MovieFields) -> Result<Self> {
        Ok(Self {
            genres: serde_json::to_string(&fields.genres)?,
            cast: serde_json::to_string(&fields.cast)?,
            countries: serde_json::to_string(&fields.countries)?,
            details: serde_json::to_string(&fields.details)?,
            released: fields.released.map(|t| t.timestamp_millis()),
        })
    }
}

impl Database {
    /// Fetch the full document for one movie.
    pub fn get_movie(&self, id: ObjectId) -> Result<Movie> {
        self.conn()
            .query_row(
                &format!("SELECT {FULL_COLUMNS} FROM movies m WHERE m.id = ?1"),
                params![id.to_hex()],
                row_to_movie,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
                other => StoreError::Sqlite(other),
            })
    }

    pub(crate) fn insert_movie(&self, fields: &MovieFields) -> Result<ObjectId> {
        let id = ObjectId::new();
        let enc = EncodedMovie::encode(fields)?;
        self.conn()
            .execute(
                "INSERT INTO movies (id, title, plot, fullplot, genres, cast_members, poster,
                                     countries, runtime, released, year, imdb_rating,
                                     imdb_votes, imdb_id, details)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
                params![
                    id.to_hex(),
                    fields.title,
                    fields.plot,
                    fields.fullplot,
                    enc.genres,
                    enc.cast,
                    fields.poster,
                    enc.countries,
                    fields.runtime,
                    enc.released,
                    fields.year,
                    fields.imdb.rating,
                    fields.imdb.votes,
                    fields.imdb.id,
                    enc.details,
                ],
            )
            .map_err(StoreError::from_write)?;
        Ok(id)
    }

    /// Replace every writable field of a movie. Returns the number of
    /// documents matched (0 or 1).
    pub(crate) fn replace_movie(&self, id: ObjectId, fields: &MovieFields) -> Result<usize> {
        let enc = EncodedMovie::encode(fields)?;
        let affected = self
            .conn()
            .execute(
                "UPDATE movies SET title = ?2, plot = ?3, fullplot = ?4, genres = ?5,
                                   cast_members = ?6, poster = ?7, countries = ?8,
                                   runtime = ?9, released = ?10, year = ?11,
                                   imdb_rating = ?12, imdb_votes = ?13, imdb_id = ?14,
                                   details = ?15
                 WHERE id = ?1",
                params![
                    id.to_hex(),
                    fields.title,
                    fields.plot,
                    fields.fullplot,
                    enc.genres,
                    enc.cast,
                    fields.poster,
                    enc.countries,
                    fields.runtime,
                    enc.released,
                    fields.year,
                    fields.imdb.rating,
                    fields.imdb.votes,
                    fields.imdb.id,
                    enc.details,
                ],
            )
            .map_err(StoreError::from_write)?;
        Ok(affected)
    }

    pub(crate) fn delete_movie(&self, id: ObjectId) -> Result<usize> {
        let affected = self
            .conn()
            .execute("DELETE FROM movies WHERE id = ?1", params![id.to_hex()])?;
        Ok(affected)
    }
}

fn conversion_error(
    idx: usize,
    e: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
}

pub(crate) fn id_column(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<ObjectId> {
    let hex: String = row.get(idx)?;
    ObjectId::parse_hex(&hex).map_err(|e| conversion_error(idx, e))
}

pub(crate) fn millis_column(
    row: &rusqlite::Row<'_>,
    idx: usize,
) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let ms: Option<i64> = row.get(idx)?;
    Ok(ms.and_then(DateTime::from_timestamp_millis))
}

fn json_column<T: DeserializeOwned>(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw).map_err(|e| conversion_error(idx, e))
}

pub(crate) fn row_to_summary(row: &rusqlite::Row<'_>) -> rusqlite::Result<MovieSummary> {
    Ok(MovieSummary {
        id: id_column(row, 0)?,
        plot: row.get(1)?,
        genres: json_column(row, 2)?,
        cast: json_column(row, 3)?,
        poster: row.get(4)?,
        title: row.get(5)?,
        year: row.get(6)?,
        imdb: Imdb {
            rating: row.get(7)?,
            votes: row.get(8)?,
            id: row.get(9)?,
        },
        countries: json_column(row, 10)?,
    })
}

fn row_to_movie(row: &rusqlite::Row<'_>) -> rusqlite::Result<Movie> {
    Ok(Movie {
        id: id_column(row, 0)?,
        fields: MovieFields {
            title: row.get(1)?,
            plot: row.get(2)?,
            fullplot: row.get(3)?,
            genres: json_column(row, 4)?,
            cast: json_column(row, 5)?,
            poster: row.get(6)?,
            countries: json_column(row, 7)?,
            runtime: row.get(8)?,
            released: millis_column(row, 9)?,
            year: row.get(10)?,
            imdb: Imdb {
                rating: row.get(11)?,
                votes: row.get(12)?,
                id: row.get(13)?,
            },
            details: json_column(row, 14)?,
        },
    })
}
