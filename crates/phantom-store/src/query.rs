//! Read-side query descriptions and their execution.
//!
//! A [`QuerySpec`] is built fresh for every request and handed to
//! [`Database::execute`]. It never reaches storage as anything other than
//! parameterised SQL.

use chrono::{DateTime, Utc};
use phantom_shared::ObjectId;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Row};

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::{Comment, MovieSummary};
use crate::{comments, movies};

/// Which documents a query selects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// Every movie.
    None,
    /// Movies matching any of the whitespace-separated terms in title,
    /// plot, full plot, genres or cast.
    Text(String),
    /// Movies tagged with `genre` and released at or after `released_since`.
    GenreSince {
        genre: String,
        released_since: DateTime<Utc>,
    },
    /// Comments attached to one movie.
    CommentsOf(ObjectId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Text match score, best first. Only meaningful with [`Filter::Text`].
    Relevance,
    RuntimeDesc,
    ReleaseDesc,
    RatingDesc,
    /// Storage order.
    Insertion,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuerySpec {
    pub filter: Filter,
    pub sort: SortOrder,
    pub skip: u64,
    pub limit: u64,
}

/// One result row of [`Database::execute`].
#[derive(Debug, Clone, PartialEq)]
pub enum ContentItem {
    Movie(MovieSummary),
    Comment(Comment),
}

impl ContentItem {
    pub fn into_movie(self) -> Option<MovieSummary> {
        match self {
            ContentItem::Movie(movie) => Some(movie),
            ContentItem::Comment(_) => None,
        }
    }

    pub fn into_comment(self) -> Option<Comment> {
        match self {
            ContentItem::Comment(comment) => Some(comment),
            ContentItem::Movie(_) => None,
        }
    }
}

/// Turn free text into an FTS5 expression that matches any term. Each term
/// is quoted so user input can never be read as query syntax; pure
/// punctuation is dropped since it tokenizes to nothing.
fn fts_expression(text: &str) -> Option<String> {
    let terms: Vec<String> = text
        .split_whitespace()
        .filter(|term| term.chars().any(char::is_alphanumeric))
        .map(|term| format!("\"{}\"", term.replace('"', "\"\"")))
        .collect();
    if terms.is_empty() {
        None
    } else {
        Some(terms.join(" OR "))
    }
}

fn order_clause(sort: SortOrder) -> &'static str {
    match sort {
        SortOrder::Relevance => "movies_fts.rank, m.rowid",
        SortOrder::RuntimeDesc => "m.runtime DESC, m.rowid",
        SortOrder::ReleaseDesc => "m.released DESC, m.rowid",
        SortOrder::RatingDesc => "m.imdb_rating DESC, m.rowid",
        SortOrder::Insertion => "m.rowid",
    }
}

fn to_sql_int(n: u64) -> Result<i64> {
    i64::try_from(n).map_err(|_| StoreError::UnsupportedQuery("page bounds out of range"))
}

impl Database {
    /// Run a read query and return the matching items in order.
    pub fn execute(&self, spec: &QuerySpec) -> Result<Vec<ContentItem>> {
        if spec.limit == 0 {
            return Ok(Vec::new());
        }
        match &spec.filter {
            Filter::CommentsOf(movie_id) => {
                if spec.sort != SortOrder::Insertion {
                    return Err(StoreError::UnsupportedQuery(
                        "comments can only be listed in insertion order",
                    ));
                }
                let rows = self.query_rows(
                    &format!(
                        "SELECT {} FROM comments m WHERE m.movie_id = ?1
                         ORDER BY m.rowid LIMIT ?2 OFFSET ?3",
                        comments::COLUMNS
                    ),
                    vec![
                        Value::Text(movie_id.to_hex()),
                        Value::Integer(to_sql_int(spec.limit)?),
                        Value::Integer(to_sql_int(spec.skip)?),
                    ],
                    comments::row_to_comment,
                )?;
                Ok(rows.into_iter().map(ContentItem::Comment).collect())
            }
            filter => {
                let Some((sql, params)) = self.movie_query(filter, spec)? else {
                    return Ok(Vec::new());
                };
                let rows = self.query_rows(&sql, params, movies::row_to_summary)?;
                Ok(rows.into_iter().map(ContentItem::Movie).collect())
            }
        }
    }

    fn movie_query(
        &self,
        filter: &Filter,
        spec: &QuerySpec,
    ) -> Result<Option<(String, Vec<Value>)>> {
        let mut from = "movies m".to_string();
        let mut conditions: Vec<String> = Vec::new();
        let mut params: Vec<Value> = Vec::new();

        match filter {
            Filter::None => {}
            Filter::Text(text) => {
                let Some(expr) = fts_expression(text) else {
                    return Ok(None);
                };
                from.push_str(" JOIN movies_fts ON movies_fts.rowid = m.rowid");
                params.push(Value::Text(expr));
                conditions.push(format!("movies_fts MATCH ?{}", params.len()));
            }
            Filter::GenreSince {
                genre,
                released_since,
            } => {
                params.push(Value::Text(genre.clone()));
                conditions.push(format!(
                    "EXISTS (SELECT 1 FROM json_each(m.genres) g WHERE g.value = ?{})",
                    params.len()
                ));
                params.push(Value::Integer(released_since.timestamp_millis()));
                conditions.push(format!("m.released >= ?{}", params.len()));
            }
            Filter::CommentsOf(_) => {
                return Err(StoreError::UnsupportedQuery(
                    "comment filter in a movie query",
                ));
            }
        }

        if spec.sort == SortOrder::Relevance && !matches!(filter, Filter::Text(_)) {
            return Err(StoreError::UnsupportedQuery(
                "relevance order requires a text filter",
            ));
        }

        let mut sql = format!("SELECT {} FROM {from}", movies::SUMMARY_COLUMNS);
        if !conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }
        params.push(Value::Integer(to_sql_int(spec.limit)?));
        let limit_idx = params.len();
        params.push(Value::Integer(to_sql_int(spec.skip)?));
        let offset_idx = params.len();
        sql.push_str(&format!(
            " ORDER BY {} LIMIT ?{limit_idx} OFFSET ?{offset_idx}",
            order_clause(spec.sort)
        ));

        Ok(Some((sql, params)))
    }

    fn query_rows<T>(
        &self,
        sql: &str,
        params: Vec<Value>,
        map: fn(&Row<'_>) -> rusqlite::Result<T>,
    ) -> Result<Vec<T>> {
        tracing::trace!(sql, "executing query");
        let mut stmt = self.conn().prepare(sql)?;
        let rows = stmt.query_map(params_from_iter(params), map)?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fts_expression_quotes_and_ors_terms() {
        assert_eq!(
            fts_expression("space  cowboy").as_deref(),
            Some("\"space\" OR \"cowboy\"")
        );
        assert_eq!(
            fts_expression("say \"hi\"").as_deref(),
            Some("\"say\" OR \"\"\"hi\"\"\"")
        );
        assert_eq!(fts_expression("   "), None);
        assert_eq!(fts_expression("( ) --"), None);
    }

    #[test]
    fn test_every_sort_has_a_stable_tiebreak() {
        for sort in [
            SortOrder::Relevance,
            SortOrder::RuntimeDesc,
            SortOrder::ReleaseDesc,
            SortOrder::RatingDesc,
            SortOrder::Insertion,
        ] {
            assert!(order_clause(sort).ends_with("m.rowid"));
        }
    }
}
