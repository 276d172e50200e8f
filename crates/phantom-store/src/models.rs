//! Domain documents held by the content store.
//!
//! Every struct derives `Serialize` and `Deserialize` so the server can hand
//! them straight to its JSON responses.

use chrono::{DateTime, Utc};
use phantom_shared::ObjectId;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Movies
// ---------------------------------------------------------------------------

/// IMDb rating block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Imdb {
    pub rating: Option<f64>,
    pub votes: Option<i64>,
    pub id: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Awards {
    pub wins: i64,
    pub nominations: i64,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TomatoesViewer {
    pub rating: Option<f64>,
    #[serde(rename = "numReviews")]
    pub num_reviews: i64,
    pub meter: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tomatoes {
    pub viewer: TomatoesViewer,
    #[serde(rename = "lastUpdated")]
    pub last_updated: Option<DateTime<Utc>>,
}

/// Fields that only single-item retrieval ever returns. Stored as one JSON
/// column since nothing filters or sorts on them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovieDetails {
    pub rated: String,
    pub num_mflix_comments: i64,
    pub languages: Vec<String>,
    pub directors: Vec<String>,
    pub writers: Vec<String>,
    pub awards: Awards,
    pub lastupdated: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub tomatoes: Tomatoes,
}

/// The writable content of a movie document, used for both insert and
/// whole-document replacement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovieFields {
    pub title: String,
    pub plot: String,
    pub fullplot: String,
    pub genres: Vec<String>,
    pub cast: Vec<String>,
    pub poster: String,
    pub countries: Vec<String>,
    /// Minutes. Doubles as the popularity signal for "most watched".
    pub runtime: Option<i64>,
    pub released: Option<DateTime<Utc>>,
    pub year: Option<i64>,
    pub imdb: Imdb,
    #[serde(flatten)]
    pub details: MovieDetails,
}

/// A full movie document, as returned by lookup by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    pub id: ObjectId,
    #[serde(flatten)]
    pub fields: MovieFields,
}

/// The display projection every listing returns. Internal-only fields
/// (full plot, awards and the rest of [`MovieDetails`]) never appear here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieSummary {
    pub id: ObjectId,
    pub plot: String,
    pub genres: Vec<String>,
    pub cast: Vec<String>,
    pub poster: String,
    pub title: String,
    pub year: Option<i64>,
    pub imdb: Imdb,
    pub countries: Vec<String>,
}

// ---------------------------------------------------------------------------
// Comments
// ---------------------------------------------------------------------------

/// A comment on a movie. `name` is the owning username.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: ObjectId,
    pub name: String,
    pub email: String,
    pub movie_id: ObjectId,
    pub text: String,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewComment {
    pub owner: String,
    pub email: String,
    pub movie_id: ObjectId,
    pub text: String,
    pub date: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

/// A registered account. `password` is a PHC-format hash, never plaintext.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: ObjectId,
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}
