//! # phantom-store
//!
//! SQLite-backed content store for movies, comments and accounts.
//!
//! The crate exposes a synchronous `Database` handle that wraps a
//! `rusqlite::Connection`. Reads go through [`QuerySpec`], writes through
//! [`Predicate`]-scoped mutations, so ownership conditions are evaluated in
//! the same statement that changes the row.

pub mod comments;
pub mod database;
pub mod migrations;
pub mod models;
pub mod movies;
pub mod mutation;
pub mod query;
pub mod users;

mod error;

pub use database::Database;
pub use error::{Result, StoreError};
pub use models::*;
pub use mutation::{Changes, NewItem, Predicate};
pub use query::{ContentItem, Filter, QuerySpec, SortOrder};
