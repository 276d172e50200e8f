//! v001 -- Initial schema creation.
//!
//! Creates the three collections (`users`, `movies`, `comments`) and the
//! full-text index over movies.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Users
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS users (
    id       TEXT PRIMARY KEY NOT NULL,      -- 24-hex object id
    name     TEXT NOT NULL UNIQUE,
    email    TEXT NOT NULL UNIQUE,
    password TEXT NOT NULL                   -- Argon2 PHC string
);

-- ----------------------------------------------------------------
-- Movies
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS movies (
    id           TEXT PRIMARY KEY NOT NULL,  -- 24-hex object id
    title        TEXT NOT NULL,
    plot         TEXT NOT NULL DEFAULT '',
    fullplot     TEXT NOT NULL DEFAULT '',
    genres       TEXT NOT NULL DEFAULT '[]', -- JSON array
    cast_members TEXT NOT NULL DEFAULT '[]', -- JSON array
    poster       TEXT NOT NULL DEFAULT '',
    countries    TEXT NOT NULL DEFAULT '[]', -- JSON array
    runtime      INTEGER,                    -- minutes
    released     INTEGER,                    -- unix milliseconds
    year         INTEGER,
    imdb_rating  REAL,
    imdb_votes   INTEGER,
    imdb_id      INTEGER,
    details      TEXT NOT NULL DEFAULT '{}'  -- JSON, lookup-only fields
);

CREATE INDEX IF NOT EXISTS idx_movies_runtime  ON movies(runtime DESC);
CREATE INDEX IF NOT EXISTS idx_movies_released ON movies(released DESC);
CREATE INDEX IF NOT EXISTS idx_movies_rating   ON movies(imdb_rating DESC);

CREATE VIRTUAL TABLE IF NOT EXISTS movies_fts USING fts5(
    title, plot, fullplot, genres, cast_members,
    content = 'movies'
);

CREATE TRIGGER IF NOT EXISTS movies_fts_insert AFTER INSERT ON movies BEGIN
    INSERT INTO movies_fts (rowid, title, plot, fullplot, genres, cast_members)
    VALUES (new.rowid, new.title, new.plot, new.fullplot, new.genres, new.cast_members);
END;

CREATE TRIGGER IF NOT EXISTS movies_fts_delete AFTER DELETE ON movies BEGIN
    INSERT INTO movies_fts (movies_fts, rowid, title, plot, fullplot, genres, cast_members)
    VALUES ('delete', old.rowid, old.title, old.plot, old.fullplot, old.genres, old.cast_members);
END;

CREATE TRIGGER IF NOT EXISTS movies_fts_update AFTER UPDATE ON movies BEGIN
    INSERT INTO movies_fts (movies_fts, rowid, title, plot, fullplot, genres, cast_members)
    VALUES ('delete', old.rowid, old.title, old.plot, old.fullplot, old.genres, old.cast_members);
    INSERT INTO movies_fts (rowid, title, plot, fullplot, genres, cast_members)
    VALUES (new.rowid, new.title, new.plot, new.fullplot, new.genres, new.cast_members);
END;

-- ----------------------------------------------------------------
-- Comments
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS comments (
    id       TEXT PRIMARY KEY NOT NULL,      -- 24-hex object id
    name     TEXT NOT NULL,                  -- owning username
    email    TEXT NOT NULL DEFAULT '',
    movie_id TEXT NOT NULL,                  -- 24-hex object id
    text     TEXT NOT NULL,
    date     INTEGER NOT NULL                -- unix milliseconds
);

CREATE INDEX IF NOT EXISTS idx_comments_movie ON comments(movie_id);
CREATE INDEX IF NOT EXISTS idx_comments_name  ON comments(name);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
