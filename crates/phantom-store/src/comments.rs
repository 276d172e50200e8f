//! CRUD operations for [`Comment`] records.
//!
//! Every write that touches an existing comment matches on both the id and
//! the owning username in a single statement.

use phantom_shared::ObjectId;
use rusqlite::params;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::{Comment, NewComment};
use crate::movies::{id_column, millis_column};

pub(crate) const COLUMNS: &str = "id, name, email, movie_id, text, date";

impl Database {
    pub(crate) fn insert_comment(&self, comment: &NewComment) -> Result<ObjectId> {
        let id = ObjectId::new();
        self.conn()
            .execute(
                "INSERT INTO comments (id, name, email, movie_id, text, date)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    id.to_hex(),
                    comment.owner,
                    comment.email,
                    comment.movie_id.to_hex(),
                    comment.text,
                    comment.date.timestamp_millis(),
                ],
            )
            .map_err(StoreError::from_write)?;
        Ok(id)
    }

    /// Fetch a single comment by id.
    pub fn get_comment(&self, id: ObjectId) -> Result<Comment> {
        self.conn()
            .query_row(
                &format!("SELECT {COLUMNS} FROM comments WHERE id = ?1"),
                params![id.to_hex()],
                row_to_comment,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
                other => StoreError::Sqlite(other),
            })
    }

    pub(crate) fn update_owned_comment(
        &self,
        id: ObjectId,
        owner: &str,
        text: &str,
    ) -> Result<usize> {
        let affected = self.conn().execute(
            "UPDATE comments SET text = ?3 WHERE id = ?1 AND name = ?2",
            params![id.to_hex(), owner, text],
        )?;
        Ok(affected)
    }

    pub(crate) fn delete_owned_comment(&self, id: ObjectId, owner: &str) -> Result<usize> {
        let affected = self.conn().execute(
            "DELETE FROM comments WHERE id = ?1 AND name = ?2",
            params![id.to_hex(), owner],
        )?;
        Ok(affected)
    }
}

pub(crate) fn row_to_comment(row: &rusqlite::Row<'_>) -> rusqlite::Result<Comment> {
    let date = millis_column(row, 5)?.ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            5,
            rusqlite::types::Type::Integer,
            "comment date out of range".into(),
        )
    })?;

    Ok(Comment {
        id: id_column(row, 0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        movie_id: id_column(row, 3)?,
        text: row.get(4)?,
        date,
    })
}
