//! Account records.

use phantom_shared::ObjectId;
use rusqlite::params;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::{NewUser, User};
use crate::movies::id_column;

impl Database {
    /// Create an account. A taken name or email yields
    /// [`StoreError::Conflict`].
    pub fn add_user(&self, user: &NewUser) -> Result<ObjectId> {
        let id = ObjectId::new();
        self.conn()
            .execute(
                "INSERT INTO users (id, name, email, password) VALUES (?1, ?2, ?3, ?4)",
                params![id.to_hex(), user.name, user.email, user.password_hash],
            )
            .map_err(StoreError::from_write)?;
        Ok(id)
    }

    pub fn get_user_by_name(&self, name: &str) -> Result<User> {
        self.find_user("name", name)
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<User> {
        self.find_user("email", email)
    }

    fn find_user(&self, column: &'static str, value: &str) -> Result<User> {
        self.conn()
            .query_row(
                &format!("SELECT id, name, email, password FROM users WHERE {column} = ?1"),
                params![value],
                |row| {
                    Ok(User {
                        id: id_column(row, 0)?,
                        name: row.get(1)?,
                        email: row.get(2)?,
                        password: row.get(3)?,
                    })
                },
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
                other => StoreError::Sqlite(other),
            })
    }
}
