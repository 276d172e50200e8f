//! Async handle over the synchronous content [`Database`].
//!
//! The connection sits behind a mutex and each call runs on tokio's blocking
//! pool, so a slow query never stalls the reactor. No retries: a store
//! failure surfaces to the caller as-is.

use std::sync::{Arc, Mutex};

use phantom_shared::ObjectId;
use phantom_store::{
    Changes, ContentItem, Database, Movie, NewItem, NewUser, Predicate, QuerySpec, StoreError,
    User,
};

use crate::error::ServerError;

#[derive(Clone)]
pub struct ContentStore {
    db: Arc<Mutex<Database>>,
}

impl ContentStore {
    pub fn new(db: Database) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
        }
    }

    async fn run<T, F>(&self, op: F) -> Result<T, ServerError>
    where
        F: FnOnce(&Database) -> phantom_store::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let db = Arc::clone(&self.db);
        let result = tokio::task::spawn_blocking(move || {
            let guard = db.lock().map_err(|_| StoreError::Unavailable)?;
            op(&guard)
        })
        .await?;
        Ok(result?)
    }

    pub async fn execute(&self, spec: QuerySpec) -> Result<Vec<ContentItem>, ServerError> {
        self.run(move |db| db.execute(&spec)).await
    }

    pub async fn mutate(
        &self,
        predicate: Predicate,
        changes: Changes,
    ) -> Result<usize, ServerError> {
        self.run(move |db| db.mutate(&predicate, &changes)).await
    }

    pub async fn insert(&self, item: NewItem) -> Result<ObjectId, ServerError> {
        self.run(move |db| db.insert(&item)).await
    }

    pub async fn delete_matching(&self, predicate: Predicate) -> Result<usize, ServerError> {
        self.run(move |db| db.delete_matching(&predicate)).await
    }

    pub async fn get_movie(&self, id: ObjectId) -> Result<Movie, ServerError> {
        self.run(move |db| db.get_movie(id))
            .await
            .map_err(|e| match e {
                ServerError::NotFound(_) => ServerError::NotFound("Movie"),
                other => other,
            })
    }

    pub async fn add_user(&self, user: NewUser) -> Result<ObjectId, ServerError> {
        self.run(move |db| db.add_user(&user)).await
    }

    pub async fn get_user_by_name(&self, name: String) -> Result<User, ServerError> {
        self.run(move |db| db.get_user_by_name(&name))
            .await
            .map_err(user_not_found)
    }

    pub async fn get_user_by_email(&self, email: String) -> Result<User, ServerError> {
        self.run(move |db| db.get_user_by_email(&email))
            .await
            .map_err(user_not_found)
    }
}

fn user_not_found(err: ServerError) -> ServerError {
    match err {
        ServerError::NotFound(_) => ServerError::NotFound("User"),
        other => other,
    }
}
