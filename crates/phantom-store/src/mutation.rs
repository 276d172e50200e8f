//! Predicate-scoped writes.
//!
//! Callers never issue "update by id" directly. They describe which document
//! they are allowed to touch as a [`Predicate`], and the store reports how many
//! documents that predicate matched.

use phantom_shared::ObjectId;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::{MovieFields, NewComment};

/// Which documents a write may touch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// A movie by id, with no ownership condition.
    Movie { id: ObjectId },
    /// A comment by id that also belongs to `owner`.
    OwnedComment { id: ObjectId, owner: String },
}

/// What to change in the matched document.
#[derive(Debug, Clone, PartialEq)]
pub enum Changes {
    /// Replace every writable movie field.
    ReplaceMovie(MovieFields),
    /// Set the comment text.
    CommentText(String),
}

/// A document to create.
#[derive(Debug, Clone, PartialEq)]
pub enum NewItem {
    Movie(MovieFields),
    Comment(NewComment),
}

impl Database {
    /// Insert a new document and return its freshly generated id.
    pub fn insert(&self, item: &NewItem) -> Result<ObjectId> {
        let id = match item {
            NewItem::Movie(fields) => self.insert_movie(fields)?,
            NewItem::Comment(comment) => self.insert_comment(comment)?,
        };
        tracing::debug!(%id, "inserted document");
        Ok(id)
    }

    /// Apply `changes` to the documents matching `predicate`. Returns the
    /// number matched, which is 0 when the id is unknown or the owner differs.
    pub fn mutate(&self, predicate: &Predicate, changes: &Changes) -> Result<usize> {
        match (predicate, changes) {
            (Predicate::Movie { id }, Changes::ReplaceMovie(fields)) => {
                self.replace_movie(*id, fields)
            }
            (Predicate::OwnedComment { id, owner }, Changes::CommentText(text)) => {
                self.update_owned_comment(*id, owner, text)
            }
            _ => Err(StoreError::MismatchedMutation),
        }
    }

    /// Delete the documents matching `predicate` and return how many went.
    pub fn delete_matching(&self, predicate: &Predicate) -> Result<usize> {
        match predicate {
            Predicate::Movie { id } => self.delete_movie(*id),
            Predicate::OwnedComment { id, owner } => self.delete_owned_comment(*id, owner),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn comment(owner: &str) -> NewItem {
        NewItem::Comment(NewComment {
            owner: owner.to_string(),
            email: String::new(),
            movie_id: ObjectId::new(),
            text: "first".to_string(),
            date: Utc::now(),
        })
    }

    fn owned(id: ObjectId, owner: &str) -> Predicate {
        Predicate::OwnedComment {
            id,
            owner: owner.to_string(),
        }
    }

    #[test]
    fn test_movie_replace_and_delete() {
        let db = Database::open_in_memory().unwrap();
        let id = db
            .insert(&NewItem::Movie(MovieFields {
                title: "Before".into(),
                ..Default::default()
            }))
            .unwrap();

        let changes = Changes::ReplaceMovie(MovieFields {
            title: "After".into(),
            ..Default::default()
        });
        assert_eq!(db.mutate(&Predicate::Movie { id }, &changes).unwrap(), 1);
        assert_eq!(db.get_movie(id).unwrap().fields.title, "After");

        let unknown = Predicate::Movie {
            id: ObjectId::new(),
        };
        assert_eq!(db.mutate(&unknown, &changes).unwrap(), 0);

        assert_eq!(db.delete_matching(&Predicate::Movie { id }).unwrap(), 1);
        assert_eq!(db.delete_matching(&Predicate::Movie { id }).unwrap(), 0);
    }

    #[test]
    fn test_comment_writes_match_on_owner() {
        let db = Database::open_in_memory().unwrap();
        let id = db.insert(&comment("alice")).unwrap();
        let edit = Changes::CommentText("second".into());

        assert_eq!(db.mutate(&owned(id, "mallory"), &edit).unwrap(), 0);
        assert_eq!(db.get_comment(id).unwrap().text, "first");
        assert_eq!(db.delete_matching(&owned(id, "mallory")).unwrap(), 0);

        assert_eq!(db.mutate(&owned(id, "alice"), &edit).unwrap(), 1);
        assert_eq!(db.get_comment(id).unwrap().text, "second");
        assert_eq!(db.delete_matching(&owned(id, "alice")).unwrap(), 1);
    }

    #[test]
    fn test_rewriting_identical_text_still_counts_as_matched() {
        let db = Database::open_in_memory().unwrap();
        let id = db.insert(&comment("alice")).unwrap();
        let same = Changes::CommentText("first".into());
        assert_eq!(db.mutate(&owned(id, "alice"), &same).unwrap(), 1);
    }

    #[test]
    fn test_mismatched_changes_are_rejected() {
        let db = Database::open_in_memory().unwrap();
        let id = db.insert(&comment("alice")).unwrap();
        assert!(matches!(
            db.mutate(&Predicate::Movie { id }, &Changes::CommentText("x".into())),
            Err(StoreError::MismatchedMutation)
        ));
        assert!(matches!(
            db.mutate(
                &owned(id, "alice"),
                &Changes::ReplaceMovie(MovieFields::default())
            ),
            Err(StoreError::MismatchedMutation)
        ));
    }
}
