//! Ownership scoping for comment writes.
//!
//! The owner of a comment is always the caller's username, both when it is
//! created and when it is matched for update or delete. A write that
//! matches nothing is reported as not found, whether the comment is missing
//! or belongs to someone else.

use chrono::{DateTime, Utc};
use phantom_shared::{ObjectId, Principal};
use phantom_store::{NewComment, NewItem, Predicate};

use crate::error::ServerError;

pub fn new_comment(
    principal: &Principal,
    movie_id: ObjectId,
    email: String,
    text: String,
    now: DateTime<Utc>,
) -> NewItem {
    NewItem::Comment(NewComment {
        owner: principal.username.clone(),
        email,
        movie_id,
        text,
        date: now,
    })
}

pub fn comment_match(principal: &Principal, id: ObjectId) -> Predicate {
    Predicate::OwnedComment {
        id,
        owner: principal.username.clone(),
    }
}

/// Movies carry no owner; any authenticated caller may write them.
pub fn movie_match(id: ObjectId) -> Predicate {
    Predicate::Movie { id }
}

pub fn expect_affected(count: usize, what: &'static str) -> Result<(), ServerError> {
    if count == 0 {
        return Err(ServerError::NotFound(what));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use phantom_shared::crypto::generate_symmetric_key;
    use phantom_shared::TokenService;

    use super::*;

    fn principal(name: &str) -> Principal {
        TokenService::new(generate_symmetric_key())
            .issue_at(name, Duration::from_secs(60), Utc::now())
            .unwrap()
            .1
    }

    #[test]
    fn test_new_comment_takes_owner_from_principal() {
        let alice = principal("alice");
        let movie = ObjectId::new();
        let NewItem::Comment(comment) =
            new_comment(&alice, movie, String::new(), "hi".into(), Utc::now())
        else {
            panic!("expected a comment");
        };
        assert_eq!(comment.owner, "alice");
        assert_eq!(comment.movie_id, movie);
    }

    #[test]
    fn test_comment_match_binds_id_and_owner() {
        let bob = principal("bob");
        let id = ObjectId::new();
        assert_eq!(
            comment_match(&bob, id),
            Predicate::OwnedComment {
                id,
                owner: "bob".into()
            }
        );
    }

    #[test]
    fn test_zero_affected_is_not_found() {
        assert!(matches!(
            expect_affected(0, "Comment"),
            Err(ServerError::NotFound("Comment"))
        ));
        assert!(expect_affected(1, "Comment").is_ok());
        assert!(expect_affected(3, "Movie").is_ok());
    }
}
