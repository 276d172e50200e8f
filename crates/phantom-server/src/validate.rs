//! Field-level request validation. Every failure is a `BadRequest`.

use phantom_shared::constants::{MAX_COMMENT_PAGE_SIZE, MAX_MOVIE_PAGE_SIZE};
use phantom_shared::ObjectId;

use crate::error::ServerError;
use crate::planner::Page;

const MIN_PASSWORD_LEN: usize = 6;

fn bad(msg: impl Into<String>) -> ServerError {
    ServerError::BadRequest(msg.into())
}

fn page(size: Option<i64>, index: Option<i64>, max: u32) -> Result<Page, ServerError> {
    let size = size.ok_or_else(|| bad("page size `s` is required"))?;
    let index = index.ok_or_else(|| bad("page index `p` is required"))?;

    let size = u32::try_from(size)
        .ok()
        .filter(|s| (1..=max).contains(s))
        .ok_or_else(|| bad(format!("page size `s` must be between 1 and {max}")))?;
    let index = u32::try_from(index)
        .ok()
        .filter(|i| *i >= 1)
        .ok_or_else(|| bad("page index `p` must be at least 1"))?;

    Ok(Page { size, index })
}

pub fn movie_page(size: Option<i64>, index: Option<i64>) -> Result<Page, ServerError> {
    page(size, index, MAX_MOVIE_PAGE_SIZE)
}

pub fn comment_page(size: Option<i64>, index: Option<i64>) -> Result<Page, ServerError> {
    page(size, index, MAX_COMMENT_PAGE_SIZE)
}

pub fn object_id(raw: &str, field: &str) -> Result<ObjectId, ServerError> {
    raw.parse()
        .map_err(|e| bad(format!("`{field}` is not a valid identifier: {e}")))
}

pub fn required<'a>(value: Option<&'a str>, field: &str) -> Result<&'a str, ServerError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(bad(format!("`{field}` is required"))),
    }
}

pub fn username(name: &str) -> Result<(), ServerError> {
    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(bad("username must be alphanumeric"));
    }
    Ok(())
}

/// Accepts `local@domain.tld`: one `@`, no whitespace, a dotted domain with
/// no empty labels.
pub fn email(address: &str) -> Result<(), ServerError> {
    let invalid = || bad("email address is invalid");
    if address.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    let (local, domain) = address.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') {
        return Err(invalid());
    }
    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 || labels.iter().any(|l| l.is_empty()) {
        return Err(invalid());
    }
    Ok(())
}

pub fn password(password: &str) -> Result<(), ServerError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(bad(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_bounds() {
        assert_eq!(
            movie_page(Some(50), Some(1)).unwrap(),
            Page { size: 50, index: 1 }
        );
        assert!(movie_page(Some(51), Some(1)).is_err());
        assert!(movie_page(Some(0), Some(1)).is_err());
        assert!(movie_page(Some(10), Some(0)).is_err());
        assert!(movie_page(Some(-5), Some(1)).is_err());
        assert!(movie_page(None, Some(1)).is_err());
        assert!(movie_page(Some(5), None).is_err());

        assert!(comment_page(Some(20), Some(3)).is_ok());
        assert!(comment_page(Some(21), Some(3)).is_err());
    }

    #[test]
    fn test_object_ids() {
        assert!(object_id("573a1390f29313caabcd4135", "id").is_ok());
        assert!(object_id("573A1390F29313CAABCD4135", "id").is_ok());
        assert!(object_id("573a1390f29313caabcd413", "id").is_err());
        assert!(object_id("573a1390f29313caabcd41zz", "id").is_err());
        assert!(object_id("", "id").is_err());
    }

    #[test]
    fn test_usernames() {
        assert!(username("alice42").is_ok());
        assert!(username("").is_err());
        assert!(username("alice smith").is_err());
        assert!(username("alice_smith").is_err());
    }

    #[test]
    fn test_emails() {
        assert!(email("alice@example.org").is_ok());
        assert!(email("a.b+c@mail.example.co.uk").is_ok());
        assert!(email("alice").is_err());
        assert!(email("@example.org").is_err());
        assert!(email("alice@localhost").is_err());
        assert!(email("alice@example..org").is_err());
        assert!(email("alice@@example.org").is_err());
        assert!(email("alice @example.org").is_err());
    }

    #[test]
    fn test_passwords() {
        assert!(password("secret").is_ok());
        assert!(password("short").is_err());
    }

    #[test]
    fn test_required_fields() {
        assert_eq!(required(Some("x"), "search").unwrap(), "x");
        assert!(required(Some("   "), "search").is_err());
        assert!(required(None, "search").is_err());
    }
}
