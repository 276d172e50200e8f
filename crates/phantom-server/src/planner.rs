//! Builds a [`QuerySpec`] for each read shape the API serves.
//!
//! Everything here is a pure function of already-validated parameters. No
//! I/O happens until the `QuerySpec` is handed to the store.

use chrono::{DateTime, Months, Utc};
use phantom_shared::constants::GENRE_WINDOW_MONTHS;
use phantom_shared::ObjectId;
use phantom_store::{Filter, QuerySpec, SortOrder};

/// One page of a listing. Both fields are 1-based and already range-checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub size: u32,
    pub index: u32,
}

impl Page {
    pub fn skip(&self) -> u64 {
        u64::from(self.size) * u64::from(self.index.saturating_sub(1))
    }

    pub fn limit(&self) -> u64 {
        u64::from(self.size)
    }
}

/// Sort selector for genre search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GenreSort {
    #[default]
    Runtime,
    Time,
    Rating,
}

impl GenreSort {
    /// `"time"` and `"rating"` select their orders. Anything else, including
    /// no value at all, selects the runtime order rather than failing.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("time") => GenreSort::Time,
            Some("rating") => GenreSort::Rating,
            _ => GenreSort::Runtime,
        }
    }

    fn order(self) -> SortOrder {
        match self {
            GenreSort::Runtime => SortOrder::RuntimeDesc,
            GenreSort::Time => SortOrder::ReleaseDesc,
            GenreSort::Rating => SortOrder::RatingDesc,
        }
    }
}

fn paged(filter: Filter, sort: SortOrder, page: Page) -> QuerySpec {
    QuerySpec {
        filter,
        sort,
        skip: page.skip(),
        limit: page.limit(),
    }
}

/// Free-text search, best match first.
pub fn search(text: &str, page: Page) -> QuerySpec {
    paged(Filter::Text(text.to_string()), SortOrder::Relevance, page)
}

/// Movies in `genre` released within the trailing window ending at `now`.
pub fn genre_window(genre: &str, sort: GenreSort, page: Page, now: DateTime<Utc>) -> QuerySpec {
    let released_since = now
        .checked_sub_months(Months::new(GENRE_WINDOW_MONTHS))
        .unwrap_or(DateTime::<Utc>::MIN_UTC);
    paged(
        Filter::GenreSince {
            genre: genre.to_string(),
            released_since,
        },
        sort.order(),
        page,
    )
}

/// Longest runtime first; runtime stands in for popularity.
pub fn most_watched(page: Page) -> QuerySpec {
    paged(Filter::None, SortOrder::RuntimeDesc, page)
}

pub fn latest(page: Page) -> QuerySpec {
    paged(Filter::None, SortOrder::ReleaseDesc, page)
}

pub fn movie_comments(movie_id: ObjectId, page: Page) -> QuerySpec {
    paged(Filter::CommentsOf(movie_id), SortOrder::Insertion, page)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_pagination_arithmetic() {
        let page = Page { size: 5, index: 2 };
        assert_eq!(page.skip(), 5);
        assert_eq!(page.limit(), 5);

        for size in 1..=50u32 {
            for index in [1u32, 2, 3, 17, 1000] {
                let page = Page { size, index };
                assert_eq!(page.skip(), u64::from(size) * u64::from(index - 1));
                assert_eq!(page.limit(), u64::from(size));
            }
        }
    }

    #[test]
    fn test_large_indices_do_not_overflow() {
        let page = Page {
            size: 50,
            index: u32::MAX,
        };
        assert_eq!(page.skip(), 50 * (u64::from(u32::MAX) - 1));
    }

    #[test]
    fn test_genre_sort_selection() {
        assert_eq!(GenreSort::parse(Some("time")), GenreSort::Time);
        assert_eq!(GenreSort::parse(Some("rating")), GenreSort::Rating);
        assert_eq!(GenreSort::parse(Some("hotness")), GenreSort::Runtime);
        assert_eq!(GenreSort::parse(Some("banana")), GenreSort::Runtime);
        assert_eq!(GenreSort::parse(Some("")), GenreSort::Runtime);
        assert_eq!(GenreSort::parse(None), GenreSort::Runtime);
    }

    #[test]
    fn test_unknown_genre_sort_matches_omitted_sort() {
        let now = Utc::now();
        let page = Page { size: 10, index: 1 };
        assert_eq!(
            genre_window("Drama", GenreSort::parse(Some("banana")), page, now),
            genre_window("Drama", GenreSort::parse(None), page, now),
        );
    }

    #[test]
    fn test_genre_window_is_twelve_months_back() {
        let now = Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap();
        let spec = genre_window("Comedy", GenreSort::Time, Page { size: 5, index: 3 }, now);
        assert_eq!(
            spec,
            QuerySpec {
                filter: Filter::GenreSince {
                    genre: "Comedy".into(),
                    released_since: Utc.with_ymd_and_hms(2023, 3, 15, 12, 0, 0).unwrap(),
                },
                sort: SortOrder::ReleaseDesc,
                skip: 10,
                limit: 5,
            }
        );
    }

    #[test]
    fn test_genre_window_clamps_month_end() {
        let now = Utc.with_ymd_and_hms(2024, 2, 29, 0, 0, 0).unwrap();
        let spec = genre_window("Drama", GenreSort::Rating, Page { size: 1, index: 1 }, now);
        let Filter::GenreSince { released_since, .. } = spec.filter else {
            panic!("expected a genre filter");
        };
        assert_eq!(released_since, Utc.with_ymd_and_hms(2023, 2, 28, 0, 0, 0).unwrap());
        assert_eq!(spec.sort, SortOrder::RatingDesc);
    }

    #[test]
    fn test_fixed_listing_orders() {
        let page = Page { size: 20, index: 4 };
        assert_eq!(most_watched(page).sort, SortOrder::RuntimeDesc);
        assert_eq!(most_watched(page).filter, Filter::None);
        assert_eq!(latest(page).sort, SortOrder::ReleaseDesc);
        assert_eq!(latest(page).skip, 60);
    }

    #[test]
    fn test_search_ranks_by_relevance() {
        let spec = search("space western", Page { size: 10, index: 1 });
        assert_eq!(spec.filter, Filter::Text("space western".into()));
        assert_eq!(spec.sort, SortOrder::Relevance);
        assert_eq!(spec.skip, 0);
    }

    #[test]
    fn test_comment_listing_shape() {
        let movie = ObjectId::new();
        let spec = movie_comments(movie, Page { size: 20, index: 2 });
        assert_eq!(spec.filter, Filter::CommentsOf(movie));
        assert_eq!(spec.sort, SortOrder::Insertion);
        assert_eq!((spec.skip, spec.limit), (20, 20));
    }
}
