//! Remote API seam.
//!
//! [`Remote`] is the capability set a list view drives: fetch one page or one
//! record, create, update, delete. [`http::HttpApi`] talks to the real service; [`memory::MemoryApi`]
//! keeps rows in memory for demo mode and tests.

pub mod http;
pub mod memory;
pub mod session;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::ApiResult;
use crate::model::{Entity, Scope};
use crate::search::normalize_keyword;

pub use session::{ApiConfig, Session, SharedSession};

pub const MAX_PAGE_SIZE: usize = 100;

/// One page request. `page_index` is 1-based.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageQuery {
    pub page_index: usize,
    pub page_size: usize,
    pub keyword: String,
    pub scope: Scope,
}

impl PageQuery {
    pub fn new(page_index: usize, page_size: usize, keyword: impl Into<String>) -> Self {
        Self {
            page_index: page_index.max(1),
            page_size: page_size.clamp(1, MAX_PAGE_SIZE),
            keyword: keyword.into(),
            scope: Scope::All,
        }
    }

    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    /// Index of the first row of this page in the filtered set.
    pub fn offset(&self) -> usize {
        (self.page_index - 1) * self.page_size
    }
}

impl Default for PageQuery {
    fn default() -> Self {
        Self::new(1, 10, "")
    }
}

/// Rows of one page plus the size of the whole filtered set.
#[derive(Clone, Debug, PartialEq)]
pub struct Page<E> {
    pub rows: Vec<E>,
    pub total: usize,
}

impl<E> Page<E> {
    /// Number of pages for `page_size`; never less than one.
    pub fn page_count(total: usize, page_size: usize) -> usize {
        total.div_ceil(page_size.max(1)).max(1)
    }
}

/// `{ "content": T }`
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub content: T,
}

/// `content` of a paged search: `{ "data": [...], "totalRow": n }`
#[derive(Debug, Deserialize)]
pub struct PagedContent<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
    #[serde(rename = "totalRow", default)]
    pub total_row: usize,
}

/// Filter by keyword and cut one page out of a full listing.
///
/// Returns rows `[(p-1)*s, p*s)` of the filtered set; a page past the end is empty,
/// never padded.
pub fn paginate<E: Entity>(rows: Vec<E>, query: &PageQuery) -> Page<E> {
    let needle = normalize_keyword(&query.keyword);
    let filtered: Vec<E> = rows.into_iter().filter(|r| r.matches(&needle)).collect();
    let total = filtered.len();
    let rows = filtered
        .into_iter()
        .skip(query.offset())
        .take(query.page_size)
        .collect();
    Page { rows, total }
}

#[async_trait]
pub trait Remote<E: Entity>: Send + Sync {
    fn backend_tag(&self) -> &'static str;

    async fn fetch_page(&self, query: &PageQuery) -> ApiResult<Page<E>>;

    /// One record by id.
    async fn fetch_one(&self, id: i64) -> ApiResult<E>;

    /// Returns the created record when the server echoes it.
    async fn create(&self, record: &E) -> ApiResult<Option<E>>;

    async fn update(&self, id: i64, record: &E) -> ApiResult<Option<E>>;

    async fn delete(&self, id: i64) -> ApiResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Booking, Room};

    fn rooms(n: i64) -> Vec<Room> {
        (1..=n)
            .map(|i| Room {
                id: i,
                name: if i % 3 == 0 { format!("room101-{i}") } else { format!("suite-{i}") },
                ..Room::default()
            })
            .collect()
    }

    #[test]
    fn pages_are_half_open_slices_of_the_filtered_set() {
        let page = paginate(rooms(25), &PageQuery::new(2, 10, ""));
        assert_eq!(page.total, 25);
        let ids: Vec<i64> = page.rows.iter().map(|r| r.id).collect();
        assert_eq!(ids, (11..=20).collect::<Vec<_>>());

        let last = paginate(rooms(25), &PageQuery::new(3, 10, ""));
        assert_eq!(last.rows.len(), 5);

        let past = paginate(rooms(25), &PageQuery::new(4, 10, ""));
        assert!(past.rows.is_empty());
        assert_eq!(past.total, 25);
    }

    #[test]
    fn keyword_is_trimmed_and_case_insensitive() {
        let page = paginate(rooms(30), &PageQuery::new(1, 10, "  ROOM101 "));
        assert_eq!(page.total, 10);
        assert!(page.rows.iter().all(|r| r.name.starts_with("room101")));
    }

    #[test]
    fn query_clamps_index_and_size() {
        let q = PageQuery::new(0, 0, "x");
        assert_eq!((q.page_index, q.page_size), (1, 1));
        assert_eq!(PageQuery::new(1, 1000, "").page_size, MAX_PAGE_SIZE);
        assert_eq!(PageQuery::new(3, 20, "").offset(), 40);
        assert_eq!(Page::<Room>::page_count(0, 10), 1);
        assert_eq!(Page::<Room>::page_count(21, 10), 3);
    }

    #[test]
    fn envelopes_decode() {
        let json = r#"{"statusCode":200,"content":{"pageIndex":1,"pageSize":10,"totalRow":42,"keywords":null,
            "data":[{"id":1,"maPhong":3,"ngayDen":"2024-01-01T00:00:00","ngayDi":"2024-01-03T00:00:00","soLuongKhach":2,"maNguoiDung":9}]},
            "dateTime":"2024-01-01T00:00:00"}"#;
        let env: Envelope<PagedContent<Booking>> = serde_json::from_str(json).unwrap();
        assert_eq!(env.content.total_row, 42);
        assert_eq!(env.content.data[0].user_id, 9);
    }
}
