/// Pagination contract shared by every paged listing
///
/// All ledgers page through records the same way: a `PageRequest` with a
/// 1-based page number and a page size goes in, a `Page` carrying the slice
/// of items plus the total number of matching records comes out.
///
/// Items are always returned in creation order, so page 2 with a limit of 10
/// holds items 11 through 20.
///
/// # Example
///
/// ```
/// use teamboard_shared::models::pagination::{Page, PageRequest};
///
/// let request = PageRequest::new(Some(2), Some(10));
/// assert_eq!(request.offset(), 10);
///
/// let items: Vec<u32> = (1..=25).collect();
/// let page = Page::from_slice(&items, request);
/// assert_eq!(page.items, (11..=20).collect::<Vec<_>>());
/// assert_eq!(page.total, 25);
/// ```

use serde::{Deserialize, Serialize};

/// Default page number when none is supplied
pub const DEFAULT_PAGE: u32 = 1;

/// Default page size when none is supplied
pub const DEFAULT_LIMIT: u32 = 10;

/// Largest page size a caller may request
pub const MAX_LIMIT: u32 = 100;

/// Requested page of a listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// 1-based page number
    pub page: u32,

    /// Number of items per page
    pub limit: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl PageRequest {
    /// Builds a page request from optional raw query values
    ///
    /// Missing values fall back to page 1 and limit 10. Out-of-range values
    /// are clamped: a page below 1 becomes 1, a limit below 1 becomes the
    /// default and a limit above `MAX_LIMIT` becomes `MAX_LIMIT`.
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Self {
        let page = match page {
            Some(p) if p >= 1 => u32::try_from(p).unwrap_or(u32::MAX),
            _ => DEFAULT_PAGE,
        };

        let limit = match limit {
            Some(l) if l >= 1 => u32::try_from(l).unwrap_or(MAX_LIMIT).min(MAX_LIMIT),
            _ => DEFAULT_LIMIT,
        };

        Self { page, limit }
    }

    /// Number of records to skip
    pub fn offset(&self) -> i64 {
        (i64::from(self.page) - 1) * i64::from(self.limit)
    }

    /// Page size as a SQL `LIMIT` value
    pub fn limit(&self) -> i64 {
        i64::from(self.limit)
    }
}

/// One page of a listing together with the full matching count
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    /// Items on this page
    pub items: Vec<T>,

    /// Total number of matching records across all pages
    pub total: i64,
}

impl<T> Page<T> {
    /// Creates a page from already-fetched items and a total count
    pub fn new(items: Vec<T>, total: i64) -> Self {
        Self { items, total }
    }

    /// Transforms the items while keeping the total
    pub fn map<U, F>(self, f: F) -> Page<U>
    where
        F: FnMut(T) -> U,
    {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
        }
    }
}

impl<T: Clone> Page<T> {
    /// Cuts a page out of an in-memory slice that is already in creation order
    pub fn from_slice(all: &[T], request: PageRequest) -> Self {
        let offset = usize::try_from(request.offset()).unwrap_or(usize::MAX);
        let items = all
            .iter()
            .skip(offset)
            .take(request.limit as usize)
            .cloned()
            .collect();

        Self {
            items,
            total: all.len() as i64,
        }
    }
}
