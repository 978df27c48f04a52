//! Pagination.

use serde::{Deserialize, Serialize};

/// Largest page a listing will return.
pub const MAX_PAGE_SIZE: i64 = 10_000;

/// A 1-based page request, already clamped.
///
/// Deserialization goes through [`Page::new`], so a decoded page is clamped
/// like any other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "RawPage")]
pub struct Page {
    number: i64,
    size: i64,
}

#[derive(Deserialize)]
struct RawPage {
    #[serde(default)]
    number: i64,
    #[serde(default)]
    size: i64,
}

impl From<RawPage> for Page {
    fn from(raw: RawPage) -> Self {
        Page::new(raw.number, raw.size)
    }
}

impl Page {
    /// Clamp a raw `(page, page_size)` pair.
    ///
    /// A size of zero, a negative size, or one above [`MAX_PAGE_SIZE`]
    /// becomes [`MAX_PAGE_SIZE`]. A page number of zero or less means
    /// "start from the first row".
    pub fn new(number: i64, size: i64) -> Self {
        let size = if size <= 0 || size > MAX_PAGE_SIZE {
            MAX_PAGE_SIZE
        } else {
            size
        };
        Self { number: number.max(0), size }
    }

    /// Everything, up to the maximum page size.
    pub fn all() -> Self {
        Self::new(0, MAX_PAGE_SIZE)
    }

    /// Requested page number (0 when none was given).
    pub fn number(&self) -> i64 {
        self.number
    }

    /// Row limit.
    pub fn limit(&self) -> i64 {
        self.size
    }

    /// Rows to skip.
    pub fn offset(&self) -> i64 {
        if self.number > 0 {
            (self.number - 1).saturating_mul(self.size)
        } else {
            0
        }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::all()
    }
}

/// One page of rows plus the number of rows matching the filters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paged<T> {
    /// Rows on this page, in order.
    pub items: Vec<T>,
    /// Rows matching the filters before pagination.
    pub total: i64,
}

impl<T> Paged<T> {
    /// Build a page.
    pub fn new(items: Vec<T>, total: i64) -> Self {
        Self { items, total }
    }

    /// Transform every row.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paged<U> {
        Paged {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
        }
    }
}
