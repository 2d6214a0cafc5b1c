//! Paged list results and the query parameters that request them.

use serde::Serialize;

/// Default page size used by list views.
pub const DEFAULT_PAGE_SIZE: u64 = 10;

/// Largest page size the console will ask for.
pub const MAX_PAGE_SIZE: u64 = 100;

/// One page of records, independent of how the backend shaped it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub records: Vec<T>,
    pub total: u64,
    /// 1-based page number.
    pub current: u64,
    pub size: u64,
}

impl<T> Page<T> {
    /// Wrap a complete, unpaged list as a single page.
    pub fn from_list(records: Vec<T>) -> Self {
        let total = records.len() as u64;
        Self {
            records,
            total,
            current: 1,
            size: total,
        }
    }

    /// Convert each record, keeping the paging metadata.
    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Page<U> {
        Page {
            records: self.records.into_iter().map(f).collect(),
            total: self.total,
            current: self.current,
            size: self.size,
        }
    }

    /// Number of pages implied by `total` and `size`.
    pub fn pages(&self) -> u64 {
        if self.size == 0 {
            return 0;
        }
        self.total.div_ceil(self.size)
    }
}

/// `?current=&size=` query parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageQuery {
    pub current: u64,
    pub size: u64,
}

impl PageQuery {
    /// Build a query, clamping the page to at least 1 and the size to
    /// `1..=MAX_PAGE_SIZE`.
    pub fn new(current: u64, size: u64) -> Self {
        Self {
            current: current.max(1),
            size: size.clamp(1, MAX_PAGE_SIZE),
        }
    }
}

impl Default for PageQuery {
    fn default() -> Self {
        Self::new(1, DEFAULT_PAGE_SIZE)
    }
}
