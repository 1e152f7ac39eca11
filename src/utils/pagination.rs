use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_NUMBER: u64 = 1;
pub const DEFAULT_PAGE_SIZE: u64 = 20;
pub const MAX_PAGE_SIZE: u64 = 100;
/// Largest offset the database driver accepts.
const MAX_SKIP: u64 = i64::MAX as u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    /// Direction as used in a MongoDB sort document.
    pub fn as_mongo(self) -> i32 {
        match self {
            SortOrder::Asc => 1,
            SortOrder::Desc => -1,
        }
    }
}

/// One page of results plus whether another page follows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub is_next: bool,
}

/// 1-based page window. Page numbers below 1 are treated as 1, a zero
/// page size falls back to the default and larger sizes are capped at
/// [`MAX_PAGE_SIZE`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub skip: u64,
    pub limit: u64,
}

impl PageWindow {
    pub fn new(page_number: Option<u64>, page_size: Option<u64>) -> Self {
        let page_number = page_number.unwrap_or(DEFAULT_PAGE_NUMBER).max(1);
        let page_size = match page_size.unwrap_or(DEFAULT_PAGE_SIZE) {
            0 => DEFAULT_PAGE_SIZE,
            n => n.min(MAX_PAGE_SIZE),
        };

        Self {
            skip: (page_number - 1).saturating_mul(page_size).min(MAX_SKIP),
            limit: page_size,
        }
    }

    pub fn is_next(&self, total: u64, returned: usize) -> bool {
        total > self.skip.saturating_add(returned as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_defaults_and_clamps() {
        assert_eq!(PageWindow::new(None, None), PageWindow { skip: 0, limit: 20 });
        assert_eq!(PageWindow::new(Some(0), Some(0)), PageWindow { skip: 0, limit: 20 });
        assert_eq!(PageWindow::new(Some(3), Some(10)), PageWindow { skip: 20, limit: 10 });
    }

    #[test]
    fn oversized_windows_stay_within_driver_range() {
        let window = PageWindow::new(Some(u64::MAX), Some(u64::MAX));
        assert_eq!(window.limit, MAX_PAGE_SIZE);
        assert_eq!(window.skip, i64::MAX as u64);
        assert!(!window.is_next(10, 0));
    }

    #[test]
    fn is_next_compares_total_against_page_end() {
        let first = PageWindow::new(Some(1), Some(2));
        assert!(first.is_next(3, 2));

        let second = PageWindow::new(Some(2), Some(2));
        assert!(!second.is_next(3, 1));
    }
}
