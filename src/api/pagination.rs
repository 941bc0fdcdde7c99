use serde::Serialize;

pub(crate) const DEFAULT_LIMIT: i64 = 20;
pub(crate) const MAX_LIMIT: i64 = 100;

/// 1-based page window resolved from optional query values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PageWindow {
    pub(crate) page: i64,
    pub(crate) limit: i64,
}

impl PageWindow {
    pub(crate) fn from_query(page: Option<i64>, limit: Option<i64>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT),
        }
    }

    pub(crate) fn skip(self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct PaginatedResponse<T> {
    pub(crate) items: Vec<T>,
    pub(crate) total: i64,
    pub(crate) page: i64,
    pub(crate) limit: i64,
    pub(crate) pages: i64,
}

impl<T> PaginatedResponse<T> {
    pub(crate) fn new(items: Vec<T>, total: i64, window: PageWindow) -> Self {
        let pages = if total == 0 { 0 } else { (total + window.limit - 1) / window.limit };
        Self { items, total, page: window.page, limit: window.limit, pages }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_clamps_inputs() {
        let window = PageWindow::from_query(Some(0), Some(500));
        assert_eq!(window, PageWindow { page: 1, limit: MAX_LIMIT });
        assert_eq!(window.skip(), 0);

        let window = PageWindow::from_query(Some(3), None);
        assert_eq!(window.skip(), 2 * DEFAULT_LIMIT);
    }

    #[test]
    fn pages_round_up() {
        let window = PageWindow::from_query(Some(1), Some(10));
        assert_eq!(PaginatedResponse::new(vec![1, 2], 21, window).pages, 3);
        assert_eq!(PaginatedResponse::<i32>::new(Vec::new(), 0, window).pages, 0);
    }
}
