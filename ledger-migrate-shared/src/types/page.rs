/// A window over a stably ordered legacy table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub offset: u64,
    pub limit: u64,
}

impl PageWindow {
    /// The first window of the given size.
    pub fn first(limit: u64) -> Self {
        Self { offset: 0, limit }
    }

    /// The window immediately after this one.
    pub fn next(&self) -> Self {
        Self {
            offset: self.offset.saturating_add(self.limit),
            limit: self.limit,
        }
    }

    /// Whether a page of `fetched` rows means the table is exhausted.
    pub fn is_last(&self, fetched: usize) -> bool {
        (fetched as u64) < self.limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_windows_advance_by_limit() {
        let window = PageWindow::first(100);
        assert_eq!(window.offset, 0);
        assert_eq!(window.next(), PageWindow { offset: 100, limit: 100 });
        assert_eq!(window.next().next().offset, 200);
    }

    #[test]
    fn test_short_page_is_last() {
        let window = PageWindow::first(3);
        assert!(window.is_last(0));
        assert!(window.is_last(2));
        assert!(!window.is_last(3));
    }
}
