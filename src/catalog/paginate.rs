//! Fixed-size pages and the "load more" accumulator

use serde::Serialize;

/// One page of an in-memory result list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub page_size: usize,
    pub total: usize,
    pub total_pages: usize,
    pub has_more: bool,
}

/// Slice `items` into 1-based pages. Page 0 is read as page 1 and a zero page
/// size as 1.
pub fn paginate<T: Clone>(items: &[T], page: usize, page_size: usize) -> Page<T> {
    let page = page.max(1);
    let page_size = page_size.max(1);
    let total = items.len();
    let total_pages = total.div_ceil(page_size);

    let start = (page - 1).saturating_mul(page_size).min(total);
    let end = start.saturating_add(page_size).min(total);

    Page {
        items: items[start..end].to_vec(),
        page,
        page_size,
        total,
        total_pages,
        has_more: end < total,
    }
}

/// Number of records currently revealed by infinite scroll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadMore {
    page_size: usize,
    visible: usize,
}

impl LoadMore {
    pub fn new(page_size: usize) -> Self {
        let page_size = page_size.max(1);
        Self {
            page_size,
            visible: page_size,
        }
    }

    /// Records to render out of `total`
    pub fn visible(&self, total: usize) -> usize {
        self.visible.min(total)
    }

    pub fn has_more(&self, total: usize) -> bool {
        self.visible < total
    }

    /// Reveal the next page. Returns false once everything is visible.
    pub fn load_more(&mut self, total: usize) -> bool {
        if !self.has_more(total) {
            return false;
        }
        self.visible = self.visible.saturating_add(self.page_size).min(total);
        true
    }

    /// Back to the first page, e.g. after the filters change
    pub fn reset(&mut self) {
        self.visible = self.page_size;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slices_into_pages() {
        let items: Vec<u32> = (1..=7).collect();

        let first = paginate(&items, 1, 3);
        assert_eq!(first.items, vec![1, 2, 3]);
        assert_eq!(first.total_pages, 3);
        assert!(first.has_more);

        let last = paginate(&items, 3, 3);
        assert_eq!(last.items, vec![7]);
        assert!(!last.has_more);
    }

    #[test]
    fn out_of_range_page_is_empty() {
        let items = vec!["a", "b"];
        let page = paginate(&items, 9, 2);
        assert!(page.items.is_empty());
        assert_eq!(page.total, 2);
        assert!(!page.has_more);
    }

    #[test]
    fn zero_page_and_size_are_clamped() {
        let items = vec![1, 2, 3];
        let page = paginate(&items, 0, 0);
        assert_eq!(page.page, 1);
        assert_eq!(page.page_size, 1);
        assert_eq!(page.items, vec![1]);
    }

    #[test]
    fn load_more_grows_until_exhausted() {
        let mut scroll = LoadMore::new(4);
        assert_eq!(scroll.visible(10), 4);
        assert!(scroll.load_more(10));
        assert_eq!(scroll.visible(10), 8);
        assert!(scroll.load_more(10));
        assert_eq!(scroll.visible(10), 10);
        assert!(!scroll.load_more(10));

        scroll.reset();
        assert_eq!(scroll.visible(10), 4);
        assert_eq!(scroll.visible(2), 2);
    }
}
