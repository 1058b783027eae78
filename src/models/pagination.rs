use serde::{Deserialize, Serialize};

pub const DEFAULT_PER_PAGE: usize = 50;

/// Page position within an in-memory, order-stable listing.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pagination {
    pub current_page: usize,
    pub per_page: usize,
    pub total: usize,
    pub last_page: usize,
    pub has_more: bool,
}

impl Pagination {
    /// `page` and `per_page` are clamped to at least 1.
    pub fn new(total: usize, page: usize, per_page: usize) -> Self {
        let per_page = per_page.max(1);
        let current_page = page.max(1);
        let last_page = total.div_ceil(per_page);
        Self {
            current_page,
            per_page,
            total,
            last_page,
            has_more: current_page < last_page,
        }
    }

    /// Shape reported when a listing could not be read.
    pub fn empty(per_page: usize) -> Self {
        Self::new(0, 1, per_page)
    }

    /// Index range of this page within the full sequence.
    pub fn range(&self) -> std::ops::Range<usize> {
        let start = (self.current_page - 1)
            .saturating_mul(self.per_page)
            .min(self.total);
        let end = start.saturating_add(self.per_page).min(self.total);
        start..end
    }
}

/// Slice one page out of `items`.
pub fn paginate<T: Clone>(items: &[T], page: usize, per_page: usize) -> (Vec<T>, Pagination) {
    let pagination = Pagination::new(items.len(), page, per_page);
    (items[pagination.range()].to_vec(), pagination)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_page_rounds_up() {
        let p = Pagination::new(101, 1, 50);
        assert_eq!(p.last_page, 3);
        assert!(p.has_more);
        assert!(!Pagination::new(101, 3, 50).has_more);
        assert_eq!(Pagination::new(0, 1, 50).last_page, 0);
        assert!(!Pagination::new(0, 1, 50).has_more);
    }

    #[test]
    fn pages_concatenate_to_the_original_sequence() {
        let items: Vec<u32> = (0..23).collect();
        for per_page in 1..=25 {
            let last = Pagination::new(items.len(), 1, per_page).last_page;
            let mut seen = Vec::new();
            for page in 1..=last {
                let (slice, p) = paginate(&items, page, per_page);
                assert_eq!(p.has_more, page < last);
                seen.extend(slice);
            }
            assert_eq!(seen, items, "per_page = {per_page}");
        }
    }

    #[test]
    fn page_past_the_end_is_empty() {
        let (slice, p) = paginate(&[1, 2, 3], 9, 2);
        assert!(slice.is_empty());
        assert_eq!(p.current_page, 9);
        assert!(!p.has_more);
    }
}
