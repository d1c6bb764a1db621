/// Ads per listing page.
pub const PAGE_SIZE: u64 = 10;

/// One resolved page of a result set.
///
/// Resolution never fails: a non-numeric or non-positive page number maps to
/// the first page, a number past the end maps to the last page, and an empty
/// result set still has a single empty page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub number: u64,
    pub num_pages: u64,
    pub per_page: u64,
    pub total: u64,
}

impl PageWindow {
    pub fn resolve(requested: Option<&str>, total: u64, per_page: u64) -> Self {
        let per_page = per_page.max(1);
        let num_pages = total.div_ceil(per_page).max(1);
        let number = requested.map_or(1, |raw| clamp_requested(raw, num_pages));

        Self {
            number,
            num_pages,
            per_page,
            total,
        }
    }

    pub fn offset(&self) -> u64 {
        (self.number - 1) * self.per_page
    }

    pub fn has_next(&self) -> bool {
        self.number < self.num_pages
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }
}

fn clamp_requested(raw: &str, num_pages: u64) -> u64 {
    let raw = raw.trim();
    if !is_digits(raw) {
        // "abc", "", "-3", "1.5"
        return 1;
    }
    // Digits that overflow are still "past the end".
    raw.parse::<u64>().unwrap_or(u64::MAX).clamp(1, num_pages)
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fifteen_items_make_two_pages() {
        let first = PageWindow::resolve(None, 15, PAGE_SIZE);
        assert_eq!((first.number, first.num_pages, first.offset()), (1, 2, 0));
        assert!(first.has_next());
        assert!(!first.has_previous());

        let second = PageWindow::resolve(Some("2"), 15, PAGE_SIZE);
        assert_eq!((second.number, second.offset()), (2, 10));
        assert!(!second.has_next());
        assert!(second.has_previous());
    }

    #[test]
    fn garbage_falls_back_to_first_page() {
        for raw in ["abc", "", "  ", "-3", "0", "1.5"] {
            assert_eq!(PageWindow::resolve(Some(raw), 15, PAGE_SIZE).number, 1, "{raw:?}");
        }
    }

    #[test]
    fn past_the_end_falls_back_to_last_page() {
        assert_eq!(PageWindow::resolve(Some("999"), 15, PAGE_SIZE).number, 2);
        assert_eq!(
            PageWindow::resolve(Some("99999999999999999999999"), 15, PAGE_SIZE).number,
            2
        );
    }

    #[test]
    fn empty_set_has_one_page() {
        let window = PageWindow::resolve(Some("3"), 0, PAGE_SIZE);
        assert_eq!((window.number, window.num_pages, window.offset()), (1, 1, 0));
    }
}
