use serde::Serialize;

/// One zero-indexed page of a larger result.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub content: Vec<T>,
    pub total_elements: usize,
    pub total_pages: usize,
    pub size: usize,
    pub number: usize,
    pub first: bool,
    pub last: bool,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, total_elements: usize, number: usize, size: usize) -> Self {
        let size = size.max(1);
        let total_pages = total_elements.div_ceil(size).max(1);
        Self {
            content,
            total_elements,
            total_pages,
            size,
            number,
            first: number == 0,
            last: number.saturating_add(1) >= total_pages,
        }
    }
}

/// Slice an in-memory list into the requested page.
pub fn paginate<T>(items: Vec<T>, number: usize, size: usize) -> Page<T> {
    let size = size.max(1);
    let total = items.len();
    let content = items.into_iter().skip(number.saturating_mul(size)).take(size).collect();
    Page::new(content, total, number, size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paginate_middle_page() {
        let page = paginate((0..25).collect::<Vec<_>>(), 1, 10);
        assert_eq!(page.content, (10..20).collect::<Vec<_>>());
        assert_eq!(page.total_elements, 25);
        assert_eq!(page.total_pages, 3);
        assert!(!page.first);
        assert!(!page.last);
    }

    #[test]
    fn test_paginate_last_partial_page() {
        let page = paginate((0..25).collect::<Vec<_>>(), 2, 10);
        assert_eq!(page.content, vec![20, 21, 22, 23, 24]);
        assert!(page.last);
    }

    #[test]
    fn test_empty_result_has_one_page() {
        let page: Page<i32> = paginate(Vec::new(), 0, 10);
        assert_eq!(page.total_pages, 1);
        assert!(page.first && page.last);
        assert!(page.content.is_empty());
    }

    #[test]
    fn test_huge_page_number_is_empty() {
        let page = paginate(vec![1, 2, 3], usize::MAX, 10);
        assert!(page.content.is_empty());
        assert!(page.last);
    }

    #[test]
    fn test_page_past_end_is_empty() {
        let page = paginate(vec![1, 2, 3], 5, 2);
        assert!(page.content.is_empty());
        assert_eq!(page.total_pages, 2);
        assert!(page.last);
    }
}
