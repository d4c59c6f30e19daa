//! Row filtering and pagination for the dashboard tables.

use serde::{Deserialize, Serialize};

/// One page of rows plus the totals needed to draw the pager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub page_size: usize,
    pub total_items: u64,
    pub total_pages: u32,
}

/// Slice `rows` to the 1-based `page`. Page 0 is treated as page 1; pages
/// past the end come back empty with the real totals.
pub fn paginate<T>(rows: Vec<T>, page: u32, page_size: usize) -> Paginated<T> {
    let page = page.max(1);
    let page_size = page_size.max(1);
    let total_items = rows.len() as u64;
    let total_pages = rows.len().div_ceil(page_size) as u32;
    let start = (page as usize - 1).saturating_mul(page_size);
    let items = rows.into_iter().skip(start).take(page_size).collect();

    Paginated {
        items,
        page,
        page_size,
        total_items,
        total_pages,
    }
}

/// Case-insensitive substring match on name or e-mail. An empty query
/// matches everything.
pub fn matches_search(query: Option<&str>, name: &str, email: &str) -> bool {
    let Some(query) = query.map(str::trim).filter(|q| !q.is_empty()) else {
        return true;
    };
    let needle = query.to_lowercase();
    name.to_lowercase().contains(&needle) || email.to_lowercase().contains(&needle)
}

/// Case-insensitive equality, with `all` (or nothing) matching everything.
pub fn matches_choice(choice: Option<&str>, value: &str) -> bool {
    match choice.map(str::trim) {
        None | Some("") => true,
        Some(c) if c.eq_ignore_ascii_case("all") => true,
        Some(c) => c.eq_ignore_ascii_case(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paginate() {
        let rows: Vec<u32> = (1..=10).collect();
        let page = paginate(rows.clone(), 3, 4);
        assert_eq!(page.items, vec![9, 10]);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.total_items, 10);

        let first = paginate(rows.clone(), 0, 4);
        assert_eq!(first.page, 1);
        assert_eq!(first.items, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_page_past_end_is_empty() {
        let page = paginate(vec![1, 2, 3], 5, 4);
        assert!(page.items.is_empty());
        assert_eq!(page.total_items, 3);
        assert_eq!(page.total_pages, 1);

        let empty = paginate(Vec::<u32>::new(), 1, 4);
        assert_eq!(empty.total_pages, 0);
    }

    #[test]
    fn test_search() {
        assert!(matches_search(None, "Ana", "ana@x.com"));
        assert!(matches_search(Some("  "), "Ana", "ana@x.com"));
        assert!(matches_search(Some("ANA"), "Ana Souza", ""));
        assert!(matches_search(Some("x.com"), "Ana", "ana@x.com"));
        assert!(!matches_search(Some("bruno"), "Ana", "ana@x.com"));
    }

    #[test]
    fn test_choice() {
        assert!(matches_choice(Some("all"), "PIX"));
        assert!(matches_choice(Some("pix"), "PIX"));
        assert!(!matches_choice(Some("boleto"), "PIX"));
        assert!(matches_choice(None, "PIX"));
    }
}
