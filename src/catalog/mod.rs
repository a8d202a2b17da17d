//! Pure storefront logic over the fetched catalogue: filtering, pagination
//! and price quotes.

pub mod filter;
pub mod pricing;

pub use filter::{MemoryTier, PlanFilter, PlanQuery};
pub use pricing::{DURATION_OPTIONS, DurationOption, Quote};

use serde::Serialize;

/// One page of an in-memory list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub total_pages: usize,
    pub total_items: usize,
}

/// Slices `items` into 1-based pages. Out-of-range page numbers are clamped,
/// and an empty list still has one (empty) page.
pub fn paginate<T: Clone>(items: &[T], page: usize, page_size: usize) -> Page<T> {
    let page_size = page_size.max(1);
    let total_items = items.len();
    let total_pages = total_items.div_ceil(page_size).max(1);
    let page = page.clamp(1, total_pages);
    let start = (page - 1) * page_size;
    let end = (start + page_size).min(total_items);

    Page {
        items: items[start.min(end)..end].to_vec(),
        page,
        total_pages,
        total_items,
    }
}
