//! Page arithmetic and the compact page-number window.
//!
//! The window shows at most first, previous, current, next and last page,
//! with an ellipsis standing in for each skipped run:
//!
//! ```text
//! total=9, current=5:  1 … 4 5 6 … 9
//! total=9, current=2:  1 2 3 … 9
//! total=4, current=2:  1 2 3 4
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Windows never collapse at or below this many pages
const FULL_WINDOW_MAX: u64 = 5;

/// Allowed result counts per page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum PageSize {
    #[default]
    Ten,
    Fifteen,
    Twenty,
}

impl PageSize {
    pub const ALL: [PageSize; 3] = [PageSize::Ten, PageSize::Fifteen, PageSize::Twenty];

    pub fn get(self) -> u32 {
        match self {
            PageSize::Ten => 10,
            PageSize::Fifteen => 15,
            PageSize::Twenty => 20,
        }
    }
}

impl TryFrom<u32> for PageSize {
    type Error = String;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            10 => Ok(PageSize::Ten),
            15 => Ok(PageSize::Fifteen),
            20 => Ok(PageSize::Twenty),
            other => Err(format!("page size must be 10, 15 or 20, got {}", other)),
        }
    }
}

impl From<PageSize> for u32 {
    fn from(size: PageSize) -> u32 {
        size.get()
    }
}

impl std::str::FromStr for PageSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: u32 = s
            .trim()
            .parse()
            .map_err(|_| format!("invalid page size: {}", s))?;
        PageSize::try_from(value)
    }
}

impl fmt::Display for PageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.get())
    }
}

/// One slot of the page-number window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageEntry {
    Page(u64),
    Ellipsis,
}

/// Pages serialize as numbers, ellipses as `"..."`
impl Serialize for PageEntry {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PageEntry::Page(n) => serializer.serialize_u64(*n),
            PageEntry::Ellipsis => serializer.serialize_str("..."),
        }
    }
}

impl fmt::Display for PageEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageEntry::Page(n) => write!(f, "{}", n),
            PageEntry::Ellipsis => write!(f, "..."),
        }
    }
}

/// `ceil(total_results / page_size)`
pub fn total_pages(total_results: u64, page_size: PageSize) -> u64 {
    total_results.div_ceil(u64::from(page_size.get()))
}

/// Zero-based offset of the first result on `page` (1-based)
pub fn offset(page: u64, page_size: PageSize) -> u64 {
    page.saturating_sub(1)
        .saturating_mul(u64::from(page_size.get()))
}

/// Page-number window for `current` out of `total` pages
pub fn pagination_window(current: u64, total: u64) -> Vec<PageEntry> {
    if total <= FULL_WINDOW_MAX {
        return (1..=total).map(PageEntry::Page).collect();
    }

    let mut pages = vec![PageEntry::Page(1)];
    if current > 3 {
        pages.push(PageEntry::Ellipsis);
    }

    let start = current.saturating_sub(1).max(2);
    let end = current.saturating_add(1).min(total - 1);
    pages.extend((start..=end).map(PageEntry::Page));

    if current.saturating_add(2) < total {
        pages.push(PageEntry::Ellipsis);
    }
    pages.push(PageEntry::Page(total));

    pages
}

/// A navigation button
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageButton {
    pub entry: PageEntry,
    /// Ellipses and the current page are not clickable
    pub disabled: bool,
    pub current: bool,
}

/// Everything needed to draw the pagination bar
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageControls {
    pub buttons: Vec<PageButton>,
    /// Previous/Next are only shown when there are results
    pub show_prev_next: bool,
    pub prev_disabled: bool,
    pub next_disabled: bool,
}

impl PageControls {
    pub fn new(current: u64, total_pages: u64, total_results: u64) -> Self {
        let buttons = pagination_window(current, total_pages)
            .into_iter()
            .map(|entry| {
                let is_current = entry == PageEntry::Page(current);
                PageButton {
                    entry,
                    disabled: is_current || entry == PageEntry::Ellipsis,
                    current: is_current,
                }
            })
            .collect();

        Self {
            buttons,
            show_prev_next: total_results != 0,
            prev_disabled: current <= 1,
            next_disabled: current >= total_pages,
        }
    }
}
