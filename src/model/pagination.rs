use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// The maximum number of page buttons shown at once.
pub const PAGE_WINDOW: u32 = 5;

/// The page sizes offered by the page size selector.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum PageSize {
    #[default]
    Ten,
    TwentyFive,
    Fifty,
    Hundred,
}

impl PageSize {
    pub const ALL: [PageSize; 4] = [
        PageSize::Ten,
        PageSize::TwentyFive,
        PageSize::Fifty,
        PageSize::Hundred,
    ];

    pub fn get(&self) -> u32 {
        match self {
            PageSize::Ten => 10,
            PageSize::TwentyFive => 25,
            PageSize::Fifty => 50,
            PageSize::Hundred => 100,
        }
    }
}

impl TryFrom<u32> for PageSize {
    type Error = String;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        PageSize::ALL
            .into_iter()
            .find(|size| size.get() == value)
            .ok_or_else(|| format!("Page size must be one of 10, 25, 50 or 100, got {value}"))
    }
}

impl From<PageSize> for u32 {
    fn from(value: PageSize) -> Self {
        value.get()
    }
}

impl FromStr for PageSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let n: u32 = s
            .trim()
            .parse()
            .map_err(|_| format!("Page size must be a number, got '{s}'"))?;
        PageSize::try_from(n)
    }
}

impl Display for PageSize {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.get())
    }
}

/// Where the table is within the server-side result set.
///
/// `current_page` is 1-based and is not clamped against `total_pages`: callers that move pages
/// are expected to stay in range.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub struct Pagination {
    current_page: u32,
    page_size: PageSize,
    total_records: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            current_page: 1,
            page_size: PageSize::default(),
            total_records: 0,
        }
    }
}

impl Pagination {
    pub fn new(current_page: u32, page_size: PageSize) -> Self {
        Self {
            current_page,
            page_size,
            total_records: 0,
        }
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn page_size(&self) -> PageSize {
        self.page_size
    }

    pub fn total_records(&self) -> u64 {
        self.total_records
    }

    pub fn set_page(&mut self, page: u32) {
        self.current_page = page;
    }

    /// Changing the page size always goes back to the first page.
    pub fn set_page_size(&mut self, page_size: PageSize) {
        self.page_size = page_size;
        self.current_page = 1;
    }

    pub fn set_total_records(&mut self, total_records: u64) {
        self.total_records = total_records;
    }

    pub fn total_pages(&self) -> u32 {
        total_pages(u64::from(self.page_size.get()), self.total_records)
    }

    pub fn visible_pages(&self) -> Vec<u32> {
        visible_page_numbers(
            self.current_page,
            u64::from(self.page_size.get()),
            self.total_records,
        )
    }

    pub fn has_previous(&self) -> bool {
        self.current_page > 1
    }

    pub fn has_next(&self) -> bool {
        self.current_page < self.total_pages()
    }

    /// The 1-based indices of the first and last record on the current page, for
    /// "Showing a-b of n". `None` when there are no records.
    pub fn showing_range(&self) -> Option<(u64, u64)> {
        if self.total_records == 0 {
            return None;
        }
        let size = u64::from(self.page_size.get());
        let first = u64::from(self.current_page.saturating_sub(1)) * size + 1;
        let last = (u64::from(self.current_page) * size).min(self.total_records);
        Some((first, last))
    }
}

/// `ceil(total_records / page_size)`, or 0 for a zero page size.
pub fn total_pages(page_size: u64, total_records: u64) -> u32 {
    if page_size == 0 {
        return 0;
    }
    u32::try_from(total_records.div_ceil(page_size)).unwrap_or(u32::MAX)
}

/// Computes the page buttons to show: at most five consecutive page numbers, centered on
/// `current_page` except near either end where the window sticks to the first or last five pages.
/// Returns an empty list when there are no pages.
pub fn visible_page_numbers(current_page: u32, page_size: u64, total_records: u64) -> Vec<u32> {
    let total = total_pages(page_size, total_records);
    if total <= PAGE_WINDOW {
        return (1..=total).collect();
    }
    let first = if current_page <= 3 {
        1
    } else if current_page >= total - 2 {
        total - (PAGE_WINDOW - 1)
    } else {
        current_page - 2
    };
    (first..first + PAGE_WINDOW).collect()
}
