use anyhow::{bail, Result};

/// Identifies one fetch unit. Valid values live in `[0, page_count)`.
pub type PageIndex = usize;

/// Immutable fetch plan for one collection query.
///
/// Derived once from the collection's total item count and the gateway page
/// size; every page index in `0..page_count()` is fetched exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PagePlan {
    total_items: u64,
    page_size: usize,
    page_count: usize,
}

impl PagePlan {
    /// Builds the minimal plan covering `total_items` entries in pages of
    /// `page_size`. Rejects a zero page size.
    pub fn new(total_items: u64, page_size: usize) -> Result<Self> {
        if page_size == 0 {
            bail!("page_size must be greater than 0");
        }

        let page_count = total_items.div_ceil(page_size as u64) as usize;
        Ok(Self {
            total_items,
            page_size,
            page_count,
        })
    }

    pub fn total_items(&self) -> u64 {
        self.total_items
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn page_count(&self) -> usize {
        self.page_count
    }

    pub fn is_empty(&self) -> bool {
        self.page_count == 0
    }

    /// Gateway item offset of the first entry on `index`.
    pub fn offset(&self, index: PageIndex) -> u64 {
        (index as u64).saturating_mul(self.page_size as u64)
    }

    /// Planned page indices in ascending order.
    pub fn indices(&self) -> impl Iterator<Item = PageIndex> {
        0..self.page_count
    }
}
