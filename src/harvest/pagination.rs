use anyhow::{Context, Result};

use super::{site, Navigator};

/// Derives record and page counts from the list summary, fetching it once.
#[derive(Debug, Clone)]
pub struct PaginationPlanner {
    total_records: Option<u64>,
    page_size: u64,
}

impl Default for PaginationPlanner {
    fn default() -> Self {
        Self::new()
    }
}

impl PaginationPlanner {
    pub fn new() -> Self {
        Self {
            total_records: None,
            page_size: site::PAGE_SIZE,
        }
    }

    pub fn page_size(&self) -> u64 {
        self.page_size
    }

    /// Total purchases on the account.
    ///
    /// The first call navigates the active tab to the summary view; later
    /// calls reuse the cached value.
    pub async fn total_count<N: Navigator + ?Sized>(&mut self, navigator: &mut N) -> Result<u64> {
        if let Some(count) = self.total_records {
            return Ok(count);
        }

        navigator
            .goto(&site::list_url())
            .await
            .context("Failed to load purchase summary")?;
        let text = navigator.read(&site::PURCHASE_COUNT).await?;
        let count = site::parse_purchase_count(&text)?;

        tracing::debug!(count, summary = %text.trim(), "Resolved purchase count");
        self.total_records = Some(count);
        Ok(count)
    }

    pub async fn total_pages<N: Navigator + ?Sized>(&mut self, navigator: &mut N) -> Result<u64> {
        let count = self.total_count(navigator).await?;
        Ok(pages_for(count, self.page_size))
    }

    /// Page indices to visit, `1..=total_pages`. Empty when there are no
    /// purchases.
    pub async fn page_range<N: Navigator + ?Sized>(
        &mut self,
        navigator: &mut N,
    ) -> Result<std::ops::RangeInclusive<u64>> {
        let pages = self.total_pages(navigator).await?;
        Ok(1..=pages)
    }
}

/// `ceil(count / page_size)`.
pub fn pages_for(count: u64, page_size: u64) -> u64 {
    count.div_ceil(page_size)
}
