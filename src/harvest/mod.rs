//! Purchase harvesting over one authenticated browser session.
//!
//! A [`Harvester`] owns a [`Navigator`] and drives it through the whole flow:
//! read the purchase count once, load every list page, classify entries by
//! status, then open each pending or received purchase in an auxiliary tab.
//! Everything is sequential; the session is never shared.

#[cfg(feature = "chromium")]
mod chromium;
mod classify;
mod detail;
mod error;
mod list;
mod navigator;
mod pagination;
pub mod site;

#[cfg(feature = "chromium")]
pub use chromium::ChromiumNavigator;
pub use classify::{classify, StatusBuckets};
pub use detail::fetch_detail;
pub use error::HarvestError;
pub use list::list_page;
pub use navigator::{Extract, Field, Navigator, TabHandle};
pub use pagination::{pages_for, PaginationPlanner};

use anyhow::Result;
use url::Url;

use crate::models::{DetailRecord, ListRecord};
use crate::summary::Summary;

/// What to do when a list page or a purchase detail cannot be read.
///
/// Bootstrapping and the purchase count are fatal under either policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Abort the harvest on the first failure.
    #[default]
    Strict,
    /// Log the failure, record it in the report, and keep going.
    Lenient,
}

/// A page or purchase skipped under [`FailurePolicy::Lenient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkippedItem {
    Page { page: u64, error: String },
    Detail { reference: Url, error: String },
}

/// Progress notifications emitted while a harvest runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HarvestEvent {
    CountResolved { purchases: u64, pages: u64 },
    PageLoading { page: u64 },
    PageLoaded { page: u64, entries: usize },
    Classified {
        pending: usize,
        received: usize,
        canceled: usize,
    },
    DetailLoading { reference: Url },
    Skipped(SkippedItem),
}

/// Everything gathered by [`Harvester::run`].
#[derive(Debug, Clone, Default)]
pub struct HarvestReport {
    pub total_count: u64,
    pub total_pages: u64,
    pub records: Vec<ListRecord>,
    pub buckets: StatusBuckets,
    pub details: Vec<DetailRecord>,
    pub skipped: Vec<SkippedItem>,
    pub summary: Summary,
}

/// Owns the browser session for the length of a harvest.
pub struct Harvester<N: Navigator> {
    navigator: N,
    planner: PaginationPlanner,
    policy: FailurePolicy,
}

impl<N: Navigator> Harvester<N> {
    pub fn new(navigator: N) -> Self {
        Self {
            navigator,
            planner: PaginationPlanner::new(),
            policy: FailurePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    pub fn navigator(&self) -> &N {
        &self.navigator
    }

    /// Give the session back, e.g. to shut the browser down.
    pub fn into_navigator(self) -> N {
        self.navigator
    }

    pub async fn total_count(&mut self) -> Result<u64> {
        self.planner.total_count(&mut self.navigator).await
    }

    pub async fn total_pages(&mut self) -> Result<u64> {
        self.planner.total_pages(&mut self.navigator).await
    }

    pub async fn list_page(&mut self, page: u64) -> Result<Vec<ListRecord>> {
        list_page(&mut self.navigator, page).await
    }

    pub async fn fetch_detail(&mut self, reference: &Url) -> Result<DetailRecord> {
        fetch_detail(&mut self.navigator, reference).await
    }

    /// Run the full harvest, reporting progress through `observer`.
    pub async fn run<F>(&mut self, mut observer: F) -> Result<HarvestReport>
    where
        F: FnMut(&HarvestEvent) + Send,
    {
        let total_count = self.total_count().await?;
        let total_pages = self.total_pages().await?;
        tracing::info!(purchases = total_count, pages = total_pages, "Planned harvest");
        observer(&HarvestEvent::CountResolved {
            purchases: total_count,
            pages: total_pages,
        });

        let mut report = HarvestReport {
            total_count,
            total_pages,
            ..HarvestReport::default()
        };

        for page in 1..=total_pages {
            observer(&HarvestEvent::PageLoading { page });
            match self.list_page(page).await {
                Ok(records) => {
                    observer(&HarvestEvent::PageLoaded {
                        page,
                        entries: records.len(),
                    });
                    report.records.extend(records);
                }
                Err(err) => {
                    let skipped = SkippedItem::Page {
                        page,
                        error: format!("{err:#}"),
                    };
                    self.skip_or_fail(err, skipped, &mut report, &mut observer)?;
                }
            }
        }

        if report.records.len() as u64 != total_count {
            tracing::warn!(
                expected = total_count,
                found = report.records.len(),
                "Purchase count changed while paging"
            );
        }

        report.buckets = classify(&report.records);
        observer(&HarvestEvent::Classified {
            pending: report.buckets.pending.len(),
            received: report.buckets.received.len(),
            canceled: report.buckets.canceled.len(),
        });

        let eligible: Vec<Url> = report
            .buckets
            .eligible()
            .map(|record| record.reference.clone())
            .collect();
        for reference in eligible {
            observer(&HarvestEvent::DetailLoading {
                reference: reference.clone(),
            });
            match self.fetch_detail(&reference).await {
                Ok(detail) => report.details.push(detail),
                Err(err) => {
                    // A session stuck on the wrong tab would corrupt every
                    // later read.
                    if self.navigator.active_tab() != self.navigator.primary_tab() {
                        return Err(err.context("Primary tab was not restored"));
                    }
                    let skipped = SkippedItem::Detail {
                        reference,
                        error: format!("{err:#}"),
                    };
                    self.skip_or_fail(err, skipped, &mut report, &mut observer)?;
                }
            }
        }

        report.summary = Summary::from_details(&report.details);
        tracing::info!(
            details = report.details.len(),
            skipped = report.skipped.len(),
            total = %report.summary.total,
            "Harvest finished"
        );
        Ok(report)
    }

    fn skip_or_fail<F>(
        &self,
        err: anyhow::Error,
        skipped: SkippedItem,
        report: &mut HarvestReport,
        observer: &mut F,
    ) -> Result<()>
    where
        F: FnMut(&HarvestEvent),
    {
        match self.policy {
            FailurePolicy::Strict => Err(err),
            FailurePolicy::Lenient => {
                tracing::warn!(error = %format!("{err:#}"), "Skipping after extraction failure");
                observer(&HarvestEvent::Skipped(skipped.clone()));
                report.skipped.push(skipped);
                Ok(())
            }
        }
    }
}
