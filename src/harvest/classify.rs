use crate::models::{ListRecord, PurchaseStatus};

/// List records partitioned by status.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusBuckets {
    pub pending: Vec<ListRecord>,
    pub received: Vec<ListRecord>,
    pub canceled: Vec<ListRecord>,
}

impl StatusBuckets {
    pub fn get(&self, status: PurchaseStatus) -> &[ListRecord] {
        match status {
            PurchaseStatus::Pending => &self.pending,
            PurchaseStatus::Received => &self.received,
            PurchaseStatus::Canceled => &self.canceled,
        }
    }

    /// Records that get detail-fetched: pending first, then received.
    pub fn eligible(&self) -> impl Iterator<Item = &ListRecord> {
        self.pending.iter().chain(self.received.iter())
    }

    pub fn eligible_count(&self) -> usize {
        self.pending.len() + self.received.len()
    }

    pub fn len(&self) -> usize {
        self.pending.len() + self.received.len() + self.canceled.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Partition `records` by status label, keeping input order in each bucket.
///
/// Records whose label is not in the status table are dropped.
pub fn classify(records: &[ListRecord]) -> StatusBuckets {
    let mut buckets = StatusBuckets::default();
    for record in records {
        match record.purchase_status() {
            Some(PurchaseStatus::Pending) => buckets.pending.push(record.clone()),
            Some(PurchaseStatus::Received) => buckets.received.push(record.clone()),
            Some(PurchaseStatus::Canceled) => buckets.canceled.push(record.clone()),
            None => {
                tracing::debug!(status = %record.status, reference = %record.reference, "Dropping purchase with unknown status");
            }
        }
    }
    buckets
}
