//! Totals over harvested purchase details.

use rust_decimal::Decimal;

use crate::models::DetailRecord;

/// Aggregate figures for a set of purchases in the account currency.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Summary {
    pub total: Decimal,
    pub count: usize,
    pub largest: Option<DetailRecord>,
    pub smallest: Option<DetailRecord>,
}

impl Summary {
    pub fn from_details(details: &[DetailRecord]) -> Self {
        Self {
            total: total(details),
            count: details.len(),
            // Ties keep the earliest record.
            largest: details
                .iter()
                .reduce(|best, d| if d.total > best.total { d } else { best })
                .cloned(),
            smallest: details
                .iter()
                .reduce(|best, d| if d.total < best.total { d } else { best })
                .cloned(),
        }
    }
}

/// Sum of every record's `total`, starting from zero.
pub fn total(details: &[DetailRecord]) -> Decimal {
    details
        .iter()
        .fold(Decimal::ZERO, |acc, detail| acc + detail.total)
}
