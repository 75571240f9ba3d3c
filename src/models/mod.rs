mod purchase;

pub use purchase::{DetailRecord, LineItem, ListRecord, PurchaseStatus};
