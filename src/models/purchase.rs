use std::fmt;

use rust_decimal::Decimal;
use url::Url;

/// Lifecycle state of a purchase as shown on the list page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PurchaseStatus {
    /// "En camino"
    Pending,
    /// "Entregado"
    Received,
    /// "Compra cancelada"
    Canceled,
}

impl PurchaseStatus {
    /// Map a list-page status label onto a known status.
    ///
    /// Labels outside the fixed table return `None`; callers drop those
    /// records instead of treating them as errors.
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "En camino" => Some(Self::Pending),
            "Entregado" => Some(Self::Received),
            "Compra cancelada" => Some(Self::Canceled),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Pending => "En camino",
            Self::Received => "Entregado",
            Self::Canceled => "Compra cancelada",
        }
    }

    /// Whether purchases in this state are detail-fetched and counted.
    pub fn is_eligible(self) -> bool {
        !matches!(self, Self::Canceled)
    }
}

impl fmt::Display for PurchaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pending => "pending",
            Self::Received => "received",
            Self::Canceled => "canceled",
        };
        f.write_str(name)
    }
}

/// One entry of the paginated purchase list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListRecord {
    /// Canonical detail page URL.
    pub reference: Url,
    /// Status label, trimmed but otherwise as rendered.
    pub status: String,
}

impl ListRecord {
    pub fn new(reference: Url, status: impl Into<String>) -> Self {
        Self {
            reference,
            status: status.into(),
        }
    }

    pub fn purchase_status(&self) -> Option<PurchaseStatus> {
        PurchaseStatus::from_label(&self.status)
    }
}

/// A purchase line. Not extracted yet, so `DetailRecord::items` stays empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineItem {
    pub name: String,
    pub quantity: String,
    pub value: Decimal,
}

/// Fields read from one purchase detail page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailRecord {
    /// Order number as displayed, e.g. `#2000005123456789`.
    pub id: String,
    /// Localized purchase date, e.g. `15 de mayo de 2023`.
    pub date: String,
    pub total: Decimal,
    pub payment_method: String,
    pub items: Vec<LineItem>,
}
