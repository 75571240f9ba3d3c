/// Failures reading structure out of a loaded page, or misusing tabs.
///
/// Navigators report missing elements with these variants so callers can
/// tell a page-structure problem apart from a transport failure.
#[derive(Debug, thiserror::Error)]
pub enum HarvestError {
    #[error("Element not found: {selector}")]
    ElementNotFound { selector: String },

    #[error("Element {selector} has no {attribute:?} attribute")]
    MissingAttribute { selector: String, attribute: String },

    #[error("Malformed {field}: {value:?}")]
    MalformedField { field: &'static str, value: String },

    #[error("Invalid purchase reference {href:?}: {source}")]
    InvalidReference {
        href: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Page index must be at least 1, got {0}")]
    InvalidPage(u64),

    #[error("An auxiliary tab is already open")]
    AuxiliaryTabOpen,

    #[error("Unknown tab: {0}")]
    UnknownTab(String),

    #[error("The primary tab cannot be closed")]
    PrimaryTabClose,
}
