//! Everything pinned to the structure of the purchases site.
//!
//! URLs, selectors and the text conventions of the rendered pages live here
//! and nowhere else. When the site markup changes, this is the file to edit.

use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;
use url::Url;

use super::{Extract, Field, HarvestError};

pub const BASE_URL: &str = "https://myaccount.mercadolibre.com.co";

/// Unauthenticated same-domain route loaded before cookies can be set.
const PLACEHOLDER_PATH: &str = "/404";
const LIST_PATH: &str = "/my_purchases/list";

/// Entries shown per list page.
pub const PAGE_SIZE: u64 = 10;

pub const PURCHASE_COUNT: Field = Field {
    name: "purchase count",
    selector: ".list-header__subtitle > span:nth-child(1)",
    extract: Extract::Text,
};

pub const LIST_CONTAINER: &str = ".list-item-container";
pub const LIST_ENTRY: &str = ".list-item-grouper";

pub const ENTRY_REFERENCE: Field = Field {
    name: "purchase reference",
    selector: "a.andes-button--loud",
    extract: Extract::Attribute("href"),
};

pub const ENTRY_STATUS: Field = Field {
    name: "purchase status",
    selector: ".list-item__intro span.bf-ui-rich-text",
    extract: Extract::Text,
};

pub const DETAIL_DATE_ID: Field = Field {
    name: "date and id",
    selector: ".bf-ui-ticket__subtitle > span:nth-child(1)",
    extract: Extract::Text,
};

pub const DETAIL_PRICE: Field = Field {
    name: "price",
    selector: "meta[itemprop=price]",
    extract: Extract::Attribute("content"),
};

pub const DETAIL_PAYMENT_METHOD: Field = Field {
    name: "payment method",
    selector: ".bf-ui-ticket-row__right-column--secondary-text > span:nth-child(2)",
    extract: Extract::Text,
};

static FIRST_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]+").expect("static regex is valid"));

pub fn placeholder_url() -> String {
    format!("{BASE_URL}{PLACEHOLDER_PATH}")
}

/// Summary view exposing the total purchase count.
pub fn list_url() -> String {
    format!("{BASE_URL}{LIST_PATH}")
}

pub fn list_page_url(page: u64) -> String {
    format!("{BASE_URL}{LIST_PATH}?page={page}")
}

/// Resolve a call-to-action `href` against the site root.
pub fn resolve_reference(href: &str) -> Result<Url, HarvestError> {
    let href = href.trim();
    let base = Url::parse(BASE_URL).map_err(|source| HarvestError::InvalidReference {
        href: BASE_URL.to_string(),
        source,
    })?;
    base.join(href)
        .map_err(|source| HarvestError::InvalidReference {
            href: href.to_string(),
            source,
        })
}

/// First run of ASCII digits in free text such as `"123 compras"`.
///
/// Text without digits means no purchases, so it yields 0 rather than an
/// error.
pub fn parse_purchase_count(text: &str) -> Result<u64, HarvestError> {
    match FIRST_NUMBER.find(text) {
        None => Ok(0),
        Some(digits) => digits
            .as_str()
            .parse()
            .map_err(|_| HarvestError::MalformedField {
                field: PURCHASE_COUNT.name,
                value: text.to_string(),
            }),
    }
}

/// Split `"15 de mayo de 2023 | #123456789"` into `(date, id)`.
///
/// The id is the segment right after the first `|`.
pub fn split_date_id(text: &str) -> Result<(String, String), HarvestError> {
    let mut parts = text.split('|');
    let date = parts.next().unwrap_or_default().trim();
    let id = parts.next().ok_or_else(|| HarvestError::MalformedField {
        field: DETAIL_DATE_ID.name,
        value: text.to_string(),
    })?;
    Ok((date.to_string(), id.trim().to_string()))
}

/// Parse the `content` of the price meta tag.
///
/// The site writes whole amounts with `.` as a thousands separator
/// (`"1.234.567"`), so every dot is dropped and the rest must be an integer.
pub fn parse_price(content: &str) -> Result<Decimal, HarvestError> {
    let digits: String = content.trim().chars().filter(|c| *c != '.').collect();
    digits
        .parse::<i64>()
        .map(Decimal::from)
        .map_err(|_| HarvestError::MalformedField {
            field: DETAIL_PRICE.name,
            value: content.to_string(),
        })
}
