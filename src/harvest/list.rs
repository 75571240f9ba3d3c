use anyhow::{Context, Result};

use super::{site, HarvestError, Navigator};
use crate::models::ListRecord;

/// Load list page `page` (1-based) in the active tab and return its entries
/// in display order.
///
/// A missing container or a missing element inside any entry fails the whole
/// page; no partial results are returned.
pub async fn list_page<N: Navigator + ?Sized>(navigator: &mut N, page: u64) -> Result<Vec<ListRecord>> {
    if page == 0 {
        return Err(HarvestError::InvalidPage(page).into());
    }

    navigator
        .goto(&site::list_page_url(page))
        .await
        .with_context(|| format!("Failed to load purchases page {page}"))?;

    let entries = navigator
        .read_entries(
            site::LIST_CONTAINER,
            site::LIST_ENTRY,
            &[site::ENTRY_REFERENCE, site::ENTRY_STATUS],
        )
        .await
        .with_context(|| format!("Failed to read purchases on page {page}"))?;

    let mut records = Vec::with_capacity(entries.len());
    for values in entries {
        let [href, status] = <[String; 2]>::try_from(values).map_err(|values| {
            anyhow::anyhow!(
                "Navigator returned {} values for a 2-field entry",
                values.len()
            )
        })?;
        let reference = site::resolve_reference(&href)?;
        records.push(ListRecord::new(reference, status.trim()));
    }

    tracing::debug!(page, entries = records.len(), "Read purchases page");
    Ok(records)
}
