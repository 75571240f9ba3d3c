use anyhow::{Context, Result};
use url::Url;

use super::{site, Navigator, TabHandle};
use crate::models::DetailRecord;

/// Read one purchase detail page in a throwaway tab.
///
/// The auxiliary tab is closed and focus returns to the primary tab on every
/// exit path. When both extraction and cleanup fail, the extraction error is
/// returned and the cleanup error is logged.
pub async fn fetch_detail<N: Navigator + ?Sized>(
    navigator: &mut N,
    reference: &Url,
) -> Result<DetailRecord> {
    let primary = navigator.primary_tab().clone();
    let tab = navigator
        .open_tab()
        .await
        .context("Failed to open purchase detail tab")?;

    let extracted = extract_detail(navigator, reference).await;
    let restored = restore(navigator, &tab, &primary).await;

    match (extracted, restored) {
        (Ok(detail), Ok(())) => Ok(detail),
        (Ok(_), Err(err)) => Err(err),
        (Err(err), Ok(())) => Err(err),
        (Err(err), Err(cleanup)) => {
            tracing::warn!(error = %cleanup, tab = %tab, "Failed to clean up after detail error");
            Err(err)
        }
    }
}

async fn extract_detail<N: Navigator + ?Sized>(
    navigator: &mut N,
    reference: &Url,
) -> Result<DetailRecord> {
    navigator
        .goto(reference.as_str())
        .await
        .with_context(|| format!("Failed to load purchase {reference}"))?;

    let date_id = navigator.read(&site::DETAIL_DATE_ID).await?;
    let (date, id) = site::split_date_id(&date_id)?;

    let price = navigator.read(&site::DETAIL_PRICE).await?;
    let total = site::parse_price(&price)?;

    let payment_method = navigator
        .read(&site::DETAIL_PAYMENT_METHOD)
        .await?
        .trim()
        .to_string();

    Ok(DetailRecord {
        id,
        date,
        total,
        payment_method,
        items: Vec::new(),
    })
}

async fn restore<N: Navigator + ?Sized>(
    navigator: &mut N,
    tab: &TabHandle,
    primary: &TabHandle,
) -> Result<()> {
    let closed = navigator
        .close_tab(tab)
        .await
        .with_context(|| format!("Failed to close tab {tab}"));
    // Switch back even if closing failed, so the primary tab stays usable.
    navigator
        .switch_to(primary)
        .await
        .with_context(|| format!("Failed to switch back to primary tab {primary}"))?;
    closed
}
