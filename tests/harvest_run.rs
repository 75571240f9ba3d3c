mod support;

use anyhow::Result;
use purchase_harvester::harvest::{
    site, FailurePolicy, HarvestError, HarvestEvent, Harvester, Navigator, SkippedItem,
};
use rust_decimal::Decimal;
use support::{FakePurchase, FakeSite};

fn mixed_purchases() -> Vec<FakePurchase> {
    vec![
        FakePurchase::new(1, "Entregado", 1000),
        FakePurchase::new(2, "Compra cancelada", 99_000),
        FakePurchase::new(3, "En camino", 2500),
        FakePurchase::new(4, "Devolución en curso", 7_000),
        FakePurchase::new(5, "Entregado", 0),
    ]
}

#[tokio::test]
async fn harvest_totals_eligible_purchases() -> Result<()> {
    let purchases = mixed_purchases();
    let mut harvester = Harvester::new(FakeSite::with_purchases(&purchases));

    let report = harvester.run(|_| {}).await?;

    assert_eq!(report.total_count, 5);
    assert_eq!(report.total_pages, 1);
    assert_eq!(report.records.len(), 5);
    assert_eq!(report.buckets.pending.len(), 1);
    assert_eq!(report.buckets.received.len(), 2);
    assert_eq!(report.buckets.canceled.len(), 1);

    // Pending first, then received, each in list order.
    let ids: Vec<_> = report.details.iter().map(|d| d.id.clone()).collect();
    assert_eq!(ids, vec![purchases[2].id(), purchases[0].id(), purchases[4].id()]);

    assert_eq!(report.summary.total, Decimal::from(3500));
    assert_eq!(report.summary.count, 3);
    assert_eq!(
        report.summary.largest.as_ref().map(|d| d.id.clone()),
        Some(purchases[2].id())
    );
    assert!(report.skipped.is_empty());

    let fake = harvester.into_navigator();
    assert_eq!(fake.visit_count(&purchases[1].detail_url()), 0);
    assert_eq!(fake.visit_count(&purchases[3].detail_url()), 0);
    assert_eq!(fake.active_tab(), fake.primary_tab());
    assert_eq!(fake.max_open_tabs, 2);
    Ok(())
}

#[tokio::test]
async fn harvest_reports_progress_in_order() -> Result<()> {
    let purchases: Vec<_> = (1..=12)
        .map(|n| FakePurchase::new(n, if n % 2 == 0 { "Entregado" } else { "Compra cancelada" }, 10))
        .collect();
    let mut harvester = Harvester::new(FakeSite::with_purchases(&purchases));

    let mut events = Vec::new();
    harvester.run(|event| events.push(event.clone())).await?;

    assert_eq!(
        events[..5],
        [
            HarvestEvent::CountResolved {
                purchases: 12,
                pages: 2
            },
            HarvestEvent::PageLoading { page: 1 },
            HarvestEvent::PageLoaded { page: 1, entries: 10 },
            HarvestEvent::PageLoading { page: 2 },
            HarvestEvent::PageLoaded { page: 2, entries: 2 },
        ]
    );
    assert_eq!(
        events[5],
        HarvestEvent::Classified {
            pending: 0,
            received: 6,
            canceled: 6
        }
    );
    let detail_loads = events
        .iter()
        .filter(|e| matches!(e, HarvestEvent::DetailLoading { .. }))
        .count();
    assert_eq!(detail_loads, 6);
    Ok(())
}

#[tokio::test]
async fn strict_policy_aborts_on_broken_detail() {
    let purchases = vec![
        FakePurchase::new(1, "Entregado", 1000),
        FakePurchase::new(2, "Entregado", 2000).malformed(),
        FakePurchase::new(3, "Entregado", 3000),
    ];
    let mut harvester = Harvester::new(FakeSite::with_purchases(&purchases));
    assert_eq!(harvester.policy(), FailurePolicy::Strict);

    let err = harvester.run(|_| {}).await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<HarvestError>(),
        Some(HarvestError::MalformedField { .. })
    ));

    let fake = harvester.into_navigator();
    assert_eq!(fake.visit_count(&purchases[2].detail_url()), 0);
    assert_eq!(fake.active_tab(), fake.primary_tab());
}

#[tokio::test]
async fn lenient_policy_skips_broken_detail() -> Result<()> {
    let purchases = vec![
        FakePurchase::new(1, "Entregado", 1000),
        FakePurchase::new(2, "Entregado", 2000).malformed(),
        FakePurchase::new(3, "En camino", 3000),
    ];
    let mut harvester =
        Harvester::new(FakeSite::with_purchases(&purchases)).with_policy(FailurePolicy::Lenient);

    let mut skipped_events = 0;
    let report = harvester
        .run(|event| {
            if matches!(event, HarvestEvent::Skipped(_)) {
                skipped_events += 1;
            }
        })
        .await?;

    assert_eq!(report.details.len(), 2);
    assert_eq!(report.summary.total, Decimal::from(4000));
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(skipped_events, 1);
    match &report.skipped[0] {
        SkippedItem::Detail { reference, error } => {
            assert_eq!(reference.as_str(), purchases[1].detail_url());
            assert!(error.contains("Malformed date and id"));
        }
        other => panic!("unexpected skip: {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn lenient_policy_skips_broken_page() -> Result<()> {
    let purchases: Vec<_> = (1..=15)
        .map(|n| FakePurchase::new(n, "Entregado", 100))
        .collect();
    let fake = FakeSite::with_purchases(&purchases)
        .with_page(&site::list_page_url(1), "<html><body>Mantenimiento</body></html>");
    let mut harvester = Harvester::new(fake).with_policy(FailurePolicy::Lenient);

    let report = harvester.run(|_| {}).await?;

    assert_eq!(report.records.len(), 5);
    assert_eq!(report.details.len(), 5);
    assert_eq!(report.summary.total, Decimal::from(500));
    assert!(matches!(
        report.skipped.as_slice(),
        [SkippedItem::Page { page: 1, .. }]
    ));
    Ok(())
}

#[tokio::test]
async fn strict_policy_aborts_on_broken_page() {
    let purchases: Vec<_> = (1..=15)
        .map(|n| FakePurchase::new(n, "Entregado", 100))
        .collect();
    let fake = FakeSite::with_purchases(&purchases)
        .with_page(&site::list_page_url(2), "<html><body></body></html>");
    let mut harvester = Harvester::new(fake);

    let err = harvester.run(|_| {}).await.unwrap_err();
    assert!(format!("{err:#}").contains("page 2"));

    let fake = harvester.into_navigator();
    assert_eq!(fake.max_open_tabs, 1);
}
