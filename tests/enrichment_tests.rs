mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use tokio_test::assert_ok;

use showrank::db::InMemoryShowStore;
use showrank::services::scoring::BECAUSE_YOU_WATCHED_MIN_SCORE;
use showrank::services::RecommendationService;

use common::{show, FakeCatalog, Harness};

#[tokio::test]
async fn test_concurrent_enrich_issues_one_set_of_provider_calls() {
    let harness = Harness::new(FakeCatalog::with_shows(vec![]));
    let office = show(1390, "The Office", &["comedy"], 2005, 8.6);

    let (a, b) = tokio::join!(harness.enrichment.enrich(&office), harness.enrichment.enrich(&office));

    assert_eq!(a, b);
    assert_eq!(harness.primary.calls(), 1);
    assert_eq!(harness.secondary.calls(), 1);
    assert_eq!(harness.tertiary.calls(), 1);
    assert_eq!(harness.catalog.season_calls.load(Ordering::SeqCst), 1);

    assert!(a.is_enriched);
    assert_eq!(a.poster_url.as_deref(), Some("https://image.tmdb.org/t/p/w500/a.jpg"));
    assert_eq!(a.total_seasons, Some(2));
}

#[tokio::test]
async fn test_enrichment_completes_after_caller_gives_up() {
    let harness = Harness::new(FakeCatalog::with_shows(vec![]));
    let office = show(1390, "The Office", &["comedy"], 2005, 8.6);

    let abandoned = tokio::time::timeout(
        std::time::Duration::from_millis(1),
        harness.enrichment.enrich(&office),
    )
    .await;
    assert!(abandoned.is_err());

    let result = harness.enrichment.enrich(&office).await;
    assert!(result.is_enriched);
    assert_eq!(harness.primary.calls(), 1);
}

#[tokio::test]
async fn test_many_shows_enrich_independently() {
    let harness = Harness::new(FakeCatalog::with_shows(vec![]));
    let shows: Vec<_> = (1..=20)
        .map(|id| show(id, &format!("Show {}", id), &["drama"], 2020, 7.5))
        .collect();

    let results =
        futures::future::join_all(shows.iter().map(|s| harness.enrichment.enrich(s))).await;

    assert_eq!(results.len(), 20);
    assert!(results.iter().zip(&shows).all(|(r, s)| r.external_id == s.external_id()));
    assert_eq!(harness.primary.calls(), 20);

    harness.enrichment.clear_cache().await;
    assert_eq!(harness.enrichment.cached(1).await, None);
}

#[tokio::test]
async fn test_because_you_watched_end_to_end() {
    let seed = show(1, "Mindhunter", &["crime", "drama"], 2017, 8.6);
    let mut catalog = FakeCatalog::with_shows(vec![seed]);
    catalog.related = vec![
        show(2, "True Detective", &["crime", "drama", "mystery"], 2014, 8.9),
        show(3, "Ozark", &["crime", "drama"], 2017, 8.4),
        show(4, "BoJack Horseman", &["animation", "comedy"], 2014, 8.7),
        show(5, "Manifest", &["drama", "mystery"], 2018, 5.9),
    ];

    let harness = Harness::new(catalog);
    let service = RecommendationService::new(
        harness.catalog.clone(),
        Arc::new(InMemoryShowStore::new()),
        harness.enrichment.clone(),
    );

    let ranked = assert_ok!(service.because_you_watched(1, BECAUSE_YOU_WATCHED_MIN_SCORE).await);
    let titles: Vec<&str> = ranked.iter().map(|s| s.show.title.as_str()).collect();

    // Manifest only survives the relaxed pass; BoJack never does
    assert_eq!(titles, vec!["Ozark", "True Detective", "Manifest"]);
    assert!(ranked.iter().all(|s| s.score >= BECAUSE_YOU_WATCHED_MIN_SCORE));
    assert!(ranked
        .iter()
        .all(|s| s.enrichment.as_ref().is_some_and(|e| e.is_enriched)));
}
