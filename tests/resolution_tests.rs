mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use tokio_test::{assert_err, assert_ok};

use showrank::db::{InMemoryShowStore, ShowStore};
use showrank::error::AppError;
use showrank::models::ShowReference;

use common::{show, FakeCatalog, Harness};

fn severance() -> showrank::models::CatalogShow {
    show(42, "Severance", &["drama", "mystery"], 2022, 8.7)
}

#[tokio::test]
async fn test_absent_show_is_saved_once_and_verifiable() {
    let harness = Harness::new(FakeCatalog::with_shows(vec![severance()]));
    let store = InMemoryShowStore::new();
    let resolver = harness.resolver(Arc::new(store.clone()));

    let id = assert_ok!(resolver.resolve(&ShowReference::ExternalId(42)).await);

    assert_eq!(store.upsert_count().await, 1);
    let record = assert_ok!(store.get_by_id(id).await).unwrap();
    assert_eq!(record.external_id, 42);
    assert_eq!(record.title, "Severance");
    assert_eq!(record.total_seasons, Some(2));
    assert_eq!(
        record.poster_url.as_deref(),
        Some("https://image.tmdb.org/t/p/w500/a.jpg")
    );
    assert!(record.color_tag.is_some());
}

#[tokio::test]
async fn test_concurrent_resolves_converge_on_one_record() {
    let harness = Harness::new(FakeCatalog::with_shows(vec![severance()]));
    let store = InMemoryShowStore::new();
    let resolver = harness.resolver(Arc::new(store.clone()));

    let references: Vec<ShowReference> = (0..10)
        .map(|i| {
            if i % 2 == 0 {
                ShowReference::ExternalId(42)
            } else {
                ShowReference::ExternalToken("trakt-42".to_string())
            }
        })
        .collect();

    let results =
        futures::future::join_all(references.iter().map(|r| resolver.resolve(r))).await;
    let ids: Vec<uuid::Uuid> = results.into_iter().map(Result::unwrap).collect();

    assert!(ids.iter().all(|id| *id == ids[0]));
    assert_eq!(store.record_count().await, 1);
    assert_eq!(store.upsert_count().await, 1);
    assert_eq!(harness.catalog.details_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_every_reference_variant_resolves_to_the_same_id() {
    let harness = Harness::new(FakeCatalog::with_shows(vec![severance()]));
    let store = InMemoryShowStore::new();
    let resolver = harness.resolver(Arc::new(store.clone()));

    let first = assert_ok!(
        resolver
            .resolve(&ShowReference::ExternalRef {
                external_id: 42,
                full_record: Some(Box::new(severance())),
            })
            .await
    );

    let variants = vec![
        ShowReference::ExternalId(42),
        ShowReference::ExternalToken("trakt-42".to_string()),
        ShowReference::ExternalRef {
            external_id: 42,
            full_record: None,
        },
        ShowReference::CanonicalId(first.to_string()),
        ShowReference::parse("42"),
        ShowReference::parse("trakt-42"),
        ShowReference::parse(&first.to_string()),
        ShowReference::from(severance()),
    ];

    for variant in &variants {
        assert_eq!(assert_ok!(resolver.resolve(variant).await), first, "{:?}", variant);
    }

    assert_eq!(store.record_count().await, 1);
    assert_eq!(harness.catalog.details_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_batch_resolution_keeps_order() {
    let harness = Harness::new(FakeCatalog::with_shows(vec![
        severance(),
        show(7, "The Bear", &["comedy", "drama"], 2022, 8.5),
    ]));
    let store = InMemoryShowStore::new();
    let resolver = harness.resolver(Arc::new(store.clone()));

    let ids = assert_ok!(
        resolver
            .resolve_many(&[
                ShowReference::ExternalId(7),
                ShowReference::ExternalId(42),
                ShowReference::ExternalToken("trakt-7".to_string()),
            ])
            .await
    );

    assert_eq!(ids.len(), 3);
    assert_eq!(ids[0], ids[2]);
    assert_ne!(ids[0], ids[1]);
    assert_eq!(store.record_count().await, 2);
    assert!(resolver.validate(&ids[1].to_string()).await);
}

#[tokio::test]
async fn test_unknown_show_surfaces_provider_error() {
    let harness = Harness::new(FakeCatalog::with_shows(vec![]));
    let store = InMemoryShowStore::new();
    let resolver = harness.resolver(Arc::new(store.clone()));

    let err = assert_err!(resolver.resolve(&ShowReference::ExternalId(404)).await);
    assert!(matches!(err, AppError::Provider(_)));
    assert_eq!(store.record_count().await, 0);
}

#[tokio::test]
async fn test_reference_without_identity_is_rejected() {
    let harness = Harness::new(FakeCatalog::with_shows(vec![severance()]));
    let resolver = harness.resolver(Arc::new(InMemoryShowStore::new()));

    let err = assert_err!(resolver.resolve(&ShowReference::parse("not-a-show")).await);
    assert!(matches!(err, AppError::Resolution(_)));
}

#[tokio::test]
async fn test_store_without_extended_columns_degrades() {
    let harness = Harness::new(FakeCatalog::with_shows(vec![severance()]));
    let store = InMemoryShowStore::without_extended_columns();
    let resolver = harness.resolver(Arc::new(store.clone()));

    let id = assert_ok!(resolver.resolve(&ShowReference::ExternalId(42)).await);

    let record = assert_ok!(store.get_by_id(id).await).unwrap();
    assert_eq!(record.color_tag, None);
    assert_eq!(record.backdrop_url, None);
    assert_eq!(record.total_seasons, None);
    assert!(record.poster_url.is_some());
    assert_eq!(store.upsert_count().await, 2);
}

#[tokio::test]
async fn test_color_tag_survives_resave() {
    let harness = Harness::new(FakeCatalog::with_shows(vec![severance()]));
    let store = InMemoryShowStore::new();
    let resolver = harness.resolver(Arc::new(store.clone()));

    let first = assert_ok!(resolver.save(&severance()).await);
    let mut renamed = severance();
    renamed.title = "Severance (2022)".to_string();
    let second = assert_ok!(resolver.save(&renamed).await);

    assert_eq!(first.id, second.id);
    assert_eq!(first.color_tag, second.color_tag);
    assert_eq!(second.title, "Severance (2022)");
}
