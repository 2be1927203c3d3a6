//! Rating patches: in-place coherency across buckets and session replay

mod common;

use common::{catalog, product, FakeCatalog};
use soundstore_core::cache::spawn_rating_listener;
use soundstore_core::{
    CacheEvent, CatalogConfig, CategoryQuery, FileSessionStore, MemorySessionStore,
    ProductCache, RatingJournal, RatingSink, RatingUpdate, SessionStore,
};
use std::sync::Arc;
use tokio::sync::mpsc;

fn fake_with_buckets() -> Arc<FakeCatalog> {
    Arc::new(
        FakeCatalog::new(catalog(), Vec::new())
            .with_category_page(
                "headphones",
                1,
                1,
                vec![
                    product("p2", "Studio Headphones", "headphones", 199.0),
                    product("p3", "Wireless Earbuds", "headphones", 89.0),
                ],
            )
            .with_category_page(
                "bestsellers",
                1,
                1,
                vec![
                    product("p1", "Bluetooth Speaker", "speakers", 120.0),
                    product("p2", "Studio Headphones", "headphones", 199.0),
                ],
            ),
    )
}

async fn warm(cache: &ProductCache) {
    let query = CategoryQuery::default();
    cache.get_products(false).await.unwrap();
    cache
        .get_category_products("headphones", &query, false)
        .await
        .unwrap();
    cache
        .get_category_products("bestsellers", &query, false)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_patch_reaches_every_cached_copy_and_nothing_else() {
    let fake = fake_with_buckets();
    let cache = ProductCache::with_defaults(Arc::clone(&fake) as _);
    warm(&cache).await;
    let mut events = cache.event_bus().subscribe();

    let copies = cache.apply_rating_update(&RatingUpdate::new("p2", 4.5, 10));
    assert_eq!(copies, 3);

    let p2 = cache.get_product_by_id("p2").unwrap();
    assert_eq!(p2.average_rating, 4.5);
    assert_eq!(p2.total_reviews, 10);

    let query = CategoryQuery::default();
    for category in ["headphones", "bestsellers"] {
        let page = cache
            .get_category_products(category, &query, false)
            .await
            .unwrap();
        assert!(page.from_cache, "patch must not invalidate {}", category);
        for p in page.data {
            if p.id == "p2" {
                assert_eq!((p.average_rating, p.total_reviews), (4.5, 10));
            } else {
                assert_eq!((p.average_rating, p.total_reviews), (4.0, 3));
            }
        }
    }

    let untouched = cache.get_product_by_id("p1").unwrap();
    assert_eq!((untouched.average_rating, untouched.total_reviews), (4.0, 3));

    assert!(matches!(
        events.recv().await.unwrap(),
        CacheEvent::RatingPatched { product_id, copies: 3 } if product_id == "p2"
    ));

    // No refetch was needed
    assert_eq!(FakeCatalog::calls(&fake.product_calls), 1);
    assert_eq!(FakeCatalog::calls(&fake.category_product_calls), 2);
}

#[tokio::test]
async fn test_patch_before_any_fetch_is_recorded() {
    let fake = fake_with_buckets();
    let session: Arc<dyn SessionStore> = Arc::new(MemorySessionStore::new());
    let cache = ProductCache::new(
        Arc::clone(&fake) as _,
        &CatalogConfig::default(),
        Arc::clone(&session),
    );

    assert_eq!(cache.apply_rating_update(&RatingUpdate::new("p3", 2.0, 5)), 0);

    let records = RatingJournal::new(session).load().unwrap();
    assert_eq!(records["p3"].average_rating, 2.0);

    // Later fetches of the older backend aggregate see the patched rating
    cache.get_products(false).await.unwrap();
    let p3 = cache.get_product_by_id("p3").unwrap();
    assert_eq!((p3.average_rating, p3.total_reviews), (2.0, 5));
    assert_eq!(cache.status().rating_overrides, 1);
}

#[tokio::test]
async fn test_new_instance_replays_journal() {
    let dir = tempfile::tempdir().unwrap();
    let session: Arc<dyn SessionStore> = Arc::new(FileSessionStore::new(dir.path()));
    let fake = fake_with_buckets();

    {
        let cache = ProductCache::new(
            Arc::clone(&fake) as _,
            &CatalogConfig::default(),
            Arc::clone(&session),
        );
        warm(&cache).await;
        cache.apply_rating_update(&RatingUpdate::new("p1", 4.9, 42));
    }

    // Simulated reload: fresh cache, backend still serves the old rating
    let reloaded = ProductCache::new(
        Arc::clone(&fake) as _,
        &CatalogConfig::default(),
        Arc::clone(&session),
    );
    assert_eq!(reloaded.status().rating_overrides, 1);

    reloaded.get_products(false).await.unwrap();
    let p1 = reloaded.get_product_by_id("p1").unwrap();
    assert_eq!((p1.average_rating, p1.total_reviews), (4.9, 42));

    let bestsellers = reloaded
        .get_category_products("bestsellers", &CategoryQuery::default(), false)
        .await
        .unwrap();
    let p1_in_bucket = bestsellers.data.iter().find(|p| p.id == "p1").unwrap();
    assert_eq!(p1_in_bucket.average_rating, 4.9);
}

#[tokio::test]
async fn test_explicit_hydrate_patches_already_cached_copies() {
    let fake = fake_with_buckets();
    let session: Arc<dyn SessionStore> = Arc::new(MemorySessionStore::new());
    let cache = ProductCache::new(
        Arc::clone(&fake) as _,
        &CatalogConfig::default(),
        Arc::clone(&session),
    );
    warm(&cache).await;

    // Another tab wrote to the shared session
    RatingJournal::new(Arc::clone(&session))
        .record(&RatingUpdate::new("p3", 3.3, 7), chrono::Utc::now())
        .unwrap();

    assert_eq!(cache.hydrate(), 1);
    let p3 = cache.get_product_by_id("p3").unwrap();
    assert_eq!((p3.average_rating, p3.total_reviews), (3.3, 7));
}

#[tokio::test]
async fn test_corrupt_journal_is_ignored_on_construction() {
    let session: Arc<dyn SessionStore> = Arc::new(MemorySessionStore::new());
    session.set(RatingJournal::KEY, "{ not json").unwrap();

    let cache = ProductCache::new(
        fake_with_buckets() as _,
        &CatalogConfig::default(),
        session,
    );
    assert_eq!(cache.status().rating_overrides, 0);
    assert_eq!(cache.hydrate(), 0);
}

#[tokio::test]
async fn test_clear_cache_keeps_session_patches() {
    let fake = fake_with_buckets();
    let cache = ProductCache::with_defaults(Arc::clone(&fake) as _);
    warm(&cache).await;

    cache.apply_rating_update(&RatingUpdate::new("p4", 1.5, 12));
    cache.clear_cache();

    cache.get_products(false).await.unwrap();
    assert_eq!(cache.get_product_by_id("p4").unwrap().average_rating, 1.5);
}

#[tokio::test]
async fn test_submission_flow_through_channel() {
    let fake = fake_with_buckets();
    let cache = Arc::new(ProductCache::with_defaults(Arc::clone(&fake) as _));
    warm(&cache).await;

    let sink: Arc<dyn RatingSink> = cache.clone();
    let (tx, rx) = mpsc::channel(4);
    let listener = spawn_rating_listener(sink, rx);

    tx.send(RatingUpdate::new("p2", 5.0, 11)).await.unwrap();
    drop(tx);
    assert_eq!(listener.await.unwrap(), 1);

    assert_eq!(cache.get_product_by_id("p2").unwrap().total_reviews, 11);
}

fn set_backend_rating(fake: &FakeCatalog, id: &str, average: f64, reviews: u32) {
    for p in fake.products.write().iter_mut().filter(|p| p.id == id) {
        p.average_rating = average;
        p.total_reviews = reviews;
    }
}

#[tokio::test]
async fn test_backend_moving_past_a_patch_wins_on_refetch() {
    let fake = fake_with_buckets();
    let session: Arc<dyn SessionStore> = Arc::new(MemorySessionStore::new());
    let cache = ProductCache::new(
        Arc::clone(&fake) as _,
        &CatalogConfig::default(),
        Arc::clone(&session),
    );
    warm(&cache).await;

    cache.apply_rating_update(&RatingUpdate::new("p1", 4.5, 10));
    set_backend_rating(&fake, "p1", 3.9, 25);

    cache.get_products(true).await.unwrap();
    let p1 = cache.get_product_by_id("p1").unwrap();
    assert_eq!((p1.average_rating, p1.total_reviews), (3.9, 25));

    // The patch is gone for good: overlay and journal both dropped it
    assert_eq!(cache.status().rating_overrides, 0);
    assert!(RatingJournal::new(Arc::clone(&session))
        .load()
        .unwrap()
        .is_empty());

    set_backend_rating(&fake, "p1", 4.0, 26);
    cache.get_products(true).await.unwrap();
    assert_eq!(cache.get_product_by_id("p1").unwrap().total_reviews, 26);
}

#[tokio::test]
async fn test_backend_catching_up_exactly_releases_patch_but_stale_one_does_not() {
    let fake = fake_with_buckets();
    let cache = ProductCache::with_defaults(Arc::clone(&fake) as _);
    warm(&cache).await;

    cache.apply_rating_update(&RatingUpdate::new("p1", 4.5, 10));
    cache.apply_rating_update(&RatingUpdate::new("p2", 4.8, 20));
    set_backend_rating(&fake, "p1", 4.4, 10);

    cache.get_products(true).await.unwrap();

    let p1 = cache.get_product_by_id("p1").unwrap();
    assert_eq!((p1.average_rating, p1.total_reviews), (4.4, 10));
    // p2 is still behind on the backend (3 reviews)
    let p2 = cache.get_product_by_id("p2").unwrap();
    assert_eq!((p2.average_rating, p2.total_reviews), (4.8, 20));
    assert_eq!(cache.status().rating_overrides, 1);
}

#[tokio::test]
async fn test_clear_session_drops_overlay_and_journal() {
    let fake = fake_with_buckets();
    let session: Arc<dyn SessionStore> = Arc::new(MemorySessionStore::new());
    let cache = ProductCache::new(
        Arc::clone(&fake) as _,
        &CatalogConfig::default(),
        Arc::clone(&session),
    );
    warm(&cache).await;

    cache.apply_rating_update(&RatingUpdate::new("p2", 4.9, 30));
    cache.apply_rating_update(&RatingUpdate::new("p4", 1.0, 9));

    assert_eq!(cache.clear_session().unwrap(), 2);
    assert_eq!(cache.status().rating_overrides, 0);
    assert_eq!(session.get(RatingJournal::KEY).unwrap(), None);

    // Refetches now return backend ratings untouched
    cache.get_products(true).await.unwrap();
    let p2 = cache.get_product_by_id("p2").unwrap();
    assert_eq!((p2.average_rating, p2.total_reviews), (4.0, 3));
}
