//! Integration tests for the recommender against both store backends.
//!
//! These tests prove that the snapshot rebuild and the two recommendation
//! queries behave identically through the `Store` seam, and that the
//! failure signals (`false` / `None`) are returned instead of errors
//! escaping the public surface.

use std::sync::Arc;

use shop_recommender::config::Config;
use shop_recommender::db;
use shop_recommender::migrate;
use shop_recommender::models::{EliteRating, PopularItem};
use shop_recommender::recommend::Recommender;
use shop_recommender::store::memory::InMemoryStore;
use shop_recommender::store::sqlite::SqliteStore;
use shop_recommender::store::Store;
use sqlx::SqlitePool;
use tempfile::TempDir;

const TS: i64 = 1_700_000_000;

// ─── Helpers ────────────────────────────────────────────────────────

fn test_config(tmp: &TempDir) -> Config {
    let db_path = tmp.path().join("shop.sqlite");
    let config_content = format!(
        r#"
[db]
path = "{}"

[recommend]
default_k = 10
"#,
        db_path.display()
    );
    toml::from_str(&config_content).unwrap()
}

async fn setup_pool(cfg: &Config) -> SqlitePool {
    migrate::run_migrations(cfg).await.unwrap();
    db::connect(cfg).await.unwrap()
}

async fn exec(pool: &SqlitePool, sql: &str) {
    sqlx::raw_sql(sql).execute(pool).await.unwrap();
}

/// Base facts shared by the SQLite tests.
///
/// Category 1: item 1 sells 5 units, item 2 sells 3, item 3 sells 1 —
/// popular tiers are items 1 and 2. Category 2: item 4 is never sold.
/// Customer 100 rated item 1 (4) and item 2 (2); customer 101 rated
/// item 1 (3). Customer 300 is an elite member who rated items 1 (5)
/// and 4 (4).
async fn seed_base_facts(pool: &SqlitePool) {
    exec(
        pool,
        r#"
        INSERT INTO categories VALUES (1, 'Books'), (2, 'Games');
        INSERT INTO items VALUES (1, 1), (2, 1), (3, 1), (4, 2);
        INSERT INTO customers VALUES
            (100, 'ada'), (101, 'grace'), (300, 'edsger'), (1599, 'alan');
        INSERT INTO purchases VALUES
            (100, 1, 5, 1700000000),
            (101, 2, 3, 1700000000),
            (100, 3, 1, 1700000000);
        INSERT INTO ratings VALUES
            (100, 1, 4),
            (101, 1, 3),
            (100, 2, 2),
            (300, 1, 5),
            (300, 4, 4);
        INSERT INTO elite_members VALUES (300);
        "#,
    )
    .await;
}

// ─── Snapshot rebuild (SQLite) ──────────────────────────────────────

#[tokio::test]
async fn test_rebuild_populates_both_snapshots() {
    let tmp = TempDir::new().unwrap();
    let cfg = test_config(&tmp);
    let pool = setup_pool(&cfg).await;
    seed_base_facts(&pool).await;

    let store = Arc::new(SqliteStore::new(pool.clone()));
    let recommender = Recommender::new(store.clone());
    assert!(recommender.rebuild_snapshots().await);

    let popular = store.popular_items().await.unwrap();
    assert_eq!(
        popular,
        vec![
            PopularItem {
                item_id: 1,
                avg_rating: Some(4.0),
            },
            PopularItem {
                item_id: 2,
                avg_rating: Some(2.0),
            },
        ]
    );

    // Item 4 is rated by the elite member but unsold, so it is not
    // popular and its rating stays out of the snapshot.
    let elite = store.elite_ratings().await.unwrap();
    assert_eq!(
        elite,
        vec![EliteRating {
            cid: 300,
            item_id: 1,
            rating: 5,
        }]
    );
}

#[tokio::test]
async fn test_rebuild_is_idempotent() {
    let tmp = TempDir::new().unwrap();
    let cfg = test_config(&tmp);
    let pool = setup_pool(&cfg).await;
    seed_base_facts(&pool).await;

    let store = Arc::new(SqliteStore::new(pool.clone()));
    let recommender = Recommender::new(store.clone());

    assert!(recommender.rebuild_snapshots().await);
    let popular_first = store.popular_items().await.unwrap();
    let elite_first = store.elite_ratings().await.unwrap();

    assert!(recommender.rebuild_snapshots().await);
    assert_eq!(store.popular_items().await.unwrap(), popular_first);
    assert_eq!(store.elite_ratings().await.unwrap(), elite_first);
}

#[tokio::test]
async fn test_rebuild_replaces_stale_contents() {
    let tmp = TempDir::new().unwrap();
    let cfg = test_config(&tmp);
    let pool = setup_pool(&cfg).await;
    seed_base_facts(&pool).await;

    let store = Arc::new(SqliteStore::new(pool.clone()));
    let recommender = Recommender::new(store.clone());
    assert!(recommender.rebuild_snapshots().await);

    // Item 3 overtakes everything in its category.
    exec(&pool, "INSERT INTO purchases VALUES (101, 3, 20, 1700000000)").await;
    assert!(recommender.rebuild_snapshots().await);

    let ids: Vec<i64> = store
        .popular_items()
        .await
        .unwrap()
        .iter()
        .map(|p| p.item_id)
        .collect();
    // New tiers are 21 (item 3) and 5 (item 1); item 2 dropped out.
    assert_eq!(ids, vec![1, 3]);
}

#[tokio::test]
async fn test_rebuild_failure_leaves_snapshots_untouched() {
    let tmp = TempDir::new().unwrap();
    let cfg = test_config(&tmp);
    let pool = setup_pool(&cfg).await;
    seed_base_facts(&pool).await;

    let store = Arc::new(SqliteStore::new(pool.clone()));
    let recommender = Recommender::new(store.clone());
    assert!(recommender.rebuild_snapshots().await);
    let popular_before = store.popular_items().await.unwrap();

    // Make the replace fail partway: the elite_ratings table is gone, so
    // the transaction must roll back the popular_items delete too.
    exec(&pool, "DROP TABLE elite_ratings").await;
    exec(&pool, "INSERT INTO purchases VALUES (101, 3, 20, 1700000000)").await;

    assert!(!recommender.rebuild_snapshots().await);
    assert_eq!(store.popular_items().await.unwrap(), popular_before);
}

// ─── Generic ranking (SQLite) ───────────────────────────────────────

#[tokio::test]
async fn test_recommend_generic_tie_at_top() {
    let tmp = TempDir::new().unwrap();
    let cfg = test_config(&tmp);
    let pool = setup_pool(&cfg).await;
    exec(
        &pool,
        "INSERT INTO popular_items VALUES (2, 3.5), (4, 3.5), (3, 2.5)",
    )
    .await;

    let recommender = Recommender::new(Arc::new(SqliteStore::new(pool.clone())));
    assert_eq!(recommender.recommend_generic(2).await, Some(vec![2, 4]));
}

#[tokio::test]
async fn test_recommend_generic_empty_snapshot() {
    let tmp = TempDir::new().unwrap();
    let cfg = test_config(&tmp);
    let pool = setup_pool(&cfg).await;

    let recommender = Recommender::new(Arc::new(SqliteStore::new(pool.clone())));
    assert_eq!(recommender.recommend_generic(3).await, Some(vec![]));
}

#[tokio::test]
async fn test_recommend_generic_absent_rating_ranks_last() {
    let tmp = TempDir::new().unwrap();
    let cfg = test_config(&tmp);
    let pool = setup_pool(&cfg).await;
    exec(
        &pool,
        "INSERT INTO popular_items VALUES (1, NULL), (2, 0.0), (3, 4.5)",
    )
    .await;

    let recommender = Recommender::new(Arc::new(SqliteStore::new(pool.clone())));
    assert_eq!(
        recommender.recommend_generic(3).await,
        Some(vec![3, 2, 1])
    );
}

#[tokio::test]
async fn test_recommend_generic_error_returns_none() {
    let tmp = TempDir::new().unwrap();
    let cfg = test_config(&tmp);
    let pool = setup_pool(&cfg).await;
    exec(&pool, "DROP TABLE popular_items").await;

    let recommender = Recommender::new(Arc::new(SqliteStore::new(pool.clone())));
    // A store failure is an explicit "no result", not an empty list and
    // not a panic.
    assert_eq!(recommender.recommend_generic(3).await, None);
}

// ─── Personalized ranking (SQLite) ──────────────────────────────────

#[tokio::test]
async fn test_recommend_falls_back_without_elite_members() {
    let tmp = TempDir::new().unwrap();
    let cfg = test_config(&tmp);
    let pool = setup_pool(&cfg).await;
    exec(
        &pool,
        "INSERT INTO popular_items VALUES (2, 3.5), (4, 3.5), (3, 2.5)",
    )
    .await;

    let recommender = Recommender::new(Arc::new(SqliteStore::new(pool.clone())));
    assert_eq!(recommender.recommend(1599, 2).await, Some(vec![2, 4]));
}

#[tokio::test]
async fn test_recommend_error_returns_none() {
    let tmp = TempDir::new().unwrap();
    let cfg = test_config(&tmp);
    let pool = setup_pool(&cfg).await;
    exec(&pool, "DROP TABLE ratings").await;

    let recommender = Recommender::new(Arc::new(SqliteStore::new(pool.clone())));
    assert_eq!(recommender.recommend(1599, 2).await, None);
}

// ─── Personalized ranking (in-memory store) ─────────────────────────

/// Popular items 1 and 2 (category 10). Customer 50 bought and rated
/// both. Elite 200 matches customer 50 exactly on the popular items and
/// also rated the unpopular items 3 and 4; elite 201 is a poor match.
fn seeded_memory_store() -> InMemoryStore {
    let store = InMemoryStore::new();

    store.insert_item(1, 10);
    store.insert_item(2, 10);
    store.insert_item(3, 10);
    store.insert_item(4, 20);

    store.insert_purchase(50, 1, 5, TS);
    store.insert_purchase(50, 2, 4, TS);
    store.insert_purchase(60, 1, 1, TS);
    store.insert_purchase(60, 3, 1, TS);

    store.insert_rating(50, 1, 5);
    store.insert_rating(50, 2, 2);
    store.insert_rating(60, 1, 1);
    store.insert_rating(200, 1, 5);
    store.insert_rating(200, 2, 2);
    store.insert_rating(200, 3, 5);
    store.insert_rating(200, 4, 4);
    store.insert_rating(201, 1, 1);

    store.insert_elite_member(200);
    store.insert_elite_member(201);

    store
}

#[tokio::test]
async fn test_personalized_recommends_analog_items() {
    let store = Arc::new(seeded_memory_store());
    let recommender = Recommender::new(store.clone());
    assert!(recommender.rebuild_snapshots().await);

    // Popular tiers in category 10 are items 1 (5 + 1 = 6 units) and 2
    // (4 units); item 3 trails. Item 4 is unsold.
    let ids: Vec<i64> = store
        .popular_items()
        .await
        .unwrap()
        .iter()
        .map(|p| p.item_id)
        .collect();
    assert_eq!(ids, vec![1, 2]);

    // Customer 50's analog is elite 200 (mean difference 0 vs 4 for
    // 201). The candidates are everything 200 rated that 50 never
    // bought — items 3 and 4, even though neither is popular.
    assert_eq!(recommender.recommend(50, 5).await, Some(vec![3, 4]));
    assert_eq!(recommender.recommend(50, 1).await, Some(vec![3]));
}

#[tokio::test]
async fn test_personalized_falls_back_when_analog_offers_nothing_new() {
    let store = Arc::new(seeded_memory_store());
    let recommender = Recommender::new(store.clone());
    assert!(recommender.rebuild_snapshots().await);

    // Customer 60's analog is elite 201 (difference 0 on item 1), but
    // 201 only ever rated item 1 and 60 already bought it — so the
    // generic ranking applies. Item 1 averages (5+1+5+1)/4 = 3.0, item 2
    // averages (2+2)/2 = 2.0.
    assert_eq!(recommender.recommend(60, 2).await, Some(vec![1, 2]));
}

#[tokio::test]
async fn test_personalized_excludes_purchased_items() {
    let store = Arc::new(seeded_memory_store());
    let recommender = Recommender::new(store.clone());
    assert!(recommender.rebuild_snapshots().await);

    // Give customer 50 a purchase of item 3; only item 4 remains.
    store.insert_purchase(50, 3, 1, TS);
    assert!(recommender.rebuild_snapshots().await);
    assert_eq!(recommender.recommend(50, 5).await, Some(vec![4]));
}

#[tokio::test]
async fn test_memory_rebuild_matches_expected_elite_snapshot() {
    let store = Arc::new(seeded_memory_store());
    let recommender = Recommender::new(store.clone());
    assert!(recommender.rebuild_snapshots().await);

    // Exactly the elite ratings of popular items — nothing more.
    assert_eq!(
        store.elite_ratings().await.unwrap(),
        vec![
            EliteRating {
                cid: 200,
                item_id: 1,
                rating: 5,
            },
            EliteRating {
                cid: 200,
                item_id: 2,
                rating: 2,
            },
            EliteRating {
                cid: 201,
                item_id: 1,
                rating: 1,
            },
        ]
    );
}
