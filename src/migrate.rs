use anyhow::Result;

use crate::config::Config;
use crate::db;

pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;

    // Base relations. These are loaded externally (see `shoprec load`) and
    // only ever read by the recommender core.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS categories (
            category_id INTEGER PRIMARY KEY,
            name TEXT NOT NULL
        )
        "#,
    )
    .execute(&pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS items (
            item_id INTEGER PRIMARY KEY,
            category_id INTEGER NOT NULL,
            FOREIGN KEY (category_id) REFERENCES categories(category_id)
        )
        "#,
    )
    .execute(&pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS customers (
            cid INTEGER PRIMARY KEY,
            name TEXT NOT NULL
        )
        "#,
    )
    .execute(&pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS purchases (
            cid INTEGER NOT NULL,
            item_id INTEGER NOT NULL,
            quantity INTEGER NOT NULL CHECK (quantity > 0),
            purchased_at INTEGER NOT NULL,
            FOREIGN KEY (cid) REFERENCES customers(cid),
            FOREIGN KEY (item_id) REFERENCES items(item_id)
        )
        "#,
    )
    .execute(&pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS ratings (
            cid INTEGER NOT NULL,
            item_id INTEGER NOT NULL,
            score INTEGER NOT NULL CHECK (score BETWEEN 1 AND 5),
            PRIMARY KEY (cid, item_id),
            FOREIGN KEY (cid) REFERENCES customers(cid),
            FOREIGN KEY (item_id) REFERENCES items(item_id)
        )
        "#,
    )
    .execute(&pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS elite_members (
            cid INTEGER PRIMARY KEY,
            FOREIGN KEY (cid) REFERENCES customers(cid)
        )
        "#,
    )
    .execute(&pool)
    .await?;

    // Snapshot relations. Owned by the rebuild operation, which replaces
    // their full contents in one transaction.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS popular_items (
            item_id INTEGER PRIMARY KEY,
            avg_rating REAL
        )
        "#,
    )
    .execute(&pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS elite_ratings (
            cid INTEGER NOT NULL,
            item_id INTEGER NOT NULL,
            rating INTEGER NOT NULL,
            PRIMARY KEY (cid, item_id)
        )
        "#,
    )
    .execute(&pool)
    .await?;

    // Indexes for the fetch-heavy rebuild and ranking paths
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_items_category ON items(category_id)")
        .execute(&pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_purchases_item ON purchases(item_id)")
        .execute(&pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_purchases_cid ON purchases(cid)")
        .execute(&pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_ratings_item ON ratings(item_id)")
        .execute(&pool)
        .await?;

    pool.close().await;
    Ok(())
}
