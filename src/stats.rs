//! Database statistics and health overview.
//!
//! Provides a quick summary of what's stored: base-relation row counts,
//! snapshot sizes, and purchase recency. Used by `shoprec stats` to give
//! confidence that loads and rebuilds are working as expected.

use anyhow::Result;

use crate::config::Config;
use crate::db;

/// Run the stats command: query the database and print a summary.
pub async fn run_stats(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;

    let items: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM items")
        .fetch_one(&pool)
        .await?;
    let customers: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM customers")
        .fetch_one(&pool)
        .await?;
    let purchases: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM purchases")
        .fetch_one(&pool)
        .await?;
    let ratings: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM ratings")
        .fetch_one(&pool)
        .await?;
    let elite_members: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM elite_members")
        .fetch_one(&pool)
        .await?;
    let popular_items: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM popular_items")
        .fetch_one(&pool)
        .await?;
    let elite_ratings: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM elite_ratings")
        .fetch_one(&pool)
        .await?;

    let latest_purchase: Option<i64> = sqlx::query_scalar("SELECT MAX(purchased_at) FROM purchases")
        .fetch_one(&pool)
        .await?;

    let db_size = std::fs::metadata(&config.db.path)
        .map(|m| m.len())
        .unwrap_or(0);

    println!("Shop Recommender — Database Stats");
    println!("=================================");
    println!();
    println!("  Database:        {}", config.db.path.display());
    println!("  Size:            {}", format_bytes(db_size));
    println!();
    println!("  Items:           {}", items);
    println!("  Customers:       {}", customers);
    println!("  Purchases:       {}", purchases);
    println!("  Ratings:         {}", ratings);
    println!("  Elite members:   {}", elite_members);
    println!();
    println!("  Popular items:   {}", popular_items);
    println!("  Elite ratings:   {}", elite_ratings);
    println!(
        "  Latest purchase: {}",
        match latest_purchase {
            Some(ts) => format_ts_date(ts),
            None => "never".to_string(),
        }
    );
    println!();

    pool.close().await;
    Ok(())
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

fn format_ts_date(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| ts.to_string())
}
