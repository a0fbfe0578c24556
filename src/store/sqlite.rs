//! SQLite-backed [`Store`] implementation.
//!
//! Maps each [`Store`] operation to SQL against the schema created by
//! [`crate::migrate`]. Snapshot replacement runs as a single transaction.

use anyhow::Result;
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};

use crate::models::{EliteRating, Item, PopularItem, Purchase, Rating};
use crate::store::Store;

/// SQLite implementation of the [`Store`] trait.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl Store for SqliteStore {
    async fn items(&self) -> Result<Vec<Item>> {
        let rows = sqlx::query("SELECT item_id, category_id FROM items")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .iter()
            .map(|row| Item {
                item_id: row.get("item_id"),
                category_id: row.get("category_id"),
            })
            .collect())
    }

    async fn purchases(&self) -> Result<Vec<Purchase>> {
        let rows = sqlx::query("SELECT cid, item_id, quantity, purchased_at FROM purchases")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .iter()
            .map(|row| Purchase {
                cid: row.get("cid"),
                item_id: row.get("item_id"),
                quantity: row.get("quantity"),
                purchased_at: row.get("purchased_at"),
            })
            .collect())
    }

    async fn ratings(&self) -> Result<Vec<Rating>> {
        let rows = sqlx::query("SELECT cid, item_id, score FROM ratings")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .iter()
            .map(|row| Rating {
                cid: row.get("cid"),
                item_id: row.get("item_id"),
                score: row.get("score"),
            })
            .collect())
    }

    async fn elite_members(&self) -> Result<Vec<i64>> {
        let rows = sqlx::query("SELECT cid FROM elite_members")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(|row| row.get("cid")).collect())
    }

    async fn popular_items(&self) -> Result<Vec<PopularItem>> {
        let rows = sqlx::query("SELECT item_id, avg_rating FROM popular_items")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .iter()
            .map(|row| PopularItem {
                item_id: row.get("item_id"),
                avg_rating: row.get("avg_rating"),
            })
            .collect())
    }

    async fn elite_ratings(&self) -> Result<Vec<EliteRating>> {
        let rows = sqlx::query("SELECT cid, item_id, rating FROM elite_ratings")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .iter()
            .map(|row| EliteRating {
                cid: row.get("cid"),
                item_id: row.get("item_id"),
                rating: row.get("rating"),
            })
            .collect())
    }

    async fn replace_snapshots(
        &self,
        popular: &[PopularItem],
        elite: &[EliteRating],
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM elite_ratings")
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM popular_items")
            .execute(&mut *tx)
            .await?;

        for item in popular {
            sqlx::query("INSERT INTO popular_items (item_id, avg_rating) VALUES (?, ?)")
                .bind(item.item_id)
                .bind(item.avg_rating)
                .execute(&mut *tx)
                .await?;
        }

        for er in elite {
            sqlx::query("INSERT INTO elite_ratings (cid, item_id, rating) VALUES (?, ?, ?)")
                .bind(er.cid)
                .bind(er.item_id)
                .bind(er.rating)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}
