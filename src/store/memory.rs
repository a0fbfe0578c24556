//! In-memory [`Store`] implementation for testing.
//!
//! Uses `Vec`s behind `std::sync::RwLock` for thread safety. The snapshot
//! replace holds both write guards so readers never observe one relation
//! updated without the other.

use std::sync::RwLock;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{EliteRating, Item, PopularItem, Purchase, Rating};
use crate::store::Store;

/// In-memory store for tests.
#[derive(Default)]
pub struct InMemoryStore {
    items: RwLock<Vec<Item>>,
    purchases: RwLock<Vec<Purchase>>,
    ratings: RwLock<Vec<Rating>>,
    elite_members: RwLock<Vec<i64>>,
    popular_items: RwLock<Vec<PopularItem>>,
    elite_ratings: RwLock<Vec<EliteRating>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_item(&self, item_id: i64, category_id: i64) {
        self.items.write().unwrap().push(Item {
            item_id,
            category_id,
        });
    }

    pub fn insert_purchase(&self, cid: i64, item_id: i64, quantity: i64, purchased_at: i64) {
        self.purchases.write().unwrap().push(Purchase {
            cid,
            item_id,
            quantity,
            purchased_at,
        });
    }

    pub fn insert_rating(&self, cid: i64, item_id: i64, score: i64) {
        self.ratings
            .write()
            .unwrap()
            .push(Rating { cid, item_id, score });
    }

    pub fn insert_elite_member(&self, cid: i64) {
        self.elite_members.write().unwrap().push(cid);
    }

    /// Seed the popularity snapshot directly, bypassing the rebuild.
    pub fn insert_popular_item(&self, item_id: i64, avg_rating: Option<f64>) {
        self.popular_items.write().unwrap().push(PopularItem {
            item_id,
            avg_rating,
        });
    }

    /// Seed the elite-rating snapshot directly, bypassing the rebuild.
    pub fn insert_elite_rating(&self, cid: i64, item_id: i64, rating: i64) {
        self.elite_ratings.write().unwrap().push(EliteRating {
            cid,
            item_id,
            rating,
        });
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn items(&self) -> Result<Vec<Item>> {
        Ok(self.items.read().unwrap().clone())
    }

    async fn purchases(&self) -> Result<Vec<Purchase>> {
        Ok(self.purchases.read().unwrap().clone())
    }

    async fn ratings(&self) -> Result<Vec<Rating>> {
        Ok(self.ratings.read().unwrap().clone())
    }

    async fn elite_members(&self) -> Result<Vec<i64>> {
        Ok(self.elite_members.read().unwrap().clone())
    }

    async fn popular_items(&self) -> Result<Vec<PopularItem>> {
        Ok(self.popular_items.read().unwrap().clone())
    }

    async fn elite_ratings(&self) -> Result<Vec<EliteRating>> {
        Ok(self.elite_ratings.read().unwrap().clone())
    }

    async fn replace_snapshots(
        &self,
        popular: &[PopularItem],
        elite: &[EliteRating],
    ) -> Result<()> {
        let mut popular_guard = self.popular_items.write().unwrap();
        let mut elite_guard = self.elite_ratings.write().unwrap();
        *popular_guard = popular.to_vec();
        *elite_guard = elite.to_vec();
        Ok(())
    }
}
