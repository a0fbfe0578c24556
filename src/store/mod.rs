//! Storage abstraction for the recommender.
//!
//! The [`Store`] trait defines all storage operations needed by the
//! snapshot rebuild and the two recommendation queries, enabling pluggable
//! backends (SQLite, in-memory).
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;
pub mod sqlite;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{EliteRating, Item, PopularItem, Purchase, Rating};

/// Abstract storage backend for the recommender.
///
/// The core consumes the store through whole-relation reads plus a single
/// atomic replace of the two snapshot relations. Base relations are never
/// written through this trait.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`items`](Store::items) | All catalog items |
/// | [`purchases`](Store::purchases) | All purchase facts |
/// | [`ratings`](Store::ratings) | All rating facts |
/// | [`elite_members`](Store::elite_members) | All elite member cids |
/// | [`popular_items`](Store::popular_items) | Current popularity snapshot |
/// | [`elite_ratings`](Store::elite_ratings) | Current elite-rating snapshot |
/// | [`replace_snapshots`](Store::replace_snapshots) | Atomically replace both snapshots |
#[async_trait]
pub trait Store: Send + Sync {
    /// Fetch all rows of the `items` relation.
    async fn items(&self) -> Result<Vec<Item>>;

    /// Fetch all rows of the `purchases` relation.
    async fn purchases(&self) -> Result<Vec<Purchase>>;

    /// Fetch all rows of the `ratings` relation.
    async fn ratings(&self) -> Result<Vec<Rating>>;

    /// Fetch the cids of all elite members.
    async fn elite_members(&self) -> Result<Vec<i64>>;

    /// Fetch all rows of the `popular_items` snapshot.
    async fn popular_items(&self) -> Result<Vec<PopularItem>>;

    /// Fetch all rows of the `elite_ratings` snapshot.
    async fn elite_ratings(&self) -> Result<Vec<EliteRating>>;

    /// Replace the full contents of both snapshot relations.
    ///
    /// All-or-nothing: either both relations reach their new state, or an
    /// error is returned and neither is modified.
    async fn replace_snapshots(
        &self,
        popular: &[PopularItem],
        elite: &[EliteRating],
    ) -> Result<()>;
}
