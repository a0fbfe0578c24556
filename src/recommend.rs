//! Recommendation queries over the snapshot relations.
//!
//! Two query paths share one ranking rule: order candidates by rating
//! descending (absent ratings below every numeric value), then truncate to
//! k by pruning only the rank group that straddles the cutoff, lowest item
//! ids first. The personalized path first matches the customer to the
//! elite reviewer whose ratings most closely track their own.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use anyhow::{bail, Result};

use crate::config::Config;
use crate::db;
use crate::models::{EliteRating, PopularItem};
use crate::snapshot::{derive_elite_ratings, derive_popular_items};
use crate::store::sqlite::SqliteStore;
use crate::store::Store;

/// A candidate item with its ranking score.
///
/// `rating` is `None` for popular items that were never rated; absence
/// ranks below every numeric value.
#[derive(Debug, Clone)]
struct RankedItem {
    item_id: i64,
    rating: Option<f64>,
}

/// The public recommender surface.
///
/// Holds a shared store handle; all state lives in the store itself. The
/// three operations convert any store-level error into their failure
/// signal (`false` for the rebuild, `None` for the two queries) instead of
/// raising.
pub struct Recommender {
    store: Arc<dyn Store>,
}

impl Recommender {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Recompute both snapshot relations from the current base facts.
    ///
    /// The replace is all-or-nothing: on failure the previous snapshot
    /// contents remain untouched and `false` is returned.
    pub async fn rebuild_snapshots(&self) -> bool {
        match self.try_rebuild().await {
            Ok(()) => true,
            Err(err) => {
                eprintln!("snapshot rebuild failed: {:#}", err);
                false
            }
        }
    }

    /// Top-k popular items by average rating.
    ///
    /// Returns `None` on a store error; otherwise a list of at most k item
    /// ids (possibly empty). Assumes the snapshots are current — this
    /// never triggers a rebuild.
    pub async fn recommend_generic(&self, k: usize) -> Option<Vec<i64>> {
        match self.try_recommend_generic(k).await {
            Ok(ids) => Some(ids),
            Err(err) => {
                eprintln!("generic recommendation failed: {:#}", err);
                None
            }
        }
    }

    /// Top-k items for a customer, drawn from their closest elite
    /// reviewer's ratings.
    ///
    /// Falls back to the generic ranking when no analog reviewer exists or
    /// the analog rated nothing the customer hasn't already bought.
    /// Returns `None` on a store error.
    pub async fn recommend(&self, cust: i64, k: usize) -> Option<Vec<i64>> {
        match self.try_recommend(cust, k).await {
            Ok(ids) => Some(ids),
            Err(err) => {
                eprintln!("recommendation for customer {} failed: {:#}", cust, err);
                None
            }
        }
    }

    async fn try_rebuild(&self) -> Result<()> {
        let items = self.store.items().await?;
        let purchases = self.store.purchases().await?;
        let ratings = self.store.ratings().await?;
        let elite_members = self.store.elite_members().await?;

        let popular = derive_popular_items(&items, &purchases, &ratings);
        let elite = derive_elite_ratings(&popular, &elite_members, &ratings);

        self.store.replace_snapshots(&popular, &elite).await
    }

    async fn try_recommend_generic(&self, k: usize) -> Result<Vec<i64>> {
        let popular = self.store.popular_items().await?;
        Ok(rank_popular(popular, k))
    }

    async fn try_recommend(&self, cust: i64, k: usize) -> Result<Vec<i64>> {
        let popular = self.store.popular_items().await?;
        let elite_ratings = self.store.elite_ratings().await?;
        let ratings = self.store.ratings().await?;

        let popular_ids: HashSet<i64> = popular.iter().map(|p| p.item_id).collect();
        let cust_on_popular: HashMap<i64, i64> = ratings
            .iter()
            .filter(|r| r.cid == cust && popular_ids.contains(&r.item_id))
            .map(|r| (r.item_id, r.score))
            .collect();

        let analog = match closest_elite(&cust_on_popular, &elite_ratings) {
            Some(cid) => cid,
            None => return Ok(rank_popular(popular, k)),
        };

        let bought: HashSet<i64> = self
            .store
            .purchases()
            .await?
            .iter()
            .filter(|p| p.cid == cust)
            .map(|p| p.item_id)
            .collect();

        // Everything the analog ever rated (not just popular items) that
        // the customer has never bought.
        let candidates: Vec<RankedItem> = ratings
            .iter()
            .filter(|r| r.cid == analog && !bought.contains(&r.item_id))
            .map(|r| RankedItem {
                item_id: r.item_id,
                rating: Some(r.score as f64),
            })
            .collect();

        if candidates.is_empty() {
            return Ok(rank_popular(popular, k));
        }

        Ok(top_k_by_rating(candidates, k))
    }
}

/// Find the elite member whose ratings most closely track the customer's.
///
/// The distance to a member is the mean absolute difference over popular
/// items rated by both; members sharing no rated popular item have no
/// defined distance and are excluded. Smallest distance wins, ties broken
/// by smaller cid. `None` when no member has a defined distance.
fn closest_elite(
    cust_ratings: &HashMap<i64, i64>,
    elite_ratings: &[EliteRating],
) -> Option<i64> {
    let mut diffs: BTreeMap<i64, (i64, u32)> = BTreeMap::new();
    for er in elite_ratings {
        if let Some(&own) = cust_ratings.get(&er.item_id) {
            let entry = diffs.entry(er.cid).or_insert((0, 0));
            entry.0 += (own - er.rating).abs();
            entry.1 += 1;
        }
    }

    diffs
        .into_iter()
        .map(|(cid, (sum, count))| (cid, sum as f64 / count as f64))
        .min_by(|a, b| {
            a.1.partial_cmp(&b.1)
                .unwrap_or(Ordering::Equal)
                .then(a.0.cmp(&b.0))
        })
        .map(|(cid, _)| cid)
}

fn rank_popular(popular: Vec<PopularItem>, k: usize) -> Vec<i64> {
    let candidates = popular
        .into_iter()
        .map(|p| RankedItem {
            item_id: p.item_id,
            rating: p.avg_rating,
        })
        .collect();
    top_k_by_rating(candidates, k)
}

/// Select the top-k candidates by rating.
///
/// Candidates are ranked by rating alone; item-id order is used only to
/// prune the rank group straddling the k cutoff (whole groups are taken
/// until the next would overflow, then the boundary group keeps its
/// lowest ids up to the remaining quota).
fn top_k_by_rating(mut candidates: Vec<RankedItem>, k: usize) -> Vec<i64> {
    candidates.sort_by(|a, b| {
        cmp_rating(&b.rating, &a.rating).then_with(|| a.item_id.cmp(&b.item_id))
    });

    let mut out = Vec::with_capacity(k.min(candidates.len()));
    let mut start = 0;
    while start < candidates.len() && out.len() < k {
        let mut end = start + 1;
        while end < candidates.len() && candidates[end].rating == candidates[start].rating {
            end += 1;
        }
        // Tied ids are already ascending, so the boundary group keeps its
        // lowest ids.
        let quota = k - out.len();
        out.extend(candidates[start..end].iter().take(quota).map(|c| c.item_id));
        start = end;
    }
    out
}

/// Three-valued rating comparison: absent is below every numeric value,
/// including 0. Absence is never coerced to a number.
fn cmp_rating(a: &Option<f64>, b: &Option<f64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x.partial_cmp(y).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => Ordering::Equal,
    }
}

// ============ CLI entry points ============

pub async fn run_rebuild(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    let store = Arc::new(SqliteStore::new(pool.clone()));
    let recommender = Recommender::new(store.clone());

    if !recommender.rebuild_snapshots().await {
        pool.close().await;
        bail!("snapshot rebuild failed");
    }

    let popular = store.popular_items().await?;
    let elite = store.elite_ratings().await?;
    println!("Snapshots rebuilt.");
    println!("  popular items: {}", popular.len());
    println!("  elite ratings: {}", elite.len());

    pool.close().await;
    Ok(())
}

pub async fn run_top(config: &Config, k: Option<usize>, json: bool) -> Result<()> {
    let k = k.unwrap_or(config.recommend.default_k as usize);
    if k < 1 {
        bail!("k must be >= 1");
    }

    let pool = db::connect(config).await?;
    let recommender = Recommender::new(Arc::new(SqliteStore::new(pool.clone())));
    let result = recommender.recommend_generic(k).await;
    pool.close().await;

    let items = match result {
        Some(items) => items,
        None => bail!("recommendation query failed"),
    };

    print_items(&items, json);
    Ok(())
}

pub async fn run_suggest(config: &Config, cust: i64, k: Option<usize>, json: bool) -> Result<()> {
    let k = k.unwrap_or(config.recommend.default_k as usize);
    if k < 1 {
        bail!("k must be >= 1");
    }

    let pool = db::connect(config).await?;
    let recommender = Recommender::new(Arc::new(SqliteStore::new(pool.clone())));
    let result = recommender.recommend(cust, k).await;
    pool.close().await;

    let items = match result {
        Some(items) => items,
        None => bail!("recommendation query failed"),
    };

    print_items(&items, json);
    Ok(())
}

fn print_items(items: &[i64], json: bool) {
    if json {
        println!("{}", serde_json::json!({ "items": items }));
        return;
    }

    if items.is_empty() {
        println!("No recommendations.");
        return;
    }

    for (i, item_id) in items.iter().enumerate() {
        println!("{}. item {}", i + 1, item_id);
    }
}
