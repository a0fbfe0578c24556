//! Snapshot derivation: popular items per category and elite ratings on
//! popular items.
//!
//! Both relations are recomputed in full from the base facts on every
//! rebuild; there is no incremental maintenance. The derivation itself is
//! pure so the tie and threshold handling can be tested without a store.

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::models::{EliteRating, Item, PopularItem, Purchase, Rating};

/// Derive the `popular_items` snapshot from the base relations.
///
/// An item qualifies when its total units sold is at least 1 and equals
/// the highest or second-highest distinct total within its category
/// (dense ranking — ties are included at both ranks, so a category may
/// contribute more than two items). `avg_rating` is the mean of all
/// ratings for the item, or `None` when it was never rated.
pub fn derive_popular_items(
    items: &[Item],
    purchases: &[Purchase],
    ratings: &[Rating],
) -> Vec<PopularItem> {
    let mut units_sold: HashMap<i64, i64> = HashMap::new();
    for p in purchases {
        *units_sold.entry(p.item_id).or_insert(0) += p.quantity;
    }

    // Group sellable items by category. Items with no sales (or totals
    // below 1) never qualify, regardless of rating.
    let mut by_category: BTreeMap<i64, Vec<(i64, i64)>> = BTreeMap::new();
    for item in items {
        if let Some(&total) = units_sold.get(&item.item_id) {
            if total >= 1 {
                by_category
                    .entry(item.category_id)
                    .or_default()
                    .push((item.item_id, total));
            }
        }
    }

    let mut rating_sums: HashMap<i64, (i64, i64)> = HashMap::new();
    for r in ratings {
        let entry = rating_sums.entry(r.item_id).or_insert((0, 0));
        entry.0 += r.score;
        entry.1 += 1;
    }

    let mut popular = Vec::new();
    for entries in by_category.values() {
        // Second-highest distinct total is the inclusion cutoff; with a
        // single distinct total the cutoff is that total.
        let mut totals: Vec<i64> = entries.iter().map(|&(_, total)| total).collect();
        totals.sort_unstable_by(|a, b| b.cmp(a));
        totals.dedup();
        let cutoff = totals.get(1).copied().unwrap_or(totals[0]);

        for &(item_id, total) in entries {
            if total >= cutoff {
                let avg_rating = rating_sums
                    .get(&item_id)
                    .map(|&(sum, count)| sum as f64 / count as f64);
                popular.push(PopularItem {
                    item_id,
                    avg_rating,
                });
            }
        }
    }

    popular.sort_by_key(|p| p.item_id);
    popular
}

/// Derive the `elite_ratings` snapshot: one row per (elite member, popular
/// item) pair that the member actually rated.
///
/// Empty whenever there are no elite members, no popular items, or no
/// elite member rated any popular item.
pub fn derive_elite_ratings(
    popular: &[PopularItem],
    elite_members: &[i64],
    ratings: &[Rating],
) -> Vec<EliteRating> {
    let popular_ids: HashSet<i64> = popular.iter().map(|p| p.item_id).collect();
    let elite_ids: HashSet<i64> = elite_members.iter().copied().collect();

    let mut result: Vec<EliteRating> = ratings
        .iter()
        .filter(|r| elite_ids.contains(&r.cid) && popular_ids.contains(&r.item_id))
        .map(|r| EliteRating {
            cid: r.cid,
            item_id: r.item_id,
            rating: r.score,
        })
        .collect();

    result.sort_by_key(|er| (er.cid, er.item_id));
    result
}
