//! Core data models used throughout the recommender.
//!
//! These types mirror the rows of the base relations (items, purchases,
//! ratings) and the two derived snapshot relations that the rebuild
//! operation owns.

/// An item in the catalog. Every item belongs to exactly one category.
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub item_id: i64,
    pub category_id: i64,
}

/// A purchase fact: a customer bought some units of an item.
///
/// Many rows may exist per (customer, item); quantities are summed when
/// computing an item's total units sold.
#[derive(Debug, Clone, PartialEq)]
pub struct Purchase {
    pub cid: i64,
    pub item_id: i64,
    pub quantity: i64,
    pub purchased_at: i64,
}

/// A rating fact: at most one per (customer, item), score in 1..=5.
#[derive(Debug, Clone, PartialEq)]
pub struct Rating {
    pub cid: i64,
    pub item_id: i64,
    pub score: i64,
}

/// A row of the `popular_items` snapshot.
///
/// `avg_rating` is the mean of all ratings for the item, or `None` when
/// the item was never rated. Absence is ordered below every numeric
/// value, including 0.
#[derive(Debug, Clone, PartialEq)]
pub struct PopularItem {
    pub item_id: i64,
    pub avg_rating: Option<f64>,
}

/// A row of the `elite_ratings` snapshot: an elite member's rating of a
/// popular item.
#[derive(Debug, Clone, PartialEq)]
pub struct EliteRating {
    pub cid: i64,
    pub item_id: i64,
    pub rating: i64,
}
