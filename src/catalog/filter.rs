// src/catalog/filter.rs
//! The catalog filter/sort pipeline: a deterministic, pure derivation from
//! (catalog snapshot, filter state) to a display list. The source list is
//! never mutated; every run produces a fresh ordered Vec.
//!
//! Mode selection: a non-empty (normalized) free-text query switches the
//! pipeline into global search mode, drawing candidates from the whole
//! catalog instead of the selected category.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::item::CatalogItem;
use super::text::normalize;

/// Ordering strategy for the derived view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortStrategy {
    LowestPrice,
    HighestPrice,
    BestSelling,
    #[default]
    Relevant,
}

impl SortStrategy {
    /// Parse a strategy name as it arrives on the query string.
    /// Unknown names fall back to the default.
    pub fn from_name(name: &str) -> Self {
        match name.trim() {
            "lowest-price" => Self::LowestPrice,
            "highest-price" => Self::HighestPrice,
            "best-selling" => Self::BestSelling,
            _ => Self::Relevant,
        }
    }
}

/// Client-side narrowing state. Pure value — no persistence; a category
/// change goes through `reset_for_category`, never through field pokes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterState {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub subcategory: Option<String>,
    #[serde(default)]
    pub only_new: bool,
    #[serde(default)]
    pub only_used: bool,
    #[serde(default)]
    pub price_min: Option<f64>,
    #[serde(default)]
    pub price_max: Option<f64>,
    #[serde(default)]
    pub brands: BTreeSet<String>,
    #[serde(default)]
    pub min_rating: Option<f64>,
    #[serde(default)]
    pub sort: SortStrategy,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            query: String::new(),
            category: None,
            subcategory: None,
            only_new: false,
            only_used: false,
            price_min: None,
            price_max: None,
            brands: BTreeSet::new(),
            min_rating: None,
            sort: SortStrategy::default(),
        }
    }
}

impl FilterState {
    /// The named transition behind "changing category clears all filters":
    /// everything resets to defaults except the new category selection.
    pub fn reset_for_category(category: impl Into<String>) -> Self {
        Self {
            category: Some(category.into()),
            ..Self::default()
        }
    }
}

/// True if the normalized query is a substring of any searched field.
fn matches_text(item: &CatalogItem, normalized_query: &str) -> bool {
    if normalized_query.is_empty() {
        return false;
    }
    let fields = [
        Some(item.name.as_str()),
        Some(item.description.as_str()),
        Some(item.category.as_str()),
        item.subcategory.as_deref(),
        item.brand.as_deref(),
    ];
    fields
        .into_iter()
        .flatten()
        .any(|f| normalize(f).contains(normalized_query))
}

fn matches_category(item: &CatalogItem, filter: &FilterState) -> bool {
    let Some(cat) = &filter.category else {
        // No category selected: category mode imposes no restriction.
        return true;
    };
    if normalize(&item.category) != normalize(cat) {
        return false;
    }
    match &filter.subcategory {
        Some(sub) => item
            .subcategory
            .as_deref()
            .is_some_and(|s| normalize(s) == normalize(sub)),
        None => true,
    }
}

fn matches_condition(item: &CatalogItem, filter: &FilterState) -> bool {
    if !filter.only_new && !filter.only_used {
        return true;
    }
    let cond = normalize(&item.condition);
    (filter.only_new && cond == "nuevo") || (filter.only_used && cond == "usado")
}

fn matches_price(item: &CatalogItem, filter: &FilterState) -> bool {
    if let Some(min) = filter.price_min {
        if item.price < min {
            return false;
        }
    }
    if let Some(max) = filter.price_max {
        if item.price > max {
            return false;
        }
    }
    true
}

fn matches_brand(item: &CatalogItem, filter: &FilterState) -> bool {
    if filter.brands.is_empty() {
        return true;
    }
    let Some(brand) = &item.brand else {
        return false;
    };
    let b = normalize(brand);
    filter.brands.iter().any(|sel| normalize(sel) == b)
}

fn matches_rating(item: &CatalogItem, filter: &FilterState) -> bool {
    match filter.min_rating {
        Some(min) => item.rating >= min,
        None => true,
    }
}

/// Run the full pipeline: mode selection → text match → availability gate →
/// condition → price → brand → rating → sort. Pure function of its inputs.
pub fn derive_view(
    catalog: &[CatalogItem],
    filter: &FilterState,
    active_states: &[String],
) -> Vec<CatalogItem> {
    let query = normalize(&filter.query);
    let search_mode = !query.is_empty();

    let mut view: Vec<CatalogItem> = catalog
        .iter()
        .filter(|it| {
            if search_mode {
                // Global search ignores the category restriction.
                matches_text(it, &query)
            } else {
                matches_category(it, filter)
            }
        })
        .filter(|it| it.is_available(active_states))
        .filter(|it| matches_condition(it, filter))
        .filter(|it| matches_price(it, filter))
        .filter(|it| matches_brand(it, filter))
        .filter(|it| matches_rating(it, filter))
        .cloned()
        .collect();

    // Vec::sort_by is stable; ties keep the filtered order.
    match filter.sort {
        SortStrategy::LowestPrice => view.sort_by(|a, b| a.price.total_cmp(&b.price)),
        SortStrategy::HighestPrice => view.sort_by(|a, b| b.price.total_cmp(&a.price)),
        SortStrategy::BestSelling => view.sort_by(|a, b| b.reviews.cmp(&a.reviews)),
        SortStrategy::Relevant => {
            view.sort_by(|a, b| b.relevance_score().total_cmp(&a.relevance_score()))
        }
    }

    view
}
