use std::collections::BTreeSet;

use anyhow::{bail, Result};

use crate::data::Item;
use crate::optimizer::{apply_candidate, Candidate};
use crate::price::{parse_candidate_price, parse_price};

/// Flip the `owned` flag on the matching item; every other item is returned
/// as-is. Owned items are excluded from totals and from optimization.
pub fn toggle_owned(items: &[Item], id: &str) -> Vec<Item> {
    items
        .iter()
        .map(|item| {
            if item.id == id {
                let mut updated = item.clone();
                updated.owned = !updated.owned;
                updated
            } else {
                item.clone()
            }
        })
        .collect()
}

/// Sum of parsed prices over non-owned items. Always recomputed from the
/// full list, never patched incrementally.
pub fn compute_total(items: &[Item]) -> f64 {
    items
        .iter()
        .filter(|item| !item.owned)
        .map(|item| parse_price(&item.price))
        .sum()
}

/// Replace one item's display fields with the chosen alternative's fields
/// (same projection the optimizer uses). Unknown ids and out-of-range
/// alternative indexes are caller errors.
pub fn apply_alternative(items: &[Item], item_id: &str, alt_index: usize) -> Result<Vec<Item>> {
    let Some(item) = items.iter().find(|i| i.id == item_id) else {
        bail!("No item with id {}", item_id);
    };
    let Some(alt) = item.alternatives.get(alt_index) else {
        bail!(
            "Item {} has {} alternatives, index {} is out of range",
            item_id,
            item.alternatives.len(),
            alt_index
        );
    };

    let candidate = Candidate {
        name: alt.name.clone(),
        store: alt.store.clone(),
        price: parse_candidate_price(&alt.price),
        availability: alt.availability.clone(),
        description: alt.description.clone(),
    };
    if !candidate.price.is_finite() {
        bail!(
            "Alternative {} of item {} has no usable price ({:?})",
            alt_index,
            item_id,
            alt.price
        );
    }

    Ok(items
        .iter()
        .map(|i| {
            if i.id == item_id {
                apply_candidate(i, &candidate)
            } else {
                i.clone()
            }
        })
        .collect())
}

/// Distinct non-empty stores across non-owned items.
pub fn distinct_stores(items: &[Item]) -> BTreeSet<String> {
    items
        .iter()
        .filter(|item| !item.owned && !item.store.is_empty())
        .map(|item| item.store.clone())
        .collect()
}
