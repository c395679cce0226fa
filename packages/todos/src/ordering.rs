// ABOUTME: Resolution of a client-proposed todo order against the stored one
// ABOUTME: Drops unknown ids and appends forgotten ones so no todo is ever lost

use std::collections::HashSet;

/// Merge a proposed order with the ids actually in the list.
///
/// `existing` must be in current display order. The result keeps the
/// proposal's relative order for ids that belong to the list (first
/// occurrence wins), silently drops ids that do not, then appends every
/// member the proposal left out in its existing order. The output is always a
/// permutation of `existing`.
pub fn resolve_order(proposed: &[i64], existing: &[i64]) -> Vec<i64> {
    let members: HashSet<i64> = existing.iter().copied().collect();
    let mut placed = HashSet::with_capacity(existing.len());
    let mut order = Vec::with_capacity(existing.len());

    for &id in proposed {
        if members.contains(&id) && placed.insert(id) {
            order.push(id);
        }
    }

    order.extend(existing.iter().copied().filter(|id| !placed.contains(id)));
    order
}
