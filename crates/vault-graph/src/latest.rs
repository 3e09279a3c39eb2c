//! Latest-version selection.
//!
//! Given any set of State DUs from one lineage, the latest version is every
//! DU that no *other* DU in the set names as its predecessor. The filter is
//! a pure set operation: one pass collects superseded ids, one pass keeps
//! the rest. Input order is preserved.

use std::collections::HashSet;

use vault_types::EntityId;

use crate::entity::DeliverableUnit;

/// Ids named as a predecessor by some other DU in `units`.
///
/// A DU naming itself as its own predecessor does not supersede itself.
pub fn superseded_ids<'a, I>(units: I) -> HashSet<EntityId>
where
    I: IntoIterator<Item = &'a DeliverableUnit>,
{
    units
        .into_iter()
        .filter_map(|du| du.predecessor.as_ref().filter(|p| **p != du.id))
        .cloned()
        .collect()
}

/// Keep only the DUs not superseded within `units`.
///
/// Applying the filter to its own output returns the output unchanged.
/// An empty input yields an empty result; more than one survivor means
/// the lineage has diverged and is left for the caller to judge.
pub fn filter_latest(units: Vec<DeliverableUnit>) -> Vec<DeliverableUnit> {
    let superseded = superseded_ids(&units);
    units
        .into_iter()
        .filter(|du| !superseded.contains(&du.id))
        .collect()
}
