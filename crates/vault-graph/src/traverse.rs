//! Ancestry traversal over any entity store.

use std::collections::{HashSet, VecDeque};

use vault_types::EntityId;

use crate::entity::Entity;

/// Entities reachable from `start` by following upward links
/// ([`Entity::links`]) breadth-first.
///
/// With `recursive == false` only the direct links are returned. The start
/// entity itself is **not** included, and links to ids the lookup cannot
/// resolve are skipped. Each entity appears at most once.
pub fn collect_ancestors<'a, F>(start: &EntityId, recursive: bool, lookup: F) -> Vec<&'a Entity>
where
    F: Fn(&EntityId) -> Option<&'a Entity>,
{
    let Some(origin) = lookup(start) else {
        return Vec::new();
    };

    let mut visited = HashSet::new();
    visited.insert(start.clone());
    let mut result = Vec::new();
    let mut queue: VecDeque<(&EntityId, usize)> = VecDeque::new();

    for link in origin.links() {
        if visited.insert(link.clone()) {
            queue.push_back((link, 1));
        }
    }

    while let Some((current, depth)) = queue.pop_front() {
        let Some(entity) = lookup(current) else {
            continue;
        };
        result.push(entity);
        if recursive {
            for link in entity.links() {
                if visited.insert(link.clone()) {
                    queue.push_back((link, depth + 1));
                }
            }
        }
    }

    result
}
