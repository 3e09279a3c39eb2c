use std::fmt;

use vault_graph::{Entity, EntityKind, Package};
use vault_types::EntityId;

/// A graph search understood by the connector.
///
/// The rendered form ([`fmt::Display`]) is the opaque query string handed
/// to the remote store; its format belongs to the connector.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SearchQuery {
    /// The entity with this id.
    Identity(EntityId),
    /// Entities reachable from `of` through upward links. `of` itself is
    /// not included.
    Ancestors { of: EntityId, recursive: bool },
    /// Entities (optionally of one kind) with a direct reference to `of`.
    ParentsOf { of: EntityId, kind: Option<EntityKind> },
    /// DUs carrying this former external reference.
    FormerRef(String),
}

impl fmt::Display for SearchQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Identity(id) => write!(f, "id={id}"),
            Self::Ancestors { of, recursive } => {
                write!(f, "ancestors-of={of}&recursive={recursive}")
            }
            Self::ParentsOf { of, kind: Some(kind) } => {
                write!(f, "parents-of={of}&kind={kind}")
            }
            Self::ParentsOf { of, kind: None } => write!(f, "parents-of={of}"),
            Self::FormerRef(reference) => write!(f, "former-ref={reference}"),
        }
    }
}

/// Entities matched by a search, with the total match count.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SearchResults {
    entities: Vec<Entity>,
    total: usize,
}

impl SearchResults {
    pub fn new(entities: Vec<Entity>) -> Self {
        let total = entities.len();
        Self { entities, total }
    }

    /// Number of matches reported by the archive.
    pub fn count(&self) -> usize {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }

    /// Matched entities gathered into a package fragment.
    pub fn into_package(self) -> Package {
        self.entities.into_iter().collect()
    }
}

impl IntoIterator for SearchResults {
    type Item = Entity;
    type IntoIter = std::vec::IntoIter<Entity>;

    fn into_iter(self) -> Self::IntoIter {
        self.entities.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_strings_are_distinct() {
        let id = EntityId::new("du:1");
        let queries = [
            SearchQuery::Identity(id.clone()),
            SearchQuery::Ancestors { of: id.clone(), recursive: true },
            SearchQuery::Ancestors { of: id.clone(), recursive: false },
            SearchQuery::ParentsOf { of: id.clone(), kind: None },
            SearchQuery::ParentsOf { of: id.clone(), kind: Some(EntityKind::Manifestation) },
            SearchQuery::FormerRef("du:1".into()),
        ];
        let rendered: std::collections::HashSet<String> =
            queries.iter().map(ToString::to_string).collect();
        assert_eq!(rendered.len(), queries.len());
    }

    #[test]
    fn empty_results() {
        let results = SearchResults::default();
        assert!(results.is_empty());
        assert_eq!(results.count(), 0);
        assert!(results.into_package().is_empty());
    }
}
