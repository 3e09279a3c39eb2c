//! Read-only traversal helpers over [`ArchiveConnector::search`].

use vault_graph::{DeliverableUnit, Entity, EntityKind};
use vault_types::EntityId;

use crate::error::ConnectorResult;
use crate::query::SearchQuery;
use crate::traits::ArchiveConnector;

/// Ancestry lookups against the remote archive.
pub struct AncestryQuery<'a> {
    connector: &'a dyn ArchiveConnector,
}

impl<'a> AncestryQuery<'a> {
    pub fn new(connector: &'a dyn ArchiveConnector) -> Self {
        Self { connector }
    }

    /// Entities reachable from `id`, excluding `id` itself.
    ///
    /// Recursive traversal follows DU parent links, manifestation to DU
    /// links, and manifestation to file links.
    pub async fn ancestors_of(&self, id: &EntityId, recursive: bool) -> ConnectorResult<Vec<Entity>> {
        let results = self
            .connector
            .search(&SearchQuery::Ancestors {
                of: id.clone(),
                recursive,
            })
            .await?;
        Ok(results.into_iter().collect())
    }

    /// The entity itself, if archived.
    pub async fn identity(&self, id: &EntityId) -> ConnectorResult<Option<Entity>> {
        let results = self
            .connector
            .search(&SearchQuery::Identity(id.clone()))
            .await?;
        Ok(results.into_iter().next())
    }
}

/// One-hop reverse lookups against the remote archive.
pub struct ParentQuery<'a> {
    connector: &'a dyn ArchiveConnector,
}

impl<'a> ParentQuery<'a> {
    pub fn new(connector: &'a dyn ArchiveConnector) -> Self {
        Self { connector }
    }

    /// Entities of `kind` that reference `id` directly.
    pub async fn parents_of(&self, id: &EntityId, kind: EntityKind) -> ConnectorResult<Vec<Entity>> {
        let results = self
            .connector
            .search(&SearchQuery::ParentsOf {
                of: id.clone(),
                kind: Some(kind),
            })
            .await?;
        Ok(results.into_iter().collect())
    }

    /// DUs that reference `id` directly.
    pub async fn units_referencing(&self, id: &EntityId) -> ConnectorResult<Vec<DeliverableUnit>> {
        let entities = self.parents_of(id, EntityKind::DeliverableUnit).await?;
        Ok(entities
            .into_iter()
            .filter_map(|e| match e {
                Entity::DeliverableUnit(du) => Some(du),
                _ => None,
            })
            .collect())
    }

    /// DUs carrying `reference` in their former-external-ref set.
    pub async fn units_with_former_ref(&self, reference: &str) -> ConnectorResult<Vec<DeliverableUnit>> {
        let results = self
            .connector
            .search(&SearchQuery::FormerRef(reference.to_string()))
            .await?;
        Ok(results
            .into_iter()
            .filter_map(|e| match e {
                Entity::DeliverableUnit(du) => Some(du),
                _ => None,
            })
            .collect())
    }
}
