//! Current-state lookup of a business object in the archive.

use tracing::debug;

use vault_connector::{ArchiveConnector, ParentQuery};
use vault_graph::{filter_latest, DeliverableUnit};
use vault_types::{BusinessId, EntityId, ObjectType};

use crate::error::SearchError;

/// The archived lineage head and latest version of one business object.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BusinessObjectState {
    pub business_id: BusinessId,
    pub object_type: ObjectType,
    pub root: DeliverableUnit,
    pub state: DeliverableUnit,
}

/// Finds the current state of business objects by searching the archive.
pub struct StateSearcher<'a> {
    parents: ParentQuery<'a>,
}

impl<'a> StateSearcher<'a> {
    pub fn new(connector: &'a dyn ArchiveConnector) -> Self {
        Self {
            parents: ParentQuery::new(connector),
        }
    }

    /// Root DU plus latest State DU of `business_id`, or `None` if the
    /// object was never archived.
    pub async fn current_state(
        &self,
        business_id: &BusinessId,
        object_type: ObjectType,
    ) -> Result<Option<BusinessObjectState>, SearchError> {
        let mut roots: Vec<DeliverableUnit> = self
            .parents
            .units_with_former_ref(business_id.as_str())
            .await?
            .into_iter()
            .filter(|du| du.is_root() && du.object_type() == object_type)
            .collect();
        if roots.len() > 1 {
            return Err(SearchError::MultipleRoots {
                business_id: business_id.clone(),
                object_type,
                count: roots.len(),
            });
        }
        let Some(root) = roots.pop() else {
            return Ok(None);
        };

        let state = self
            .latest_state(&root.id)
            .await?
            .ok_or_else(|| SearchError::EmptyLineage(root.id.clone()))?;
        debug!(
            business_id = %business_id,
            root = %root.id,
            state = %state.id,
            "current state found"
        );
        Ok(Some(BusinessObjectState {
            business_id: business_id.clone(),
            object_type,
            root,
            state,
        }))
    }

    /// First current state found among `types`, in order.
    pub async fn current_state_any(
        &self,
        business_id: &BusinessId,
        types: &[ObjectType],
    ) -> Result<Option<BusinessObjectState>, SearchError> {
        for ty in types {
            if let Some(found) = self.current_state(business_id, *ty).await? {
                return Ok(Some(found));
            }
        }
        Ok(None)
    }

    /// Latest State DU in the lineage of `root`, if the lineage has one.
    pub async fn latest_state(&self, root: &EntityId) -> Result<Option<DeliverableUnit>, SearchError> {
        let states: Vec<DeliverableUnit> = self
            .parents
            .units_referencing(root)
            .await?
            .into_iter()
            .filter(|du| du.is_state() && du.lineage() == Some(root))
            .collect();
        let mut latest = filter_latest(states);
        if latest.len() > 1 {
            return Err(SearchError::AmbiguousState {
                root: root.clone(),
                candidates: latest.into_iter().map(|du| du.id).collect(),
            });
        }
        Ok(latest.pop())
    }

    /// Latest State DUs of every lineage with a member reference to
    /// `parent_root`, keeping only those whose latest version still names
    /// `parent_root` as its parent object.
    pub async fn current_children(
        &self,
        parent_root: &EntityId,
    ) -> Result<Vec<DeliverableUnit>, SearchError> {
        let referencing = self.parents.units_referencing(parent_root).await?;
        let mut lineages: Vec<EntityId> = referencing
            .iter()
            .filter(|du| du.is_state() && du.member_of().any(|m| m == parent_root))
            .filter_map(|du| du.lineage().cloned())
            .collect();
        lineages.sort();
        lineages.dedup();

        let mut children = Vec::new();
        for lineage in lineages {
            let Some(latest) = self.latest_state(&lineage).await? else {
                continue;
            };
            if latest.member_of().any(|m| m == parent_root) {
                children.push(latest);
            } else {
                debug!(
                    lineage = %lineage,
                    parent = %parent_root,
                    "child moved away; stale membership ignored"
                );
            }
        }
        Ok(children)
    }
}

#[cfg(test)]
mod tests {
    use vault_connector::{ArchiveConnector, InMemoryArchive, TicketResolver};
    use vault_graph::Package;
    use vault_types::{Collection, DataItem};

    use super::*;
    use crate::mapper::{Placement, ShapeMapper, VersionGraphMapper};
    use crate::shapes::{CollectionShape, DataItemShape};

    async fn archive(archive: &InMemoryArchive, package: &Package) {
        let ticket = archive.deposit_package(package).await.unwrap();
        archive.resolve(&ticket).await.unwrap();
    }

    async fn deposit_collection(
        store: &InMemoryArchive,
        title: &str,
        parent_root: Option<EntityId>,
    ) -> BusinessObjectState {
        let searcher = StateSearcher::new(store);
        let prior = searcher
            .current_state(&BusinessId::new("C1"), ObjectType::Collection)
            .await
            .unwrap();
        let mapper = ShapeMapper::<CollectionShape>::new();
        let mut package = mapper
            .to_package(
                &Collection::new("C1", title).into(),
                &Placement { parent_root, prior: prior.clone() },
            )
            .unwrap();
        if let Some(prior) = &prior {
            package.remove(&prior.root.id);
        }
        archive(store, &package).await;
        searcher
            .current_state(&BusinessId::new("C1"), ObjectType::Collection)
            .await
            .unwrap()
            .unwrap()
    }

    #[tokio::test]
    async fn unknown_object_has_no_state() {
        let store = InMemoryArchive::new();
        let searcher = StateSearcher::new(&store);
        let found = searcher
            .current_state(&BusinessId::new("C1"), ObjectType::Collection)
            .await
            .unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn current_state_follows_the_version_chain() {
        let store = InMemoryArchive::new();
        let v1 = deposit_collection(&store, "v1", None).await;
        let v2 = deposit_collection(&store, "v2", None).await;
        let v3 = deposit_collection(&store, "v3", None).await;

        assert_eq!(v1.root.id, v3.root.id);
        assert_eq!(v2.state.predecessor, Some(v1.state.id.clone()));
        assert_eq!(v3.state.predecessor, Some(v2.state.id.clone()));
        assert_eq!(v3.state.title, "v3");
    }

    #[tokio::test]
    async fn type_scopes_the_search() {
        let store = InMemoryArchive::new();
        deposit_collection(&store, "v1", None).await;
        let searcher = StateSearcher::new(&store);
        assert!(searcher
            .current_state(&BusinessId::new("C1"), ObjectType::DataItem)
            .await
            .unwrap()
            .is_none());
        let any = searcher
            .current_state_any(&BusinessId::new("C1"), &[ObjectType::DataItem, ObjectType::Collection])
            .await
            .unwrap();
        assert_eq!(any.map(|s| s.object_type), Some(ObjectType::Collection));
    }

    #[tokio::test]
    async fn stale_membership_is_filtered() {
        let store = InMemoryArchive::new();
        let searcher = StateSearcher::new(&store);
        let collections = ShapeMapper::<CollectionShape>::new();
        let items = ShapeMapper::<DataItemShape>::new();

        let mut roots = Vec::new();
        for id in ["A", "B"] {
            let package = collections
                .to_package(&Collection::new(id, id).into(), &Placement::default())
                .unwrap();
            roots.push(collections.discover(&package)[0].clone());
            archive(&store, &package).await;
        }

        // D1 lives in A, then moves to B.
        let item: vault_types::BusinessObject = DataItem::new("D1", "Survey").with_parent("A").into();
        let package = items
            .to_package(&item, &Placement { parent_root: Some(roots[0].clone()), prior: None })
            .unwrap();
        archive(&store, &package).await;

        let prior = searcher
            .current_state(&BusinessId::new("D1"), ObjectType::DataItem)
            .await
            .unwrap();
        let moved: vault_types::BusinessObject = DataItem::new("D1", "Survey").with_parent("B").into();
        let mut package = items
            .to_package(&moved, &Placement { parent_root: Some(roots[1].clone()), prior: prior.clone() })
            .unwrap();
        package.remove(&prior.unwrap().root.id);
        archive(&store, &package).await;

        assert!(searcher.current_children(&roots[0]).await.unwrap().is_empty());
        let in_b = searcher.current_children(&roots[1]).await.unwrap();
        assert_eq!(in_b.len(), 1);
    }
}
