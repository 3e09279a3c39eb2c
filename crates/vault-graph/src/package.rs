//! Package fragments.
//!
//! A [`Package`] holds the entities of one deposit (or of one reassembled
//! query result), keyed by id in deterministic order.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use vault_types::EntityId;

use crate::entity::{DeliverableUnit, DuRole, Entity, EntityKind, FileEntity, Manifestation};
use crate::error::{GraphError, GraphResult};
use crate::traverse::collect_ancestors;

/// A fragment of the archive graph.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    entities: BTreeMap<EntityId, Entity>,
}

impl Package {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entity, failing if its id is already present.
    pub fn insert(&mut self, entity: impl Into<Entity>) -> GraphResult<()> {
        let entity = entity.into();
        let id = entity.id().clone();
        if self.entities.contains_key(&id) {
            return Err(GraphError::DuplicateEntity(id));
        }
        self.entities.insert(id, entity);
        Ok(())
    }

    /// Insert or overwrite an entity. Used when merging query results,
    /// where the same immutable entity can arrive more than once.
    pub fn upsert(&mut self, entity: impl Into<Entity>) {
        let entity = entity.into();
        self.entities.insert(entity.id().clone(), entity);
    }

    pub fn merge(&mut self, other: Package) {
        self.entities.extend(other.entities);
    }

    pub fn remove(&mut self, id: &EntityId) -> Option<Entity> {
        self.entities.remove(id)
    }

    pub fn get(&self, id: &EntityId) -> Option<&Entity> {
        self.entities.get(id)
    }

    pub fn contains(&self, id: &EntityId) -> bool {
        self.entities.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = &EntityId> {
        self.entities.keys()
    }

    // ----- typed access -----

    pub fn du(&self, id: &EntityId) -> GraphResult<&DeliverableUnit> {
        let entity = self
            .entities
            .get(id)
            .ok_or_else(|| GraphError::NotFound(id.clone()))?;
        entity.as_du().ok_or_else(|| GraphError::WrongKind {
            id: id.clone(),
            expected: EntityKind::DeliverableUnit,
        })
    }

    pub fn file(&self, id: &EntityId) -> GraphResult<&FileEntity> {
        let entity = self
            .entities
            .get(id)
            .ok_or_else(|| GraphError::NotFound(id.clone()))?;
        entity.as_file().ok_or_else(|| GraphError::WrongKind {
            id: id.clone(),
            expected: EntityKind::File,
        })
    }

    pub fn deliverable_units(&self) -> impl Iterator<Item = &DeliverableUnit> {
        self.entities.values().filter_map(Entity::as_du)
    }

    pub fn manifestations(&self) -> impl Iterator<Item = &Manifestation> {
        self.entities.values().filter_map(Entity::as_manifestation)
    }

    pub fn files(&self) -> impl Iterator<Item = &FileEntity> {
        self.entities.values().filter_map(Entity::as_file)
    }

    pub fn files_mut(&mut self) -> impl Iterator<Item = &mut FileEntity> {
        self.entities.values_mut().filter_map(|e| match e {
            Entity::File(f) => Some(f),
            _ => None,
        })
    }

    /// DUs with the given role.
    pub fn units_with_role(&self, role: DuRole) -> impl Iterator<Item = &DeliverableUnit> {
        self.deliverable_units()
            .filter(move |du| du.du_type.role == role)
    }

    /// Manifestations of the given DU.
    pub fn manifestations_of<'a>(
        &'a self,
        du: &'a EntityId,
    ) -> impl Iterator<Item = &'a Manifestation> + 'a {
        self.manifestations().filter(move |m| &m.du == du)
    }

    /// Ancestors of `id` within this fragment.
    pub fn ancestors(&self, id: &EntityId, recursive: bool) -> Vec<&Entity> {
        collect_ancestors(id, recursive, |target| self.entities.get(target))
    }

    /// References that resolve neither inside the fragment nor through
    /// `exists_elsewhere`.
    pub fn dangling_references<F>(&self, exists_elsewhere: F) -> Vec<GraphError>
    where
        F: Fn(&EntityId) -> bool,
    {
        let mut dangling = Vec::new();
        for entity in self.entities.values() {
            for target in entity.references() {
                if !self.entities.contains_key(target) && !exists_elsewhere(target) {
                    dangling.push(GraphError::DanglingReference {
                        entity: entity.id().clone(),
                        target: target.clone(),
                    });
                }
            }
        }
        dangling
    }
}

impl FromIterator<Entity> for Package {
    fn from_iter<I: IntoIterator<Item = Entity>>(iter: I) -> Self {
        let mut package = Package::new();
        for entity in iter {
            package.upsert(entity);
        }
        package
    }
}

impl IntoIterator for Package {
    type Item = Entity;
    type IntoIter = std::collections::btree_map::IntoValues<EntityId, Entity>;

    fn into_iter(self) -> Self::IntoIter {
        self.entities.into_values()
    }
}

#[cfg(test)]
mod tests {
    use vault_types::ObjectType;

    use super::*;
    use crate::entity::{DuType, ParentRef};

    fn sample() -> Package {
        let root = DeliverableUnit::new("du:r".into(), DuType::root(ObjectType::DataFile), "a.csv");
        let mut state =
            DeliverableUnit::new("du:s".into(), DuType::state(ObjectType::DataFile), "a.csv");
        state.parents.push(ParentRef::lineage("du:r".into()));
        state.parents.push(ParentRef::member("du:item".into()));
        let file = FileEntity::staged("file:c".into(), "a.csv", b"x,y".to_vec());
        let mf = Manifestation {
            id: "mf:c".into(),
            du: "du:s".into(),
            tech_env: "content".into(),
            files: vec!["file:c".into()],
        };

        let mut package = Package::new();
        package.insert(root).unwrap();
        package.insert(state).unwrap();
        package.insert(file).unwrap();
        package.insert(mf).unwrap();
        package
    }

    #[test]
    fn insert_rejects_duplicates() {
        let mut package = sample();
        let dup = FileEntity::staged("file:c".into(), "b.csv", Vec::new());
        let err = package.insert(dup).unwrap_err();
        assert_eq!(err, GraphError::DuplicateEntity("file:c".into()));
        assert_eq!(package.len(), 4);
    }

    #[test]
    fn upsert_overwrites() {
        let mut package = sample();
        package.upsert(FileEntity::staged("file:c".into(), "b.csv", Vec::new()));
        assert_eq!(package.file(&"file:c".into()).unwrap().name, "b.csv");
    }

    #[test]
    fn typed_access_checks_kind() {
        let package = sample();
        assert!(package.du(&"du:s".into()).is_ok());
        let err = package.du(&"file:c".into()).unwrap_err();
        assert!(matches!(err, GraphError::WrongKind { expected: EntityKind::DeliverableUnit, .. }));
        assert!(matches!(package.file(&"nope".into()), Err(GraphError::NotFound(_))));
    }

    #[test]
    fn role_and_manifestation_filters() {
        let package = sample();
        assert_eq!(package.units_with_role(DuRole::Root).count(), 1);
        assert_eq!(package.units_with_role(DuRole::State).count(), 1);
        let state_id = EntityId::new("du:s");
        assert_eq!(package.manifestations_of(&state_id).count(), 1);
    }

    #[test]
    fn ancestors_within_fragment() {
        let package = sample();
        let found = package.ancestors(&"mf:c".into(), true);
        let ids: Vec<_> = found.iter().map(|e| e.id().as_str()).collect();
        assert!(ids.contains(&"du:s"));
        assert!(ids.contains(&"du:r"));
        assert!(ids.contains(&"file:c"));
    }

    #[test]
    fn dangling_references_consult_the_outside() {
        let package = sample();
        let dangling = package.dangling_references(|_| false);
        assert_eq!(dangling.len(), 1);
        assert!(matches!(
            &dangling[0],
            GraphError::DanglingReference { target, .. } if target.as_str() == "du:item"
        ));
        assert!(package.dangling_references(|id| id.as_str() == "du:item").is_empty());
    }

    #[test]
    fn collect_and_merge() {
        let a: Package = sample().into_iter().take(2).collect();
        let mut b: Package = sample().into_iter().skip(2).collect();
        b.merge(a);
        assert_eq!(b, sample());
    }
}
