use std::collections::HashMap;
use std::sync::Arc;

use vault_graph::{DuType, Package};
use vault_types::{BusinessObject, ObjectType};

use crate::error::MappingError;
use crate::mapper::{ShapeMapper, VersionGraphMapper};
use crate::shapes::{
    CollectionShape, DataFileShape, DataItemShape, MetadataFileShape, RegistryEntryShape,
};

/// Dispatch table from object type to its mapper.
///
/// Built once at startup. Archived graphs are dispatched on the type tag
/// carried by their DUs (`"data-item/state"`), never on runtime type
/// information.
#[derive(Clone)]
pub struct MapperRegistry {
    mappers: HashMap<ObjectType, Arc<dyn VersionGraphMapper>>,
}

impl MapperRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            mappers: HashMap::new(),
        }
    }

    /// A registry holding the mapper of every archivable type.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(ShapeMapper::<CollectionShape>::new()));
        registry.register(Arc::new(ShapeMapper::<DataItemShape>::new()));
        registry.register(Arc::new(ShapeMapper::<DataFileShape>::new()));
        registry.register(Arc::new(ShapeMapper::<MetadataFileShape>::new()));
        registry.register(Arc::new(ShapeMapper::<RegistryEntryShape>::new()));
        registry
    }

    /// Add or replace the mapper for its object type.
    pub fn register(&mut self, mapper: Arc<dyn VersionGraphMapper>) {
        self.mappers.insert(mapper.object_type(), mapper);
    }

    pub fn get(&self, object_type: ObjectType) -> Result<&Arc<dyn VersionGraphMapper>, MappingError> {
        self.mappers
            .get(&object_type)
            .ok_or_else(|| MappingError::NoMapper(object_type.to_string()))
    }

    pub fn for_object(&self, object: &BusinessObject) -> Result<&Arc<dyn VersionGraphMapper>, MappingError> {
        self.get(object.object_type())
    }

    /// Resolve a serialized DU type tag such as `"collection/state"`.
    pub fn for_tag(&self, tag: &str) -> Result<&Arc<dyn VersionGraphMapper>, MappingError> {
        let object_type = tag
            .split_once('/')
            .and_then(|(ty, _role)| ty.parse::<ObjectType>().ok())
            .ok_or_else(|| MappingError::NoMapper(tag.to_string()))?;
        self.get(object_type)
    }

    pub fn for_du_type(&self, du_type: &DuType) -> Result<&Arc<dyn VersionGraphMapper>, MappingError> {
        self.for_tag(&du_type.tag())
    }

    /// The mapper of the fragment's State DU. A fragment holding states of
    /// several types (a child graph including its parent's nodes) resolves
    /// to the state that no other state in the fragment references.
    pub fn for_package(&self, package: &Package) -> Result<&Arc<dyn VersionGraphMapper>, MappingError> {
        let states: Vec<_> = package
            .deliverable_units()
            .filter(|du| du.is_state())
            .collect();
        let leaf = states
            .iter()
            .find(|du| {
                !states
                    .iter()
                    .any(|other| other.id != du.id && other.has_parent(&du.id))
            })
            .ok_or_else(|| MappingError::NoMapper("package without state DU".into()))?;
        self.for_du_type(&leaf.du_type)
    }

    pub fn len(&self) -> usize {
        self.mappers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappers.is_empty()
    }
}

impl Default for MapperRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use vault_types::{Collection, DataItem};

    use super::*;
    use crate::mapper::Placement;

    #[test]
    fn standard_registry_covers_every_type() {
        let registry = MapperRegistry::standard();
        assert_eq!(registry.len(), ObjectType::ALL.len());
        for ty in ObjectType::ALL {
            assert_eq!(registry.get(ty).unwrap().object_type(), ty);
        }
    }

    #[test]
    fn dispatch_by_tag() {
        let registry = MapperRegistry::standard();
        let mapper = registry.for_tag("data-item/state").unwrap();
        assert_eq!(mapper.object_type(), ObjectType::DataItem);
        assert!(matches!(registry.for_tag("dataset/state"), Err(MappingError::NoMapper(_))));
        assert!(registry.for_tag("collection").is_err());
    }

    #[test]
    fn empty_registry_has_no_mappers() {
        let registry = MapperRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.get(ObjectType::Collection).is_err());
    }

    #[test]
    fn dispatch_by_package() {
        let registry = MapperRegistry::standard();
        let item: BusinessObject = DataItem::new("D1", "Survey").with_parent("C1").into();
        let mapper = registry.for_object(&item).unwrap();
        let package = mapper
            .to_package(&item, &Placement { parent_root: Some("c-root".into()), prior: None })
            .unwrap();
        assert_eq!(
            registry.for_package(&package).unwrap().object_type(),
            ObjectType::DataItem
        );

        let collection: BusinessObject = Collection::new("C1", "Ocean").into();
        let package = registry
            .for_object(&collection)
            .unwrap()
            .to_package(&collection, &Placement::default())
            .unwrap();
        assert_eq!(
            registry.for_package(&package).unwrap().object_type(),
            ObjectType::Collection
        );
    }
}
