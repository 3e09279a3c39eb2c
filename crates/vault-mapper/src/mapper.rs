use std::marker::PhantomData;

use async_trait::async_trait;
use tracing::debug;

use vault_connector::{AncestryQuery, ArchiveConnector};
use vault_graph::{
    DeliverableUnit, DuRole, DuType, Entity, FileEntity, FileSource, Manifestation, Package,
    ParentRef, Properties,
};
use vault_types::{BusinessId, BusinessObject, EntityId, FileContent, ObjectType};

use crate::conformance::{self, CanonicalGraph, CONTENT_MANIFESTATION};
use crate::error::{MappingError, NonConformance, ValidationError};
use crate::searcher::BusinessObjectState;
use crate::shape::{self, ObjectParts, ObjectShape};

/// Where a new version goes in the archive graph.
#[derive(Clone, Debug, Default)]
pub struct Placement {
    /// Root DU of the business parent, if the object has one.
    pub parent_root: Option<EntityId>,
    /// Current archived state of the object; `None` on first deposit.
    pub prior: Option<BusinessObjectState>,
}

/// Converts one object type between business objects and package fragments.
#[async_trait]
pub trait VersionGraphMapper: Send + Sync {
    fn object_type(&self) -> ObjectType;

    /// Required-field validation. Runs before any network call.
    fn validate(&self, object: &BusinessObject) -> Result<(), ValidationError>;

    /// Build the fragment for a new version of `object`.
    ///
    /// The fragment always contains a Root DU node (the prior root's id on
    /// update, a fresh id otherwise), a new State DU, and its properties
    /// file. Content-bearing types add a staged content file and its
    /// manifestation. Apart from freshly minted ids, the output is a pure
    /// function of the inputs.
    fn to_package(
        &self,
        object: &BusinessObject,
        placement: &Placement,
    ) -> Result<Package, MappingError>;

    /// Ordered shape checks; on success, the canonical nodes to read from.
    fn conforms(&self, package: &Package) -> Result<CanonicalGraph, NonConformance>;

    /// Root DU ids of this type found in `package`.
    fn discover(&self, package: &Package) -> Vec<EntityId>;

    /// Rebuild the business object from the canonical nodes. Metadata files
    /// and parent roots not inline in `package` are fetched from the archive.
    async fn get(
        &self,
        package: &Package,
        canonical: &CanonicalGraph,
        connector: &dyn ArchiveConnector,
    ) -> Result<BusinessObject, MappingError>;

    async fn from_package(
        &self,
        package: &Package,
        connector: &dyn ArchiveConnector,
    ) -> Result<BusinessObject, MappingError> {
        let canonical = self.conforms(package)?;
        self.get(package, &canonical, connector).await
    }
}

/// The [`VersionGraphMapper`] for shape `S`.
pub struct ShapeMapper<S> {
    _shape: PhantomData<S>,
}

impl<S: ObjectShape> ShapeMapper<S> {
    pub fn new() -> Self {
        Self {
            _shape: PhantomData,
        }
    }
}

impl<S: ObjectShape> Default for ShapeMapper<S> {
    fn default() -> Self {
        Self::new()
    }
}

/// Id of the properties file describing `state`.
pub fn properties_file_id(state: &EntityId) -> EntityId {
    EntityId::derived("file", state, "properties")
}

#[async_trait]
impl<S: ObjectShape> VersionGraphMapper for ShapeMapper<S> {
    fn object_type(&self) -> ObjectType {
        S::OBJECT_TYPE
    }

    fn validate(&self, object: &BusinessObject) -> Result<(), ValidationError> {
        shape::validate::<S>(object)
    }

    fn to_package(
        &self,
        object: &BusinessObject,
        placement: &Placement,
    ) -> Result<Package, MappingError> {
        self.validate(object)?;
        let object_type = S::OBJECT_TYPE;
        let title = object.display_name();

        let root_id = match &placement.prior {
            Some(prior) => prior.root.id.clone(),
            None => EntityId::mint("du"),
        };
        let mut root = DeliverableUnit::new(root_id.clone(), DuType::root(object_type), title);
        root.former_refs.insert(object.id().to_string());

        let state_id = EntityId::mint("du");
        let props_id = properties_file_id(&state_id);
        let mut state = DeliverableUnit::new(state_id.clone(), DuType::state(object_type), title);
        state.parents.push(ParentRef::lineage(root_id));
        if let Some(parent_root) = &placement.parent_root {
            state.parents.push(ParentRef::member(parent_root.clone()));
        }
        state.predecessor = placement.prior.as_ref().map(|p| p.state.id.clone());
        state.metadata_refs.push(props_id.clone());

        let mut package = Package::new();
        package.insert(FileEntity::properties(
            props_id,
            "properties.json",
            S::properties(object),
        ))?;

        if let Some(content) = object.content() {
            let file_id = EntityId::derived("file", &state_id, CONTENT_MANIFESTATION);
            let mut file = match content {
                FileContent::Bytes(bytes) => {
                    FileEntity::staged(file_id.clone(), title, bytes.clone())
                }
                FileContent::Archived { handle, size } => FileEntity {
                    id: file_id.clone(),
                    name: title.to_string(),
                    format: None,
                    size: *size,
                    source: FileSource::Uploaded(handle.clone()),
                    properties: Properties::new(),
                },
            };
            file.format = content_format(object);
            package.insert(file)?;
            package.insert(Manifestation {
                id: EntityId::derived("mf", &state_id, CONTENT_MANIFESTATION),
                du: state_id.clone(),
                tech_env: CONTENT_MANIFESTATION.to_string(),
                files: vec![file_id],
            })?;
        }

        package.insert(root)?;
        package.insert(state)?;
        debug!(
            object_type = %object_type,
            business_id = %object.id(),
            state = %state_id,
            entities = package.len(),
            "fragment built"
        );
        Ok(package)
    }

    fn conforms(&self, package: &Package) -> Result<CanonicalGraph, NonConformance> {
        conformance::check(package, S::OBJECT_TYPE, S::REQUIRED_MANIFESTATIONS)
    }

    fn discover(&self, package: &Package) -> Vec<EntityId> {
        package
            .units_with_role(DuRole::Root)
            .filter(|du| du.object_type() == S::OBJECT_TYPE)
            .map(|du| du.id.clone())
            .collect()
    }

    async fn get(
        &self,
        package: &Package,
        canonical: &CanonicalGraph,
        connector: &dyn ArchiveConnector,
    ) -> Result<BusinessObject, MappingError> {
        let lookup = AncestryQuery::new(connector);
        let state = package.du(&canonical.state)?;

        let root = resolve_du(package, &lookup, &canonical.root).await?;
        let business_id = business_id_of(&root)?;

        let parent_id = match &canonical.member_of {
            Some(parent_root) => {
                let parent = resolve_du(package, &lookup, parent_root).await?;
                Some(business_id_of(&parent)?)
            }
            None => None,
        };

        let mut properties = Properties::new();
        for file_id in &state.metadata_refs {
            let file = match package.file(file_id) {
                Ok(file) => file.clone(),
                Err(_) => match lookup.identity(file_id).await? {
                    Some(Entity::File(file)) => file,
                    _ => return Err(MappingError::UnresolvableReference(file_id.clone())),
                },
            };
            properties.extend(file.properties);
        }

        let content = match canonical.manifestations.get(CONTENT_MANIFESTATION) {
            Some(mf_id) if S::OBJECT_TYPE.carries_content() => {
                Some(content_of(package, mf_id)?)
            }
            _ => None,
        };

        S::assemble(ObjectParts {
            business_id,
            parent_id,
            title: state.title.clone(),
            properties,
            content,
        })
    }
}

fn content_format(object: &BusinessObject) -> Option<String> {
    match object {
        BusinessObject::DataFile(f) => f.format.clone(),
        BusinessObject::MetadataFile(m) => m.format.clone(),
        _ => None,
    }
}

async fn resolve_du(
    package: &Package,
    lookup: &AncestryQuery<'_>,
    id: &EntityId,
) -> Result<DeliverableUnit, MappingError> {
    if let Ok(du) = package.du(id) {
        return Ok(du.clone());
    }
    match lookup.identity(id).await? {
        Some(Entity::DeliverableUnit(du)) => Ok(du),
        _ => Err(MappingError::UnresolvableReference(id.clone())),
    }
}

fn business_id_of(root: &DeliverableUnit) -> Result<BusinessId, MappingError> {
    root.former_refs
        .iter()
        .next()
        .map(|r| BusinessId::new(r.as_str()))
        .ok_or_else(|| MappingError::MissingBusinessId(root.id.clone()))
}

fn content_of(package: &Package, manifestation: &EntityId) -> Result<FileContent, MappingError> {
    let mf = package
        .get(manifestation)
        .and_then(Entity::as_manifestation)
        .ok_or_else(|| MappingError::UnresolvableReference(manifestation.clone()))?;
    let file_id = mf
        .files
        .first()
        .ok_or_else(|| MappingError::UnresolvableReference(manifestation.clone()))?;
    let file = package.file(file_id)?;
    match &file.source {
        FileSource::Uploaded(handle) => Ok(FileContent::Archived {
            handle: handle.clone(),
            size: file.size,
        }),
        FileSource::Staged(bytes) => Ok(FileContent::Bytes(bytes.clone())),
        FileSource::Embedded => Err(MappingError::InvalidField {
            field: CONTENT_MANIFESTATION.into(),
            reason: format!("file {} has no content stream", file.id),
        }),
    }
}
