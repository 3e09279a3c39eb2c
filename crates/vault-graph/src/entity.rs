//! Archive-side entities.
//!
//! Each [`DeliverableUnit`] tracks its parents via typed [`ParentRef`]
//! edges. The [`ParentRelation`] distinguishes the version lineage (State DU
//! to Root DU) from business membership (State DU to the Root DU of the
//! object's parent).

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use vault_types::{EntityId, ObjectType, UploadHandle};

/// Key/value metadata carried by an embedded properties file.
pub type Properties = BTreeMap<String, Value>;

/// Role of a DU in a business object's version history.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DuRole {
    /// Head of the lineage. Created once per business id, never superseded.
    Root,
    /// One version of the object's content.
    State,
}

/// Type tag written on every DU: the object type plus the DU's role.
///
/// The tag is what the mapper registry dispatches on when a graph is read
/// back, so its string form is stable (`"collection/root"`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DuType {
    pub object_type: ObjectType,
    pub role: DuRole,
}

impl DuType {
    pub fn root(object_type: ObjectType) -> Self {
        Self {
            object_type,
            role: DuRole::Root,
        }
    }

    pub fn state(object_type: ObjectType) -> Self {
        Self {
            object_type,
            role: DuRole::State,
        }
    }

    pub fn tag(&self) -> String {
        let role = match self.role {
            DuRole::Root => "root",
            DuRole::State => "state",
        };
        format!("{}/{role}", self.object_type.tag())
    }
}

impl fmt::Display for DuType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tag())
    }
}

/// The kind of relationship between a DU and one of its parents.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ParentRelation {
    /// State DU to the Root DU of its own lineage.
    Lineage,
    /// State DU to the Root DU of its business parent.
    Member,
}

impl fmt::Display for ParentRelation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lineage => write!(f, "Lineage"),
            Self::Member => write!(f, "Member"),
        }
    }
}

/// A reference to a parent DU with the type of relationship.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParentRef {
    pub target: EntityId,
    pub relation: ParentRelation,
}

impl ParentRef {
    pub fn new(target: EntityId, relation: ParentRelation) -> Self {
        Self { target, relation }
    }

    pub fn lineage(target: EntityId) -> Self {
        Self::new(target, ParentRelation::Lineage)
    }

    pub fn member(target: EntityId) -> Self {
        Self::new(target, ParentRelation::Member)
    }
}

/// An immutable node of the archive graph.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliverableUnit {
    pub id: EntityId,
    pub du_type: DuType,
    pub title: String,
    pub parents: Vec<ParentRef>,
    /// The prior State DU this one supersedes (`is-successor-of`).
    pub predecessor: Option<EntityId>,
    /// Former external references; Root DUs carry the business id here.
    pub former_refs: BTreeSet<String>,
    /// Embedded properties files describing this DU.
    pub metadata_refs: Vec<EntityId>,
}

impl DeliverableUnit {
    pub fn new(id: EntityId, du_type: DuType, title: impl Into<String>) -> Self {
        Self {
            id,
            du_type,
            title: title.into(),
            parents: Vec::new(),
            predecessor: None,
            former_refs: BTreeSet::new(),
            metadata_refs: Vec::new(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.du_type.role == DuRole::Root
    }

    pub fn is_state(&self) -> bool {
        self.du_type.role == DuRole::State
    }

    pub fn object_type(&self) -> ObjectType {
        self.du_type.object_type
    }

    /// The Root DU this State DU belongs to.
    pub fn lineage(&self) -> Option<&EntityId> {
        self.parents_by_relation(ParentRelation::Lineage)
            .next()
            .map(|p| &p.target)
    }

    /// Root DUs of the business parents this DU declares membership in.
    pub fn member_of(&self) -> impl Iterator<Item = &EntityId> {
        self.parents_by_relation(ParentRelation::Member)
            .map(|p| &p.target)
    }

    pub fn parents_by_relation(
        &self,
        relation: ParentRelation,
    ) -> impl Iterator<Item = &ParentRef> {
        self.parents.iter().filter(move |p| p.relation == relation)
    }

    pub fn has_parent(&self, target: &EntityId) -> bool {
        self.parents.iter().any(|p| &p.target == target)
    }
}

/// A technical rendition of a DU (identified by its technical-environment
/// tag) referencing the files that make it up.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifestation {
    pub id: EntityId,
    pub du: EntityId,
    pub tech_env: String,
    pub files: Vec<EntityId>,
}

/// Where a file's bytes live.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileSource {
    /// Bytes staged locally; must be uploaded before the package is submitted.
    Staged(Vec<u8>),
    /// Bytes held by the archive under a connector-issued handle.
    Uploaded(UploadHandle),
    /// No content stream: the file is its embedded properties.
    Embedded,
}

/// A file entity: uploaded content or an embedded properties document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntity {
    pub id: EntityId,
    pub name: String,
    pub format: Option<String>,
    pub size: u64,
    pub source: FileSource,
    pub properties: Properties,
}

impl FileEntity {
    /// An embedded key/value properties file.
    pub fn properties(id: EntityId, name: impl Into<String>, properties: Properties) -> Self {
        Self {
            id,
            name: name.into(),
            format: Some("application/json".into()),
            size: 0,
            source: FileSource::Embedded,
            properties,
        }
    }

    /// A content file whose bytes still have to be uploaded.
    pub fn staged(id: EntityId, name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            id,
            name: name.into(),
            format: None,
            size: bytes.len() as u64,
            source: FileSource::Staged(bytes),
            properties: Properties::new(),
        }
    }

    pub fn is_staged(&self) -> bool {
        matches!(self.source, FileSource::Staged(_))
    }

    pub fn upload_handle(&self) -> Option<&UploadHandle> {
        match &self.source {
            FileSource::Uploaded(handle) => Some(handle),
            _ => None,
        }
    }
}

/// Discriminant of [`Entity`], used for typed parent lookups.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntityKind {
    DeliverableUnit,
    Manifestation,
    File,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DeliverableUnit => write!(f, "deliverable unit"),
            Self::Manifestation => write!(f, "manifestation"),
            Self::File => write!(f, "file"),
        }
    }
}

/// Any archive entity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Entity {
    DeliverableUnit(DeliverableUnit),
    Manifestation(Manifestation),
    File(FileEntity),
}

impl Entity {
    pub fn id(&self) -> &EntityId {
        match self {
            Self::DeliverableUnit(du) => &du.id,
            Self::Manifestation(m) => &m.id,
            Self::File(f) => &f.id,
        }
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            Self::DeliverableUnit(_) => EntityKind::DeliverableUnit,
            Self::Manifestation(_) => EntityKind::Manifestation,
            Self::File(_) => EntityKind::File,
        }
    }

    /// Upward links followed by ancestry traversal: DU parents,
    /// manifestation to DU, and manifestation to files.
    pub fn links(&self) -> Vec<&EntityId> {
        match self {
            Self::DeliverableUnit(du) => du.parents.iter().map(|p| &p.target).collect(),
            Self::Manifestation(m) => std::iter::once(&m.du).chain(m.files.iter()).collect(),
            Self::File(_) => Vec::new(),
        }
    }

    /// Every entity this one refers to directly: its links, its
    /// predecessor, and its metadata files.
    pub fn references(&self) -> Vec<&EntityId> {
        let mut refs = self.links();
        if let Self::DeliverableUnit(du) = self {
            refs.extend(du.predecessor.iter());
            refs.extend(du.metadata_refs.iter());
        }
        refs
    }

    pub fn refers_to(&self, target: &EntityId) -> bool {
        self.references().into_iter().any(|r| r == target)
    }

    pub fn as_du(&self) -> Option<&DeliverableUnit> {
        match self {
            Self::DeliverableUnit(du) => Some(du),
            _ => None,
        }
    }

    pub fn as_manifestation(&self) -> Option<&Manifestation> {
        match self {
            Self::Manifestation(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_file(&self) -> Option<&FileEntity> {
        match self {
            Self::File(f) => Some(f),
            _ => None,
        }
    }
}

impl From<DeliverableUnit> for Entity {
    fn from(du: DeliverableUnit) -> Self {
        Self::DeliverableUnit(du)
    }
}

impl From<Manifestation> for Entity {
    fn from(m: Manifestation) -> Self {
        Self::Manifestation(m)
    }
}

impl From<FileEntity> for Entity {
    fn from(f: FileEntity) -> Self {
        Self::File(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_du() -> DeliverableUnit {
        let mut du = DeliverableUnit::new(
            EntityId::new("du:s1"),
            DuType::state(ObjectType::DataItem),
            "Survey",
        );
        du.parents.push(ParentRef::lineage(EntityId::new("du:r1")));
        du.parents.push(ParentRef::member(EntityId::new("du:c1")));
        du.predecessor = Some(EntityId::new("du:s0"));
        du.metadata_refs.push(EntityId::new("file:p1"));
        du
    }

    #[test]
    fn du_type_tags_are_stable() {
        assert_eq!(DuType::root(ObjectType::Collection).tag(), "collection/root");
        assert_eq!(DuType::state(ObjectType::DataFile).tag(), "data-file/state");
    }

    #[test]
    fn lineage_and_membership_are_separate() {
        let du = state_du();
        assert_eq!(du.lineage(), Some(&EntityId::new("du:r1")));
        let members: Vec<_> = du.member_of().collect();
        assert_eq!(members, vec![&EntityId::new("du:c1")]);
        assert!(du.is_state());
        assert!(!du.is_root());
    }

    #[test]
    fn links_exclude_predecessor_and_metadata() {
        let entity = Entity::from(state_du());
        let links = entity.links();
        assert_eq!(links.len(), 2);
        assert!(!links.contains(&&EntityId::new("du:s0")));
    }

    #[test]
    fn references_include_everything() {
        let entity = Entity::from(state_du());
        assert!(entity.refers_to(&EntityId::new("du:s0")));
        assert!(entity.refers_to(&EntityId::new("file:p1")));
        assert!(entity.refers_to(&EntityId::new("du:c1")));
        assert!(!entity.refers_to(&EntityId::new("du:other")));
    }

    #[test]
    fn manifestation_links_to_du_and_files() {
        let m = Entity::from(Manifestation {
            id: EntityId::new("mf:1"),
            du: EntityId::new("du:s1"),
            tech_env: "content".into(),
            files: vec![EntityId::new("file:1"), EntityId::new("file:2")],
        });
        assert_eq!(m.links().len(), 3);
        assert_eq!(m.kind(), EntityKind::Manifestation);
    }

    #[test]
    fn staged_file_records_size() {
        let f = FileEntity::staged(EntityId::new("file:1"), "a.bin", vec![0; 12]);
        assert_eq!(f.size, 12);
        assert!(f.is_staged());
        assert!(f.upload_handle().is_none());
    }
}
