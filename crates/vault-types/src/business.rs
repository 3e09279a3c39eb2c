//! Caller-facing business objects.
//!
//! Business objects are mutable from the caller's point of view: depositing
//! the same [`BusinessId`] again with different field values produces a new
//! archived version. The archive itself only ever sees immutable fragments.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ids::{BusinessId, UploadHandle};
use crate::object::ObjectType;

/// Content carried by a file-like business object.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileContent {
    /// Raw bytes still to be uploaded.
    Bytes(Vec<u8>),
    /// Content already held by the archive under a connector upload handle.
    Archived { handle: UploadHandle, size: u64 },
}

impl FileContent {
    pub fn size(&self) -> u64 {
        match self {
            Self::Bytes(bytes) => bytes.len() as u64,
            Self::Archived { size, .. } => *size,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }
}

/// A named grouping of data items and sub-collections.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collection {
    pub id: BusinessId,
    pub title: String,
    pub summary: Option<String>,
    pub parent_id: Option<BusinessId>,
    pub creators: Vec<String>,
    pub alternate_ids: Vec<String>,
}

impl Collection {
    pub fn new(id: impl Into<BusinessId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            summary: None,
            parent_id: None,
            creators: Vec::new(),
            alternate_ids: Vec::new(),
        }
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    pub fn with_parent(mut self, parent: impl Into<BusinessId>) -> Self {
        self.parent_id = Some(parent.into());
        self
    }

    pub fn with_creator(mut self, creator: impl Into<String>) -> Self {
        self.creators.push(creator.into());
        self
    }
}

/// A dataset: a unit of deposit that groups data files.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataItem {
    pub id: BusinessId,
    pub name: String,
    pub description: Option<String>,
    pub parent_id: Option<BusinessId>,
    pub depositor: Option<String>,
}

impl DataItem {
    pub fn new(id: impl Into<BusinessId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            parent_id: None,
            depositor: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_parent(mut self, parent: impl Into<BusinessId>) -> Self {
        self.parent_id = Some(parent.into());
        self
    }

    pub fn with_depositor(mut self, depositor: impl Into<String>) -> Self {
        self.depositor = Some(depositor.into());
        self
    }
}

/// A content file belonging to a data item.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataFile {
    pub id: BusinessId,
    pub name: String,
    pub parent_id: Option<BusinessId>,
    pub format: Option<String>,
    pub content: FileContent,
}

impl DataFile {
    pub fn new(id: impl Into<BusinessId>, name: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            parent_id: None,
            format: None,
            content: FileContent::Bytes(content),
        }
    }

    pub fn with_parent(mut self, parent: impl Into<BusinessId>) -> Self {
        self.parent_id = Some(parent.into());
        self
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }
}

/// A metadata document describing another business object.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataFile {
    pub id: BusinessId,
    pub name: String,
    pub parent_id: Option<BusinessId>,
    pub format: Option<String>,
    pub content: FileContent,
}

impl MetadataFile {
    pub fn new(id: impl Into<BusinessId>, name: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            parent_id: None,
            format: None,
            content: FileContent::Bytes(content),
        }
    }

    pub fn with_parent(mut self, parent: impl Into<BusinessId>) -> Self {
        self.parent_id = Some(parent.into());
        self
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }
}

/// An entry in an external registry (e.g. a metadata scheme or format).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryEntry {
    pub id: BusinessId,
    pub entry_type: String,
    pub description: String,
    pub keys: Vec<String>,
    pub entries: BTreeMap<String, String>,
}

impl RegistryEntry {
    pub fn new(
        id: impl Into<BusinessId>,
        entry_type: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            entry_type: entry_type.into(),
            description: description.into(),
            keys: Vec::new(),
            entries: BTreeMap::new(),
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.keys.push(key.into());
        self
    }

    pub fn with_entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.entries.insert(key.into(), value.into());
        self
    }
}

/// Tagged union over every archivable business object.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum BusinessObject {
    Collection(Collection),
    DataItem(DataItem),
    DataFile(DataFile),
    MetadataFile(MetadataFile),
    RegistryEntry(RegistryEntry),
}

impl BusinessObject {
    pub fn id(&self) -> &BusinessId {
        match self {
            Self::Collection(c) => &c.id,
            Self::DataItem(d) => &d.id,
            Self::DataFile(f) => &f.id,
            Self::MetadataFile(m) => &m.id,
            Self::RegistryEntry(r) => &r.id,
        }
    }

    pub fn object_type(&self) -> ObjectType {
        match self {
            Self::Collection(_) => ObjectType::Collection,
            Self::DataItem(_) => ObjectType::DataItem,
            Self::DataFile(_) => ObjectType::DataFile,
            Self::MetadataFile(_) => ObjectType::MetadataFile,
            Self::RegistryEntry(_) => ObjectType::RegistryEntry,
        }
    }

    /// The business id of this object's parent, if it has one.
    pub fn parent_id(&self) -> Option<&BusinessId> {
        match self {
            Self::Collection(c) => c.parent_id.as_ref(),
            Self::DataItem(d) => d.parent_id.as_ref(),
            Self::DataFile(f) => f.parent_id.as_ref(),
            Self::MetadataFile(m) => m.parent_id.as_ref(),
            Self::RegistryEntry(_) => None,
        }
    }

    /// Title of a collection, name of items and files, description of
    /// registry entries.
    pub fn display_name(&self) -> &str {
        match self {
            Self::Collection(c) => &c.title,
            Self::DataItem(d) => &d.name,
            Self::DataFile(f) => &f.name,
            Self::MetadataFile(m) => &m.name,
            Self::RegistryEntry(r) => &r.description,
        }
    }

    /// Content of file-like objects.
    pub fn content(&self) -> Option<&FileContent> {
        match self {
            Self::DataFile(f) => Some(&f.content),
            Self::MetadataFile(m) => Some(&m.content),
            _ => None,
        }
    }

    pub fn as_collection(&self) -> Option<&Collection> {
        match self {
            Self::Collection(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_data_item(&self) -> Option<&DataItem> {
        match self {
            Self::DataItem(d) => Some(d),
            _ => None,
        }
    }
}

impl From<Collection> for BusinessObject {
    fn from(c: Collection) -> Self {
        Self::Collection(c)
    }
}

impl From<DataItem> for BusinessObject {
    fn from(d: DataItem) -> Self {
        Self::DataItem(d)
    }
}

impl From<DataFile> for BusinessObject {
    fn from(f: DataFile) -> Self {
        Self::DataFile(f)
    }
}

impl From<MetadataFile> for BusinessObject {
    fn from(m: MetadataFile) -> Self {
        Self::MetadataFile(m)
    }
}

impl From<RegistryEntry> for BusinessObject {
    fn from(r: RegistryEntry) -> Self {
        Self::RegistryEntry(r)
    }
}
