use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// The fixed set of archivable business-object types.
///
/// Each variant carries a stable tag (see [`ObjectType::tag`]) that is
/// written into the archive graph and used to pick the right mapper when a
/// graph is read back. Tags never change once released.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ObjectType {
    Collection,
    DataItem,
    DataFile,
    MetadataFile,
    RegistryEntry,
}

impl ObjectType {
    /// Every object type, in tag order.
    pub const ALL: [ObjectType; 5] = [
        Self::Collection,
        Self::DataItem,
        Self::DataFile,
        Self::MetadataFile,
        Self::RegistryEntry,
    ];

    /// The stable serialized tag.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Collection => "collection",
            Self::DataItem => "data-item",
            Self::DataFile => "data-file",
            Self::MetadataFile => "metadata-file",
            Self::RegistryEntry => "registry-entry",
        }
    }

    /// Object types that may act as this type's business parent.
    ///
    /// An empty slice means the type is never parented.
    pub fn parent_types(&self) -> &'static [ObjectType] {
        match self {
            Self::Collection => &[Self::Collection],
            Self::DataItem => &[Self::Collection],
            Self::DataFile => &[Self::DataItem],
            Self::MetadataFile => &[Self::Collection, Self::DataItem, Self::DataFile],
            Self::RegistryEntry => &[],
        }
    }

    /// Whether objects of this type must name a business parent.
    pub fn requires_parent(&self) -> bool {
        matches!(self, Self::DataItem | Self::DataFile | Self::MetadataFile)
    }

    /// Whether objects of this type carry uploadable content.
    pub fn carries_content(&self) -> bool {
        matches!(self, Self::DataFile | Self::MetadataFile)
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for ObjectType {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.tag() == s)
            .ok_or_else(|| TypeError::UnknownObjectType(s.to_string()))
    }
}
