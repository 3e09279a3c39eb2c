use vault_graph::Properties;
use vault_types::{BusinessObject, ObjectType, RegistryEntry};

use crate::error::{MappingError, ValidationError};
use crate::fields::{PropertiesReader, PropertiesWriter};
use crate::shape::{require, ObjectParts, ObjectShape};

/// Registry entries are never parented and carry no content.
pub struct RegistryEntryShape;

impl ObjectShape for RegistryEntryShape {
    const OBJECT_TYPE: ObjectType = ObjectType::RegistryEntry;

    fn validate_fields(object: &BusinessObject) -> Result<(), ValidationError> {
        let BusinessObject::RegistryEntry(r) = object else {
            return Ok(());
        };
        require(Self::OBJECT_TYPE, "entry type", &r.entry_type)?;
        require(Self::OBJECT_TYPE, "description", &r.description)
    }

    fn properties(object: &BusinessObject) -> Properties {
        let BusinessObject::RegistryEntry(r) = object else {
            return Properties::new();
        };
        PropertiesWriter::new()
            .text("entry-type", &r.entry_type)
            .text("description", &r.description)
            .list("keys", &r.keys)
            .map("entries", &r.entries)
            .finish()
    }

    fn assemble(parts: ObjectParts) -> Result<BusinessObject, MappingError> {
        let fields = PropertiesReader::new(&parts.properties);
        Ok(RegistryEntry {
            id: parts.business_id,
            entry_type: fields.text("entry-type")?,
            description: fields.text("description")?,
            keys: fields.list("keys")?,
            entries: fields.map("entries")?,
        }
        .into())
    }
}
