use vault_graph::Properties;
use vault_types::{BusinessObject, DataFile, ObjectType};

use crate::conformance::CONTENT_MANIFESTATION;
use crate::error::{MappingError, ValidationError};
use crate::fields::{PropertiesReader, PropertiesWriter};
use crate::shape::{require, ObjectParts, ObjectShape};

pub struct DataFileShape;

impl ObjectShape for DataFileShape {
    const OBJECT_TYPE: ObjectType = ObjectType::DataFile;
    const REQUIRED_MANIFESTATIONS: &'static [&'static str] = &[CONTENT_MANIFESTATION];

    fn validate_fields(object: &BusinessObject) -> Result<(), ValidationError> {
        match object {
            BusinessObject::DataFile(f) => require(Self::OBJECT_TYPE, "name", &f.name),
            _ => Ok(()),
        }
    }

    fn properties(object: &BusinessObject) -> Properties {
        let BusinessObject::DataFile(f) = object else {
            return Properties::new();
        };
        PropertiesWriter::new()
            .text("name", &f.name)
            .opt_text("format", f.format.as_ref())
            .finish()
    }

    fn assemble(parts: ObjectParts) -> Result<BusinessObject, MappingError> {
        let fields = PropertiesReader::new(&parts.properties);
        let content = parts
            .content
            .ok_or_else(|| MappingError::MissingField(CONTENT_MANIFESTATION.into()))?;
        Ok(DataFile {
            id: parts.business_id,
            name: fields.text("name")?,
            parent_id: parts.parent_id,
            format: fields.opt_text("format")?,
            content,
        }
        .into())
    }
}
