use vault_graph::Properties;
use vault_types::{BusinessObject, MetadataFile, ObjectType};

use crate::conformance::CONTENT_MANIFESTATION;
use crate::error::{MappingError, ValidationError};
use crate::fields::{PropertiesReader, PropertiesWriter};
use crate::shape::{require, ObjectParts, ObjectShape};

pub struct MetadataFileShape;

impl ObjectShape for MetadataFileShape {
    const OBJECT_TYPE: ObjectType = ObjectType::MetadataFile;
    const REQUIRED_MANIFESTATIONS: &'static [&'static str] = &[CONTENT_MANIFESTATION];

    fn validate_fields(object: &BusinessObject) -> Result<(), ValidationError> {
        let BusinessObject::MetadataFile(m) = object else {
            return Ok(());
        };
        require(Self::OBJECT_TYPE, "name", &m.name)?;
        if m.content.is_empty() {
            return Err(ValidationError::MissingField {
                object_type: Self::OBJECT_TYPE,
                field: "content",
            });
        }
        Ok(())
    }

    fn properties(object: &BusinessObject) -> Properties {
        let BusinessObject::MetadataFile(m) = object else {
            return Properties::new();
        };
        PropertiesWriter::new()
            .text("name", &m.name)
            .opt_text("format", m.format.as_ref())
            .finish()
    }

    fn assemble(parts: ObjectParts) -> Result<BusinessObject, MappingError> {
        let fields = PropertiesReader::new(&parts.properties);
        let content = parts
            .content
            .ok_or_else(|| MappingError::MissingField(CONTENT_MANIFESTATION.into()))?;
        Ok(MetadataFile {
            id: parts.business_id,
            name: fields.text("name")?,
            parent_id: parts.parent_id,
            format: fields.opt_text("format")?,
            content,
        }
        .into())
    }
}
