use vault_graph::Properties;
use vault_types::{BusinessObject, DataItem, ObjectType};

use crate::error::{MappingError, ValidationError};
use crate::fields::{PropertiesReader, PropertiesWriter};
use crate::shape::{require, ObjectParts, ObjectShape};

pub struct DataItemShape;

impl ObjectShape for DataItemShape {
    const OBJECT_TYPE: ObjectType = ObjectType::DataItem;

    fn validate_fields(object: &BusinessObject) -> Result<(), ValidationError> {
        let name = object.as_data_item().map_or("", |d| d.name.as_str());
        require(Self::OBJECT_TYPE, "name", name)
    }

    fn properties(object: &BusinessObject) -> Properties {
        let Some(d) = object.as_data_item() else {
            return Properties::new();
        };
        PropertiesWriter::new()
            .text("name", &d.name)
            .opt_text("description", d.description.as_ref())
            .opt_text("depositor", d.depositor.as_ref())
            .finish()
    }

    fn assemble(parts: ObjectParts) -> Result<BusinessObject, MappingError> {
        let fields = PropertiesReader::new(&parts.properties);
        Ok(DataItem {
            id: parts.business_id,
            name: fields.text("name")?,
            description: fields.opt_text("description")?,
            parent_id: parts.parent_id,
            depositor: fields.opt_text("depositor")?,
        }
        .into())
    }
}
