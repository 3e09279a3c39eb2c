use vault_graph::Properties;
use vault_types::{BusinessObject, Collection, ObjectType};

use crate::error::{MappingError, ValidationError};
use crate::fields::{PropertiesReader, PropertiesWriter};
use crate::shape::{require, ObjectParts, ObjectShape};

pub struct CollectionShape;

impl ObjectShape for CollectionShape {
    const OBJECT_TYPE: ObjectType = ObjectType::Collection;

    fn validate_fields(object: &BusinessObject) -> Result<(), ValidationError> {
        let title = object.as_collection().map_or("", |c| c.title.as_str());
        require(Self::OBJECT_TYPE, "title", title)
    }

    fn properties(object: &BusinessObject) -> Properties {
        let Some(c) = object.as_collection() else {
            return Properties::new();
        };
        PropertiesWriter::new()
            .text("title", &c.title)
            .opt_text("summary", c.summary.as_ref())
            .list("creators", &c.creators)
            .list("alternate-ids", &c.alternate_ids)
            .finish()
    }

    fn assemble(parts: ObjectParts) -> Result<BusinessObject, MappingError> {
        let fields = PropertiesReader::new(&parts.properties);
        Ok(Collection {
            id: parts.business_id,
            title: fields.text("title")?,
            summary: fields.opt_text("summary")?,
            parent_id: parts.parent_id,
            creators: fields.list("creators")?,
            alternate_ids: fields.list("alternate-ids")?,
        }
        .into())
    }
}
