use vault_graph::Properties;
use vault_types::{BusinessId, BusinessObject, FileContent, ObjectType};

use crate::error::{MappingError, ValidationError};

/// Everything recovered from an archived fragment that a shape needs to
/// rebuild its business object.
#[derive(Clone, Debug, PartialEq)]
pub struct ObjectParts {
    pub business_id: BusinessId,
    pub parent_id: Option<BusinessId>,
    /// Title carried on the State DU.
    pub title: String,
    pub properties: Properties,
    pub content: Option<FileContent>,
}

/// Type-specific rules for one business-object type.
pub trait ObjectShape: Send + Sync + 'static {
    const OBJECT_TYPE: ObjectType;

    /// Technical-environment tags of the manifestations a conformant State
    /// DU must carry.
    const REQUIRED_MANIFESTATIONS: &'static [&'static str] = &[];

    /// Type-specific required-field checks. The id, parent, and variant
    /// checks common to every type run before this.
    fn validate_fields(object: &BusinessObject) -> Result<(), ValidationError>;

    /// Fields travelling in the State DU's properties file.
    fn properties(object: &BusinessObject) -> Properties;

    fn assemble(parts: ObjectParts) -> Result<BusinessObject, MappingError>;
}

/// Checks shared by every shape, then the shape's own.
pub(crate) fn validate<S: ObjectShape>(object: &BusinessObject) -> Result<(), ValidationError> {
    if object.object_type() != S::OBJECT_TYPE {
        return Err(ValidationError::WrongType {
            expected: S::OBJECT_TYPE,
            actual: object.object_type(),
        });
    }
    if object.id().is_blank() {
        return Err(ValidationError::BlankId);
    }
    match object.parent_id() {
        None if S::OBJECT_TYPE.requires_parent() => {
            return Err(ValidationError::MissingParent {
                object_type: S::OBJECT_TYPE,
                id: object.id().clone(),
            })
        }
        Some(parent) if parent == object.id() => {
            return Err(ValidationError::SelfParent {
                object_type: S::OBJECT_TYPE,
                id: object.id().clone(),
            })
        }
        _ => {}
    }
    S::validate_fields(object)
}

pub(crate) fn require(
    object_type: ObjectType,
    field: &'static str,
    value: &str,
) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::MissingField { object_type, field });
    }
    Ok(())
}
