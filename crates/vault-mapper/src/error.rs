use vault_connector::ConnectorError;
use vault_graph::GraphError;
use vault_types::{BusinessId, EntityId, ObjectType};

/// A business object is missing required fields.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("business id is blank")]
    BlankId,

    #[error("{object_type} requires a non-empty {field}")]
    MissingField {
        object_type: ObjectType,
        field: &'static str,
    },

    #[error("{object_type} {id} requires a parent")]
    MissingParent { object_type: ObjectType, id: BusinessId },

    #[error("{object_type} {id} cannot be its own parent")]
    SelfParent { object_type: ObjectType, id: BusinessId },

    #[error("expected a {expected}, got a {actual}")]
    WrongType {
        expected: ObjectType,
        actual: ObjectType,
    },
}

/// A package fragment failed one of the ordered shape checks.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NonConformance {
    #[error("no {0} root DU in package")]
    NoRootDu(ObjectType),

    #[error("no {0} state DU attached to a root DU")]
    NoStateDu(ObjectType),

    #[error("several current state DUs: {0:?}")]
    AmbiguousState(Vec<EntityId>),

    #[error("root and state DU share id {0}")]
    SharedRootAndState(EntityId),

    #[error("state DU {state} references {count} parent objects")]
    MultipleParents { state: EntityId, count: usize },

    #[error("missing {0} manifestation")]
    MissingManifestation(String),

    #[error("manifestation {manifestation} references unresolvable file {file}")]
    UnresolvableFile {
        manifestation: EntityId,
        file: EntityId,
    },
}

/// A package fragment could not be built or parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MappingError {
    #[error("invalid business object: {0}")]
    Validation(#[from] ValidationError),

    #[error("non-conformant graph: {0}")]
    NonConformant(#[from] NonConformance),

    #[error("graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("missing metadata field {0}")]
    MissingField(String),

    #[error("invalid metadata field {field}: {reason}")]
    InvalidField { field: String, reason: String },

    #[error("root DU {0} carries no business id")]
    MissingBusinessId(EntityId),

    #[error("unresolvable reference {0}")]
    UnresolvableReference(EntityId),

    #[error("no mapper registered for {0}")]
    NoMapper(String),

    #[error("archive lookup failed: {0}")]
    Connector(#[from] ConnectorError),
}

/// Current-state lookup failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SearchError {
    #[error("archive search failed: {0}")]
    Connector(#[from] ConnectorError),

    #[error("{object_type} {business_id} has {count} root DUs")]
    MultipleRoots {
        business_id: BusinessId,
        object_type: ObjectType,
        count: usize,
    },

    #[error("root DU {0} has no state DU")]
    EmptyLineage(EntityId),

    #[error("lineage of root DU {root} has several current states: {candidates:?}")]
    AmbiguousState {
        root: EntityId,
        candidates: Vec<EntityId>,
    },
}
