//! Version-graph mappers.
//!
//! A [`VersionGraphMapper`] turns one business object into an appendable
//! package fragment (a Root DU on first deposit, a new State DU chained to
//! its predecessor, a properties file, and any content manifestation), and
//! turns an archived fragment back into the business object.
//!
//! Reading a graph back is two-phase: [`VersionGraphMapper::conforms`] runs
//! the ordered shape checks and returns the [`CanonicalGraph`] naming the
//! Root DU, State DU, and manifestations; [`VersionGraphMapper::get`] then
//! extracts fields from exactly those nodes.
//!
//! One [`ShapeMapper`] exists per [`ObjectType`](vault_types::ObjectType),
//! parameterised by an [`ObjectShape`]. The [`MapperRegistry`] dispatches on
//! the stable DU type tag.

pub mod conformance;
pub mod error;
mod fields;
pub mod mapper;
pub mod registry;
pub mod searcher;
pub mod shape;
pub mod shapes;

pub use conformance::{CanonicalGraph, CONTENT_MANIFESTATION};
pub use error::{MappingError, NonConformance, SearchError, ValidationError};
pub use mapper::{Placement, ShapeMapper, VersionGraphMapper};
pub use registry::MapperRegistry;
pub use searcher::{BusinessObjectState, StateSearcher};
pub use shape::{ObjectParts, ObjectShape};
