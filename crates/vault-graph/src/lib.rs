//! Archive graph model for the vault.
//!
//! The remote archive stores an append-only graph of immutable entities:
//!
//! - [`DeliverableUnit`] -- a Root DU (head of a business object's lineage)
//!   or a State DU (one version of its content)
//! - [`Manifestation`] -- a technical rendition of a DU, referencing files
//! - [`FileEntity`] -- uploaded content or an embedded key/value properties file
//!
//! A [`Package`] is a fragment of that graph: the unit that gets submitted
//! in one deposit and the shape in which query results are reassembled.
//!
//! # Invariants
//!
//! - Entities are immutable once archived; a new version is a new State DU
//!   whose `predecessor` names the State DU it supersedes.
//! - Within one lineage, the latest version is the State DU that no other
//!   State DU names as its predecessor (see [`latest`]).

pub mod entity;
pub mod error;
pub mod latest;
pub mod package;
pub mod traverse;

pub use entity::{
    DeliverableUnit, DuRole, DuType, Entity, EntityKind, FileEntity, FileSource, Manifestation,
    ParentRef, ParentRelation, Properties,
};
pub use error::{GraphError, GraphResult};
pub use latest::{filter_latest, superseded_ids};
pub use package::Package;
pub use traverse::collect_ancestors;
