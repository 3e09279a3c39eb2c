//! Foundation types for the archive vault.
//!
//! Every other vault crate depends on `vault-types`. It defines the
//! caller-facing business objects, the local deposit record that tracks one
//! submission attempt, and the identifiers used on both sides of the archive
//! boundary.
//!
//! # Key Types
//!
//! - [`BusinessId`] — Stable, caller-supplied identity of a business object
//! - [`DepositId`] — UUID v7 identifier of one deposit attempt
//! - [`EntityId`] — Archive-side identifier of a DU, manifestation, or file
//! - [`ObjectType`] — Fixed tag table of archivable object types
//! - [`BusinessObject`] — Tagged union over the five object types
//! - [`DepositRecord`] — Audit row for one deposit attempt

pub mod business;
pub mod error;
pub mod ids;
pub mod object;
pub mod record;

pub use business::{
    BusinessObject, Collection, DataFile, DataItem, FileContent, MetadataFile, RegistryEntry,
};
pub use error::TypeError;
pub use ids::{derive_id, BusinessId, DepositId, EntityId, TicketId, UploadHandle};
pub use object::ObjectType;
pub use record::{DepositRecord, DepositStatus};
