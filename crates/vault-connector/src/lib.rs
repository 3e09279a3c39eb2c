//! Remote archive connector contracts.
//!
//! The vault talks to the remote archive only through two traits:
//!
//! - [`ArchiveConnector`] -- upload files, submit packages, run graph searches
//! - [`TicketResolver`] -- resolve the asynchronous ticket issued for a package
//!
//! [`AncestryQuery`] and [`ParentQuery`] are thin read-only traversal helpers
//! on top of [`ArchiveConnector::search`]. [`InMemoryArchive`] simulates a
//! remote store with delayed ticket resolution and fault injection.

pub mod error;
pub mod memory;
pub mod query;
pub mod traits;
pub mod traversal;

pub use error::{ConnectorError, ConnectorResult};
pub use memory::{FaultPlan, InMemoryArchive};
pub use query::{SearchQuery, SearchResults};
pub use traits::{ArchiveConnector, ResolvedTicket, TicketResolution, TicketResolver};
pub use traversal::{AncestryQuery, ParentQuery};
