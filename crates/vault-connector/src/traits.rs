use async_trait::async_trait;
use bytes::Bytes;

use vault_graph::Package;
use vault_types::{EntityId, TicketId, UploadHandle};

use crate::error::ConnectorResult;
use crate::query::{SearchQuery, SearchResults};

/// Outcome of a completed deposit ticket.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedTicket {
    pub successful: bool,
    /// Remote-reported reason when `successful` is false.
    pub reason: Option<String>,
    /// The top-most DU of the submitted fragment.
    pub root_entity: Option<EntityId>,
    /// Every entity of the submitted fragment.
    pub entities: Package,
}

/// Answer to a ticket lookup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TicketResolution {
    /// The archive has not finished processing the package.
    Unresolved,
    Resolved(ResolvedTicket),
}

/// Connection to the remote archive.
#[async_trait]
pub trait ArchiveConnector: Send + Sync {
    /// Upload one file's bytes, returning the handle a package file entity
    /// must reference.
    async fn upload_file(&self, data: Bytes, size_hint: Option<u64>) -> ConnectorResult<UploadHandle>;

    /// Submit a package fragment for asynchronous ingest.
    async fn deposit_package(&self, package: &Package) -> ConnectorResult<TicketId>;

    /// Run a graph search against archived (visible) entities.
    async fn search(&self, query: &SearchQuery) -> ConnectorResult<SearchResults>;
}

/// Resolves deposit tickets issued by [`ArchiveConnector::deposit_package`].
#[async_trait]
pub trait TicketResolver: Send + Sync {
    async fn resolve(&self, ticket: &TicketId) -> ConnectorResult<TicketResolution>;
}
