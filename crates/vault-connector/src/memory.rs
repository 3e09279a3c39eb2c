use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::debug;

use vault_graph::{collect_ancestors, Entity, Package};
use vault_types::{EntityId, TicketId, UploadHandle};

use crate::error::{ConnectorError, ConnectorResult};
use crate::query::{SearchQuery, SearchResults};
use crate::traits::{ArchiveConnector, ResolvedTicket, TicketResolution, TicketResolver};

/// Faults the simulator injects into subsequent calls.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FaultPlan {
    /// Every call fails with a transport error.
    pub offline: bool,
    /// Deposits are refused as a client fault with this reason.
    pub reject_deposits: Option<String>,
    /// Uploads are refused as a client fault.
    pub reject_uploads: bool,
    /// Tickets issued from now on resolve as unsuccessful with this reason.
    pub fail_tickets: Option<String>,
    /// Tickets issued from now on resolve without naming a root entity.
    pub omit_root_entity: bool,
}

struct TicketState {
    package: Package,
    checks: u32,
    failure: Option<String>,
    omit_root: bool,
    resolution: Option<ResolvedTicket>,
}

#[derive(Default)]
struct ArchiveState {
    entities: BTreeMap<EntityId, Entity>,
    uploads: HashMap<UploadHandle, Bytes>,
    tickets: HashMap<TicketId, TicketState>,
}

/// In-memory simulation of a remote archive.
///
/// Submitted packages are held against their ticket and only become
/// visible to searches once the ticket resolves. A ticket resolves on the
/// `resolve_after + 1`-th resolution check. Entities are immutable: a
/// package that would overwrite an archived entity resolves as failed.
pub struct InMemoryArchive {
    state: RwLock<ArchiveState>,
    faults: RwLock<FaultPlan>,
    resolve_after: u32,
}

impl InMemoryArchive {
    /// An archive that resolves tickets on the first check.
    pub fn new() -> Self {
        Self::with_resolve_after(0)
    }

    /// An archive that answers `Unresolved` to the first `checks` resolution
    /// checks of every ticket.
    pub fn with_resolve_after(checks: u32) -> Self {
        Self {
            state: RwLock::new(ArchiveState::default()),
            faults: RwLock::new(FaultPlan::default()),
            resolve_after: checks,
        }
    }

    pub fn set_faults(&self, plan: FaultPlan) {
        *self.faults.write().expect("fault plan lock poisoned") = plan;
    }

    pub fn faults(&self) -> FaultPlan {
        self.faults.read().expect("fault plan lock poisoned").clone()
    }

    /// Make an already-issued, still unresolved ticket fail with `reason`.
    pub fn fail_ticket(&self, ticket: &TicketId, reason: impl Into<String>) -> ConnectorResult<()> {
        let mut state = self.state.write().expect("archive lock poisoned");
        let entry = state
            .tickets
            .get_mut(ticket)
            .ok_or_else(|| ConnectorError::NotFound(ticket.to_string()))?;
        entry.failure = Some(reason.into());
        Ok(())
    }

    /// Resolve every outstanding ticket immediately.
    pub fn complete_all(&self) {
        let mut state = self.state.write().expect("archive lock poisoned");
        let pending: Vec<TicketId> = state
            .tickets
            .iter()
            .filter(|(_, t)| t.resolution.is_none())
            .map(|(id, _)| id.clone())
            .collect();
        for ticket in pending {
            Self::finish(&mut state, &ticket);
        }
    }

    /// Number of archived (visible) entities.
    pub fn entity_count(&self) -> usize {
        self.state.read().expect("archive lock poisoned").entities.len()
    }

    /// Number of tickets not yet resolved.
    pub fn pending_tickets(&self) -> usize {
        self.state
            .read()
            .expect("archive lock poisoned")
            .tickets
            .values()
            .filter(|t| t.resolution.is_none())
            .count()
    }

    /// A visible entity, if archived.
    pub fn entity(&self, id: &EntityId) -> Option<Entity> {
        self.state
            .read()
            .expect("archive lock poisoned")
            .entities
            .get(id)
            .cloned()
    }

    /// Bytes stored under an upload handle.
    pub fn upload(&self, handle: &UploadHandle) -> Option<Bytes> {
        self.state
            .read()
            .expect("archive lock poisoned")
            .uploads
            .get(handle)
            .cloned()
    }

    fn ensure_online(&self) -> ConnectorResult<()> {
        if self.faults.read().expect("fault plan lock poisoned").offline {
            return Err(ConnectorError::Transport("archive unreachable".into()));
        }
        Ok(())
    }

    /// Structural checks a real archive applies on submission.
    fn validate_package(state: &ArchiveState, package: &Package) -> ConnectorResult<()> {
        if package.is_empty() {
            return Err(ConnectorError::ClientFault("empty package".into()));
        }
        for file in package.files() {
            if file.is_staged() {
                return Err(ConnectorError::ClientFault(format!(
                    "file {} was not uploaded",
                    file.id
                )));
            }
            if let Some(handle) = file.upload_handle() {
                if !state.uploads.contains_key(handle) {
                    return Err(ConnectorError::ClientFault(format!(
                        "file {} references unknown upload {handle}",
                        file.id
                    )));
                }
            }
        }
        let dangling = package.dangling_references(|id| state.entities.contains_key(id));
        if let Some(first) = dangling.into_iter().next() {
            return Err(ConnectorError::ClientFault(first.to_string()));
        }
        Ok(())
    }

    /// Top-most DU of a fragment: prefer a Root DU, else any DU whose links
    /// leave the fragment.
    fn top_entity(package: &Package) -> Option<EntityId> {
        let tops: Vec<_> = package
            .deliverable_units()
            .filter(|du| du.parents.iter().all(|p| !package.contains(&p.target)))
            .collect();
        tops.iter()
            .find(|du| du.is_root())
            .or_else(|| tops.first())
            .map(|du| du.id.clone())
    }

    /// Commit or fail a ticket and cache its resolution.
    fn finish(state: &mut ArchiveState, ticket: &TicketId) -> Option<ResolvedTicket> {
        let entry = state.tickets.get(ticket)?;
        let package = entry.package.clone();
        let root_entity = if entry.omit_root {
            None
        } else {
            Self::top_entity(&package)
        };
        let mut failure = entry.failure.clone();
        if failure.is_none() {
            if let Some(existing) = package.ids().find(|id| state.entities.contains_key(*id)) {
                failure = Some(format!("entity {existing} is already archived"));
            }
        }

        let resolution = match failure {
            Some(reason) => ResolvedTicket {
                successful: false,
                reason: Some(reason),
                root_entity,
                entities: package,
            },
            None => {
                for entity in package.iter() {
                    state.entities.insert(entity.id().clone(), entity.clone());
                }
                ResolvedTicket {
                    successful: true,
                    reason: None,
                    root_entity,
                    entities: package,
                }
            }
        };
        debug!(ticket = %ticket, successful = resolution.successful, "ticket resolved");
        if let Some(entry) = state.tickets.get_mut(ticket) {
            entry.resolution = Some(resolution.clone());
        }
        Some(resolution)
    }
}

impl Default for InMemoryArchive {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ArchiveConnector for InMemoryArchive {
    async fn upload_file(&self, data: Bytes, size_hint: Option<u64>) -> ConnectorResult<UploadHandle> {
        self.ensure_online()?;
        if self.faults().reject_uploads {
            return Err(ConnectorError::ClientFault("upload refused".into()));
        }
        if let Some(hint) = size_hint {
            if hint != data.len() as u64 {
                return Err(ConnectorError::ClientFault(format!(
                    "size hint {hint} does not match {} uploaded bytes",
                    data.len()
                )));
            }
        }
        let handle = UploadHandle(format!("upload:{}", uuid::Uuid::new_v4().simple()));
        debug!(handle = %handle, bytes = data.len(), "file uploaded");
        self.state
            .write()
            .expect("archive lock poisoned")
            .uploads
            .insert(handle.clone(), data);
        Ok(handle)
    }

    async fn deposit_package(&self, package: &Package) -> ConnectorResult<TicketId> {
        self.ensure_online()?;
        let faults = self.faults();
        if let Some(reason) = faults.reject_deposits {
            return Err(ConnectorError::ClientFault(reason));
        }

        let mut state = self.state.write().expect("archive lock poisoned");
        Self::validate_package(&state, package)?;

        let ticket = TicketId(format!("ticket:{}", uuid::Uuid::new_v4().simple()));
        state.tickets.insert(
            ticket.clone(),
            TicketState {
                package: package.clone(),
                checks: 0,
                failure: faults.fail_tickets,
                omit_root: faults.omit_root_entity,
                resolution: None,
            },
        );
        debug!(ticket = %ticket, entities = package.len(), "package accepted");
        Ok(ticket)
    }

    async fn search(&self, query: &SearchQuery) -> ConnectorResult<SearchResults> {
        self.ensure_online()?;
        let state = self.state.read().expect("archive lock poisoned");
        let entities: Vec<Entity> = match query {
            SearchQuery::Identity(id) => state.entities.get(id).cloned().into_iter().collect(),
            SearchQuery::Ancestors { of, recursive } => {
                collect_ancestors(of, *recursive, |id| state.entities.get(id))
                    .into_iter()
                    .cloned()
                    .collect()
            }
            SearchQuery::ParentsOf { of, kind } => state
                .entities
                .values()
                .filter(|e| kind.map_or(true, |k| e.kind() == k))
                .filter(|e| e.id() != of && e.refers_to(of))
                .cloned()
                .collect(),
            SearchQuery::FormerRef(reference) => state
                .entities
                .values()
                .filter(|e| {
                    e.as_du()
                        .is_some_and(|du| du.former_refs.contains(reference))
                })
                .cloned()
                .collect(),
        };
        debug!(query = %query, matches = entities.len(), "search");
        Ok(SearchResults::new(entities))
    }
}

#[async_trait]
impl TicketResolver for InMemoryArchive {
    async fn resolve(&self, ticket: &TicketId) -> ConnectorResult<TicketResolution> {
        self.ensure_online()?;
        let mut state = self.state.write().expect("archive lock poisoned");
        let entry = state
            .tickets
            .get_mut(ticket)
            .ok_or_else(|| ConnectorError::NotFound(ticket.to_string()))?;

        if let Some(done) = &entry.resolution {
            return Ok(TicketResolution::Resolved(done.clone()));
        }
        if entry.checks < self.resolve_after {
            entry.checks += 1;
            return Ok(TicketResolution::Unresolved);
        }
        Ok(Self::finish(&mut state, ticket)
            .map(TicketResolution::Resolved)
            .unwrap_or(TicketResolution::Unresolved))
    }
}
