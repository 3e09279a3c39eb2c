//! The caller-facing deposit, wait, and retrieval operations.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use vault_connector::{AncestryQuery, ArchiveConnector, ParentQuery, TicketResolver};
use vault_graph::{Entity, EntityKind, FileSource, Package};
use vault_mapper::{MapperRegistry, MappingError, Placement, StateSearcher};
use vault_records::{DepositRecordStore, InMemoryRecordStore, JournalRecordStore};
use vault_types::{
    BusinessId, BusinessObject, DataFile, DataItem, DepositId, DepositRecord, DepositStatus,
    EntityId, ObjectType,
};

use crate::background::{self, ReconcilerHandle};
use crate::config::ArchiveConfig;
use crate::error::{
    ArchiveError, ArchiveResult, ReconciliationError, ReconstructionError, SubmissionError,
};
use crate::locks::{KeyedLocks, ObjectGuard};
use crate::page::paginate;
use crate::reconciler::{DepositReconciler, PollSummary, ReconcileOutcome};

/// Deposits business objects as versioned archive graphs and reads them back.
///
/// Every read-modify-write of one business object's deposit state runs
/// under that object's entry in [`KeyedLocks`]; distinct objects never
/// contend.
pub struct ArchiveOrchestrator {
    records: Arc<dyn DepositRecordStore>,
    connector: Arc<dyn ArchiveConnector>,
    reconciler: DepositReconciler,
    registry: MapperRegistry,
    locks: KeyedLocks,
    config: ArchiveConfig,
    stop: Arc<watch::Sender<bool>>,
}

impl ArchiveOrchestrator {
    pub fn new(
        connector: Arc<dyn ArchiveConnector>,
        resolver: Arc<dyn TicketResolver>,
        records: Arc<dyn DepositRecordStore>,
        config: ArchiveConfig,
    ) -> ArchiveResult<Self> {
        Self::with_registry(connector, resolver, records, config, MapperRegistry::standard())
    }

    pub fn with_registry(
        connector: Arc<dyn ArchiveConnector>,
        resolver: Arc<dyn TicketResolver>,
        records: Arc<dyn DepositRecordStore>,
        config: ArchiveConfig,
        registry: MapperRegistry,
    ) -> ArchiveResult<Self> {
        config.validate()?;
        let reconciler =
            DepositReconciler::new(Arc::clone(&records), Arc::clone(&connector), resolver);
        let (stop, _) = watch::channel(false);
        Ok(Self {
            records,
            connector,
            reconciler,
            registry,
            locks: KeyedLocks::new(),
            config,
            stop: Arc::new(stop),
        })
    }

    /// Build an orchestrator whose record store follows `config`: a journal
    /// at `journal_path` if set, memory otherwise.
    pub fn from_config(
        connector: Arc<dyn ArchiveConnector>,
        resolver: Arc<dyn TicketResolver>,
        config: ArchiveConfig,
    ) -> ArchiveResult<Self> {
        let records: Arc<dyn DepositRecordStore> = match &config.journal_path {
            Some(path) => Arc::new(JournalRecordStore::open(path, config.journal_sync)?),
            None => Arc::new(InMemoryRecordStore::new()),
        };
        Self::new(connector, resolver, records, config)
    }

    pub fn config(&self) -> &ArchiveConfig {
        &self.config
    }

    pub fn records(&self) -> &Arc<dyn DepositRecordStore> {
        &self.records
    }

    pub fn registry(&self) -> &MapperRegistry {
        &self.registry
    }

    // ------------------------------------------------------------------
    // Deposit
    // ------------------------------------------------------------------

    /// Submit a new version of `object` and record it PENDING.
    ///
    /// `parent_deposit_id` links the record to the deposit of an owning
    /// object (a DataFile to its DataItem); it is stored, not checked.
    pub async fn deposit(
        &self,
        parent_deposit_id: Option<DepositId>,
        object: &BusinessObject,
    ) -> ArchiveResult<DepositId> {
        self.registry.for_object(object)?.validate(object)?;
        let guard = self.locks.lock(object.id()).await;
        self.deposit_guarded(&guard, parent_deposit_id, object).await
    }

    /// [`deposit`](Self::deposit), then wait until the record is terminal.
    pub async fn deposit_and_await(
        &self,
        parent_deposit_id: Option<DepositId>,
        object: &BusinessObject,
    ) -> ArchiveResult<DepositId> {
        let deposit_id = self.deposit(parent_deposit_id, object).await?;
        self.await_deposit(deposit_id, object.id(), None).await?;
        Ok(deposit_id)
    }

    /// Deposit a DataItem, wait for it, then deposit each of its files
    /// linked to the item's deposit. The locks of the item and of every
    /// file are held throughout.
    ///
    /// Returns the item's deposit id followed by one id per file.
    pub async fn deposit_item_with_files(
        &self,
        parent_deposit_id: Option<DepositId>,
        item: DataItem,
        files: Vec<DataFile>,
    ) -> ArchiveResult<Vec<DepositId>> {
        let item_id = item.id.clone();
        let files: Vec<BusinessObject> = files
            .into_iter()
            .map(|file| file.with_parent(item_id.clone()).into())
            .collect();
        let item: BusinessObject = item.into();

        self.registry.for_object(&item)?.validate(&item)?;
        for file in &files {
            self.registry.for_object(file)?.validate(file)?;
        }

        // The item and its files are locked together in id order.
        let guard = self
            .locks
            .lock_all(std::iter::once(&item_id).chain(files.iter().map(BusinessObject::id)))
            .await;
        let item_deposit = self.deposit_guarded(&guard, parent_deposit_id, &item).await?;
        self.await_deposit(item_deposit, &item_id, Some(&guard)).await?;

        let mut ids = Vec::with_capacity(files.len() + 1);
        ids.push(item_deposit);
        for file in &files {
            ids.push(self.deposit_guarded(&guard, Some(item_deposit), file).await?);
        }
        drop(guard);
        Ok(ids)
    }

    async fn deposit_guarded(
        &self,
        guard: &ObjectGuard,
        parent_deposit_id: Option<DepositId>,
        object: &BusinessObject,
    ) -> ArchiveResult<DepositId> {
        let business_id = object.id();
        debug_assert!(guard.covers(business_id));
        let mapper = self.registry.for_object(object)?;

        self.settle_pending(guard, business_id).await?;

        let searcher = StateSearcher::new(self.connector.as_ref());
        let parent_root = match object.parent_id() {
            Some(parent) => {
                let found = searcher
                    .current_state_any(parent, object.object_type().parent_types())
                    .await
                    .map_err(SubmissionError::from)?;
                match found {
                    Some(state) => Some(state.root.id),
                    None => {
                        return Err(SubmissionError::ParentNotArchived {
                            business_id: business_id.clone(),
                            parent: parent.clone(),
                        }
                        .into())
                    }
                }
            }
            None => None,
        };
        let prior = searcher
            .current_state(business_id, object.object_type())
            .await
            .map_err(SubmissionError::from)?;

        let placement = Placement { parent_root, prior };
        let mut package = mapper.to_package(object, &placement)?;
        mapper
            .conforms(&package)
            .map_err(MappingError::from)?;

        if let Some(prior) = &placement.prior {
            // The archived root is immutable; the new state references it by id.
            package.remove(&prior.root.id);
            debug!(
                business_id = %business_id,
                root = %prior.root.id,
                predecessor = %prior.state.id,
                "version update"
            );
        }

        self.upload_staged(&mut package).await?;

        let ticket = self
            .connector
            .deposit_package(&package)
            .await
            .map_err(SubmissionError::Rejected)?;

        let record = DepositRecord::pending(
            DepositId::new(),
            business_id.clone(),
            parent_deposit_id,
            object.object_type(),
            ticket,
        );
        self.records.add(&record)?;
        info!(
            deposit_id = %record.deposit_id,
            business_id = %business_id,
            object_type = %record.object_type,
            "deposit PENDING"
        );
        Ok(record.deposit_id)
    }

    /// Reconcile earlier attempts for the object before building on its
    /// lineage. A still-pending attempt blocks the new deposit; a record
    /// that cannot be reconciled stays PENDING for the operator and does not.
    async fn settle_pending(&self, guard: &ObjectGuard, business_id: &BusinessId) -> ArchiveResult<()> {
        let pending = self
            .records
            .list_for_object(business_id, Some(DepositStatus::Pending))?;
        for record in pending {
            let in_flight = match self.reconcile_guarded(guard, &record).await {
                Ok(outcome) => outcome == ReconcileOutcome::StillPending,
                Err(ArchiveError::Reconciliation(ReconciliationError::Ticket(err)))
                    if err.is_transient() =>
                {
                    true
                }
                Err(ArchiveError::Reconciliation(err)) => {
                    warn!(
                        deposit_id = %record.deposit_id,
                        business_id = %business_id,
                        error = %err,
                        "unreconcilable deposit left PENDING"
                    );
                    false
                }
                Err(err) => return Err(err),
            };
            if in_flight {
                return Err(SubmissionError::DepositInFlight {
                    business_id: business_id.clone(),
                    deposit_id: record.deposit_id,
                }
                .into());
            }
        }
        Ok(())
    }

    async fn upload_staged(&self, package: &mut Package) -> ArchiveResult<()> {
        let staged: Vec<(EntityId, Vec<u8>)> = package
            .files_mut()
            .filter_map(|file| match &mut file.source {
                FileSource::Staged(bytes) => Some((file.id.clone(), std::mem::take(bytes))),
                _ => None,
            })
            .collect();
        if staged.is_empty() {
            return Ok(());
        }

        let mut handles = HashMap::with_capacity(staged.len());
        for (id, bytes) in staged {
            let size = bytes.len() as u64;
            let handle = self
                .connector
                .upload_file(Bytes::from(bytes), Some(size))
                .await
                .map_err(|source| SubmissionError::Upload {
                    file: id.clone(),
                    source,
                })?;
            debug!(file = %id, handle = %handle, size, "file uploaded");
            handles.insert(id, handle);
        }
        for file in package.files_mut() {
            if let Some(handle) = handles.remove(&file.id) {
                file.source = FileSource::Uploaded(handle);
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Waiting
    // ------------------------------------------------------------------

    /// Wait with bounded backoff until `deposit_id` is terminal, running one
    /// reconciliation step per round. `held` is the object's guard when the
    /// caller already owns it.
    async fn await_deposit(
        &self,
        deposit_id: DepositId,
        business_id: &BusinessId,
        held: Option<&ObjectGuard>,
    ) -> ArchiveResult<()> {
        let started = Instant::now();
        let mut stop = self.stop.subscribe();
        let mut delays = self.config.wait.delays();

        loop {
            if *stop.borrow() {
                return Err(SubmissionError::Interrupted { deposit_id }.into());
            }

            match self.step(deposit_id, business_id, held).await? {
                Some(record) if record.status == DepositStatus::Deposited => return Ok(()),
                Some(record) if record.status == DepositStatus::Failed => {
                    return Err(SubmissionError::Failed {
                        deposit_id,
                        reason: record
                            .status_reason
                            .unwrap_or_else(|| "no reason reported".to_string()),
                    }
                    .into())
                }
                _ => {}
            }

            let Some(delay) = delays.next() else {
                return Err(SubmissionError::Timeout {
                    deposit_id,
                    elapsed: started.elapsed(),
                }
                .into());
            };
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = stop.changed() => {
                    return Err(SubmissionError::Interrupted { deposit_id }.into());
                }
            }
        }
    }

    /// One reconciliation round for the wait loop. Transient connector
    /// faults count as "still pending".
    async fn step(
        &self,
        deposit_id: DepositId,
        business_id: &BusinessId,
        held: Option<&ObjectGuard>,
    ) -> ArchiveResult<Option<DepositRecord>> {
        let owned;
        let guard = match held {
            Some(guard) => guard,
            None => {
                owned = self.locks.lock(business_id).await;
                &owned
            }
        };
        let Some(record) = self.records.lookup(&deposit_id)? else {
            return Ok(None);
        };
        match self.reconcile_guarded(guard, &record).await {
            Ok(_) => Ok(self.records.lookup(&deposit_id)?),
            Err(ArchiveError::Reconciliation(ReconciliationError::Ticket(err)))
                if err.is_transient() =>
            {
                debug!(deposit_id = %deposit_id, error = %err, "ticket check failed; retrying");
                Ok(Some(record))
            }
            Err(err) => Err(err),
        }
    }

    async fn reconcile_guarded(
        &self,
        guard: &ObjectGuard,
        record: &DepositRecord,
    ) -> ArchiveResult<ReconcileOutcome> {
        debug_assert!(guard.covers(&record.business_id));
        self.reconciler.reconcile(record).await
    }

    // ------------------------------------------------------------------
    // Reconciliation
    // ------------------------------------------------------------------

    /// Run one reconciliation step for every PENDING record.
    ///
    /// Per-record failures are logged and counted; only record-store
    /// failures abort the pass. Objects whose lock is held elsewhere are
    /// skipped and picked up by a later pass.
    pub async fn poll_once(&self) -> ArchiveResult<PollSummary> {
        let pending = self.records.list(None, Some(DepositStatus::Pending))?;
        let mut summary = PollSummary::default();

        for record in pending {
            summary.examined += 1;
            let Some(guard) = self.locks.try_lock(&record.business_id) else {
                summary.busy += 1;
                continue;
            };
            // Re-read under the lock; a concurrent wait may have settled it.
            let Some(current) = self.records.lookup(&record.deposit_id)? else {
                continue;
            };
            match self.reconcile_guarded(&guard, &current).await {
                Ok(outcome) => summary.record(outcome),
                Err(err @ ArchiveError::Records(_)) => return Err(err),
                Err(err) => {
                    summary.errored += 1;
                    warn!(
                        deposit_id = %record.deposit_id,
                        business_id = %record.business_id,
                        error = %err,
                        "reconciliation failed; record stays PENDING"
                    );
                }
            }
        }

        if summary.examined > 0 {
            debug!(
                examined = summary.examined,
                deposited = summary.deposited,
                failed = summary.failed,
                still_pending = summary.still_pending,
                busy = summary.busy,
                errored = summary.errored,
                "poll pass complete"
            );
        }
        Ok(summary)
    }

    /// Start the background reconciliation loop, unless the configured
    /// interval is zero.
    pub fn spawn_reconciler(self: &Arc<Self>) -> Option<ReconcilerHandle> {
        let interval = self.config.poll_interval()?;
        Some(background::spawn(
            Arc::clone(self),
            interval,
            Arc::clone(&self.stop),
        ))
    }

    /// Signal the background loop and every in-progress wait to stop.
    pub fn stop(&self) {
        self.stop.send_replace(true);
    }

    pub fn is_stopped(&self) -> bool {
        *self.stop.borrow()
    }

    // ------------------------------------------------------------------
    // Retrieval
    // ------------------------------------------------------------------

    /// The archived version recorded by `deposit_id`, or `None` if no such
    /// deposit exists.
    pub async fn retrieve(&self, deposit_id: &DepositId) -> ArchiveResult<Option<BusinessObject>> {
        let Some(record) = self.records.lookup(deposit_id)? else {
            return Ok(None);
        };
        let state_id = deposited_state(&record)?;
        self.reconstruct(record.object_type, state_id).await.map(Some)
    }

    /// The latest archived version of `business_id`, without a deposit id.
    pub async fn retrieve_current(
        &self,
        business_id: &BusinessId,
        object_type: ObjectType,
    ) -> ArchiveResult<Option<BusinessObject>> {
        let current = StateSearcher::new(self.connector.as_ref())
            .current_state(business_id, object_type)
            .await
            .map_err(ReconstructionError::from)?;
        match current {
            Some(current) => self
                .reconstruct(object_type, &current.state.id)
                .await
                .map(Some),
            None => Ok(None),
        }
    }

    /// Current children of the object archived by `deposit_id`, sorted by
    /// `compare`, then paged by `offset` and `limit` (`limit <= 0` means
    /// no limit).
    pub async fn list_children<F>(
        &self,
        deposit_id: &DepositId,
        compare: F,
        limit: i64,
        offset: usize,
    ) -> ArchiveResult<Vec<BusinessObject>>
    where
        F: FnMut(&BusinessObject, &BusinessObject) -> Ordering,
    {
        let Some(record) = self.records.lookup(deposit_id)? else {
            return Ok(Vec::new());
        };
        deposited_state(&record)?;
        let archive_id = record
            .archive_id
            .as_ref()
            .ok_or(ReconstructionError::IncompleteRecord(record.deposit_id))?;

        let states = StateSearcher::new(self.connector.as_ref())
            .current_children(archive_id)
            .await
            .map_err(ReconstructionError::from)?;
        let mut children = Vec::with_capacity(states.len());
        for state in &states {
            children.push(self.reconstruct(state.object_type(), &state.id).await?);
        }
        children.sort_by(compare);
        Ok(paginate(children, limit, offset))
    }

    /// Rebuild the object whose version is `state_id` from the archive.
    async fn reconstruct(
        &self,
        object_type: ObjectType,
        state_id: &EntityId,
    ) -> ArchiveResult<BusinessObject> {
        let connector = self.connector.as_ref();
        let ancestry = AncestryQuery::new(connector);

        let state = ancestry
            .identity(state_id)
            .await
            .map_err(ReconstructionError::from)?
            .ok_or_else(|| ReconstructionError::MissingState(state_id.clone()))?;
        let ancestors = ancestry
            .ancestors_of(state_id, true)
            .await
            .map_err(ReconstructionError::from)?;
        if ancestors.is_empty() {
            return Err(ReconstructionError::EmptyAncestry(state_id.clone()).into());
        }

        let mut package: Package = ancestors.into_iter().collect();
        package.upsert(state);

        let manifestations = ParentQuery::new(connector)
            .parents_of(state_id, EntityKind::Manifestation)
            .await
            .map_err(ReconstructionError::from)?;
        for manifestation in manifestations {
            let files = ancestry
                .ancestors_of(manifestation.id(), false)
                .await
                .map_err(ReconstructionError::from)?;
            package.upsert(manifestation);
            files
                .into_iter()
                .filter(|entity| matches!(entity, Entity::File(_)))
                .for_each(|file| package.upsert(file));
        }

        let mapper = self.registry.get(object_type)?;
        let object = mapper
            .from_package(&package, connector)
            .await
            .map_err(ReconstructionError::from)?;
        debug!(
            state = %state_id,
            business_id = %object.id(),
            entities = package.len(),
            "object reconstructed"
        );
        Ok(object)
    }

    // ------------------------------------------------------------------
    // Record queries
    // ------------------------------------------------------------------

    pub fn get_status(&self, deposit_id: &DepositId) -> ArchiveResult<Option<DepositStatus>> {
        Ok(self.records.lookup(deposit_id)?.map(|record| record.status))
    }

    pub fn get_record(&self, deposit_id: &DepositId) -> ArchiveResult<Option<DepositRecord>> {
        Ok(self.records.lookup(deposit_id)?)
    }

    /// Deposit ids of `object_type` in `status`, in deposit order.
    pub fn list_by_status(
        &self,
        object_type: ObjectType,
        status: DepositStatus,
    ) -> ArchiveResult<Vec<DepositId>> {
        Ok(self
            .records
            .list(Some(object_type), Some(status))?
            .into_iter()
            .map(|record| record.deposit_id)
            .collect())
    }

    /// Every deposit attempt for `business_id`, oldest first.
    pub fn history(&self, business_id: &BusinessId) -> ArchiveResult<Vec<DepositRecord>> {
        Ok(self.records.list_for_object(business_id, None)?)
    }

    /// Deposits recorded with `parent` as their parent deposit.
    pub fn child_deposits(&self, parent: &DepositId) -> ArchiveResult<Vec<DepositRecord>> {
        Ok(self.records.lookup_children(parent)?)
    }
}

/// The state DU of a DEPOSITED record.
fn deposited_state(record: &DepositRecord) -> Result<&EntityId, ReconstructionError> {
    if record.status != DepositStatus::Deposited {
        return Err(ReconstructionError::NotDeposited {
            deposit_id: record.deposit_id,
            status: record.status,
        });
    }
    record
        .state_id
        .as_ref()
        .ok_or(ReconstructionError::IncompleteRecord(record.deposit_id))
}

#[cfg(test)]
mod tests {
    use vault_connector::{FaultPlan, InMemoryArchive};
    use vault_mapper::ValidationError;
    use vault_types::Collection;

    use super::*;
    use crate::wait::WaitPolicy;

    fn orchestrator(archive: &Arc<InMemoryArchive>) -> ArchiveOrchestrator {
        let config = ArchiveConfig {
            poll_interval_ms: 0,
            wait: WaitPolicy {
                initial_ms: 10,
                factor: 2,
                cap_units: 20,
            },
            ..ArchiveConfig::default()
        };
        ArchiveOrchestrator::new(
            archive.clone(),
            archive.clone(),
            Arc::new(InMemoryRecordStore::new()),
            config,
        )
        .unwrap()
    }

    // ------------------------------------------------------------------
    // Deposit
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn invalid_object_never_reaches_the_archive() {
        let archive = Arc::new(InMemoryArchive::new());
        let orch = orchestrator(&archive);
        let err = orch
            .deposit(None, &Collection::new("", "Ocean").into())
            .await
            .unwrap_err();
        assert!(matches!(err, ArchiveError::Validation(ValidationError::BlankId)));
        assert!(!err.is_retryable());
        assert_eq!(archive.pending_tickets(), 0);
    }

    #[tokio::test]
    async fn deposit_records_pending_row() {
        let archive = Arc::new(InMemoryArchive::with_resolve_after(5));
        let orch = orchestrator(&archive);
        let id = orch
            .deposit(None, &Collection::new("C1", "Ocean").into())
            .await
            .unwrap();
        assert_eq!(orch.get_status(&id).unwrap(), Some(DepositStatus::Pending));
        assert_eq!(
            orch.list_by_status(ObjectType::Collection, DepositStatus::Pending)
                .unwrap(),
            vec![id]
        );
    }

    #[tokio::test]
    async fn rejected_package_is_a_submission_error() {
        let archive = Arc::new(InMemoryArchive::new());
        archive.set_faults(FaultPlan {
            reject_deposits: Some("schema violation".into()),
            ..FaultPlan::default()
        });
        let orch = orchestrator(&archive);
        let err = orch
            .deposit(None, &Collection::new("C1", "Ocean").into())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ArchiveError::Submission(SubmissionError::Rejected(_))
        ));
        assert!(err.is_retryable());
        assert!(orch.history(&BusinessId::new("C1")).unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_upload_names_the_file() {
        let archive = Arc::new(InMemoryArchive::new());
        let orch = orchestrator(&archive);
        let collection = orch
            .deposit_and_await(None, &Collection::new("C1", "Ocean").into())
            .await
            .unwrap();
        let item = DataItem::new("D1", "Survey").with_parent("C1");
        orch.deposit_and_await(Some(collection), &item.into())
            .await
            .unwrap();

        archive.set_faults(FaultPlan {
            reject_uploads: true,
            ..FaultPlan::default()
        });
        let file = DataFile::new("F1", "a.csv", b"x,y".to_vec()).with_parent("D1");
        let err = orch.deposit(None, &file.into()).await.unwrap_err();
        assert!(matches!(
            err,
            ArchiveError::Submission(SubmissionError::Upload { .. })
        ));
    }

    #[tokio::test]
    async fn child_of_unarchived_parent_is_refused() {
        let archive = Arc::new(InMemoryArchive::new());
        let orch = orchestrator(&archive);
        let item = DataItem::new("D1", "Survey").with_parent("nowhere");
        let err = orch.deposit(None, &item.into()).await.unwrap_err();
        assert!(matches!(
            err,
            ArchiveError::Submission(SubmissionError::ParentNotArchived { .. })
        ));
    }

    // ------------------------------------------------------------------
    // Retrieval
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn retrieve_unknown_deposit_is_none() {
        let archive = Arc::new(InMemoryArchive::new());
        let orch = orchestrator(&archive);
        assert!(orch.retrieve(&DepositId::new()).await.unwrap().is_none());
        assert!(orch.get_status(&DepositId::new()).unwrap().is_none());
    }

    #[tokio::test]
    async fn retrieve_pending_deposit_is_a_reconstruction_error() {
        let archive = Arc::new(InMemoryArchive::with_resolve_after(10));
        let orch = orchestrator(&archive);
        let id = orch
            .deposit(None, &Collection::new("C1", "Ocean").into())
            .await
            .unwrap();
        let err = orch.retrieve(&id).await.unwrap_err();
        assert!(matches!(
            err,
            ArchiveError::Reconstruction(ReconstructionError::NotDeposited {
                status: DepositStatus::Pending,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn deposited_collection_reads_back() {
        let archive = Arc::new(InMemoryArchive::new());
        let orch = orchestrator(&archive);
        let original: BusinessObject = Collection::new("C1", "Ocean")
            .with_summary("Sea surface temperatures")
            .with_creator("A. Diver")
            .into();
        let id = orch.deposit_and_await(None, &original).await.unwrap();
        let back = orch.retrieve(&id).await.unwrap().unwrap();
        assert_eq!(back, original);
    }

    // ------------------------------------------------------------------
    // Polling
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn poll_skips_locked_objects() {
        let archive = Arc::new(InMemoryArchive::new());
        let orch = orchestrator(&archive);
        orch.deposit(None, &Collection::new("C1", "Ocean").into())
            .await
            .unwrap();

        let guard = orch.locks.lock(&BusinessId::new("C1")).await;
        let summary = orch.poll_once().await.unwrap();
        assert_eq!(summary.examined, 1);
        assert_eq!(summary.busy, 1);
        drop(guard);

        let summary = orch.poll_once().await.unwrap();
        assert_eq!(summary.deposited, 1);
        assert_eq!(orch.poll_once().await.unwrap(), PollSummary::default());
    }
}
