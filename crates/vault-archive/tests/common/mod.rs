//! Shared fixtures for the vault-archive integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use vault_archive::{ArchiveConfig, ArchiveOrchestrator, WaitPolicy};
use vault_connector::InMemoryArchive;
use vault_records::InMemoryRecordStore;

/// A short wait schedule (10ms unit, 120 units) with the background loop off.
pub fn fast_config() -> ArchiveConfig {
    ArchiveConfig {
        poll_interval_ms: 0,
        wait: WaitPolicy {
            initial_ms: 10,
            factor: 2,
            cap_units: 120,
        },
        ..ArchiveConfig::default()
    }
}

pub fn setup(resolve_after: u32) -> (Arc<InMemoryArchive>, Arc<ArchiveOrchestrator>) {
    setup_with(resolve_after, fast_config())
}

pub fn setup_with(
    resolve_after: u32,
    config: ArchiveConfig,
) -> (Arc<InMemoryArchive>, Arc<ArchiveOrchestrator>) {
    let archive = Arc::new(InMemoryArchive::with_resolve_after(resolve_after));
    let orchestrator = ArchiveOrchestrator::new(
        archive.clone(),
        archive.clone(),
        Arc::new(InMemoryRecordStore::new()),
        config,
    )
    .unwrap();
    (archive, Arc::new(orchestrator))
}
