//! Deposit orchestration for the archive vault.
//!
//! [`ArchiveOrchestrator`] is the caller-facing entry point. It validates a
//! business object, builds its next version as a package fragment, uploads
//! attached files, submits the package, and records the attempt PENDING.
//! [`DepositReconciler`] later moves each record to DEPOSITED or FAILED once
//! the archive resolves its ticket, either from the background loop
//! ([`ArchiveOrchestrator::spawn_reconciler`]) or from a caller waiting in
//! [`ArchiveOrchestrator::deposit_and_await`].
//!
//! # Concurrency
//!
//! Every read-modify-write of one object's deposit state holds that
//! object's mutex in [`KeyedLocks`]. The same business id always maps to
//! the same mutex; distinct ids never contend, and there is no global lock.
//! Operations that need several objects take their locks together, in id
//! order.
//!
//! # Errors
//!
//! [`ArchiveError`] has one variant per failure category. Only
//! [`SubmissionError`]s and ticket checks that could not reach the archive
//! are worth retrying.

pub mod background;
pub mod config;
pub mod error;
pub mod locks;
pub mod orchestrator;
pub mod page;
pub mod reconciler;
pub mod wait;

pub use background::ReconcilerHandle;
pub use config::ArchiveConfig;
pub use error::{
    ArchiveError, ArchiveResult, ConfigError, ReconciliationError, ReconstructionError,
    SubmissionError,
};
pub use locks::{KeyedLocks, ObjectGuard};
pub use orchestrator::ArchiveOrchestrator;
pub use page::paginate;
pub use reconciler::{DepositReconciler, PollSummary, ReconcileOutcome};
pub use wait::{Delays, WaitPolicy};
