//! Local deposit-record store.
//!
//! One [`DepositRecord`](vault_types::DepositRecord) per deposit attempt,
//! keyed by deposit id and indexed by business id and parent deposit id.
//! Records are never deleted, and a terminal record never changes again.
//!
//! Two backends implement [`DepositRecordStore`]:
//!
//! - [`InMemoryRecordStore`] -- `RwLock`-guarded maps, for tests and embedding
//! - [`JournalRecordStore`] -- an append-only, CRC-framed journal replayed on open

pub mod error;
mod index;
pub mod journal;
pub mod memory;
pub mod traits;

#[cfg(test)]
mod testing;

pub use error::{RecordError, RecordResult};
pub use journal::{JournalRecordStore, JournalSync};
pub use memory::InMemoryRecordStore;
pub use traits::DepositRecordStore;
