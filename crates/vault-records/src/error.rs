use vault_types::{DepositId, DepositStatus};

/// Errors from deposit-record store operations.
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    /// No record with this deposit id exists.
    #[error("deposit record not found: {0}")]
    NotFound(DepositId),

    /// A record with this deposit id was already added.
    #[error("duplicate deposit id: {0}")]
    DuplicateDeposit(DepositId),

    /// The record is terminal and cannot change any more.
    #[error("deposit {deposit_id} is {status} and cannot be updated")]
    TerminalRecord {
        deposit_id: DepositId,
        status: DepositStatus,
    },

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A failed append could not be rolled back; the journal must be
    /// reopened before it accepts writes again.
    #[error("journal writer failed at offset {0}")]
    WriterFailed(u64),

    /// I/O error from the journal file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for record store operations.
pub type RecordResult<T> = Result<T, RecordError>;
