use std::time::Duration;

use vault_connector::ConnectorError;
use vault_mapper::{MappingError, SearchError, ValidationError};
use vault_records::RecordError;
use vault_types::{BusinessId, DepositId, DepositStatus, EntityId, TypeError};

/// A submission did not (or not yet) lead to an archived version.
///
/// The caller may retry by issuing a new deposit.
#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error("archive rejected the package: {0}")]
    Rejected(ConnectorError),

    #[error("upload of file {file} failed: {source}")]
    Upload {
        file: EntityId,
        source: ConnectorError,
    },

    #[error("archive lookup failed: {0}")]
    Lookup(#[from] SearchError),

    #[error("parent {parent} of {business_id} has not been archived")]
    ParentNotArchived {
        business_id: BusinessId,
        parent: BusinessId,
    },

    #[error("deposit {deposit_id} for {business_id} is still pending")]
    DepositInFlight {
        business_id: BusinessId,
        deposit_id: DepositId,
    },

    #[error("deposit {deposit_id} still pending after {elapsed:?}")]
    Timeout {
        deposit_id: DepositId,
        elapsed: Duration,
    },

    #[error("deposit {deposit_id} failed: {reason}")]
    Failed { deposit_id: DepositId, reason: String },

    #[error("wait for deposit {deposit_id} interrupted")]
    Interrupted { deposit_id: DepositId },
}

/// A pending record could not be resolved because of a structural problem.
/// Isolated to that record, which stays pending.
#[derive(Debug, thiserror::Error)]
pub enum ReconciliationError {
    #[error("ticket resolution failed: {0}")]
    Ticket(ConnectorError),

    #[error("no root DU in deposit {0}")]
    NoRootDu(DepositId),

    #[error("no state DU in deposit {0}")]
    NoStateDu(DepositId),

    #[error("archived lineage of {0} not found")]
    LineageNotFound(BusinessId),

    #[error("state lookup failed: {0}")]
    Search(#[from] SearchError),

    #[error("invalid record transition: {0}")]
    Transition(#[from] TypeError),
}

/// Archived data could not be turned back into a business object.
/// Indicates a data-integrity condition, not a transient fault.
#[derive(Debug, thiserror::Error)]
pub enum ReconstructionError {
    #[error("deposit {deposit_id} is {status}, not DEPOSITED")]
    NotDeposited {
        deposit_id: DepositId,
        status: DepositStatus,
    },

    #[error("deposit {0} is DEPOSITED but has no archive ids")]
    IncompleteRecord(DepositId),

    #[error("state DU {0} not found in the archive")]
    MissingState(EntityId),

    #[error("empty ancestry for state DU {0}")]
    EmptyAncestry(EntityId),

    #[error("archive lookup failed: {0}")]
    Lookup(#[from] ConnectorError),

    #[error("current-state search failed: {0}")]
    Search(#[from] SearchError),

    #[error("archived graph does not map back: {0}")]
    Mapping(#[from] MappingError),
}

/// Configuration could not be loaded or is invalid.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Every failure an orchestrator operation can surface.
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("mapping error: {0}")]
    Mapping(#[from] MappingError),

    #[error("submission error: {0}")]
    Submission(#[from] SubmissionError),

    #[error("reconciliation error: {0}")]
    Reconciliation(#[from] ReconciliationError),

    #[error("reconstruction error: {0}")]
    Reconstruction(#[from] ReconstructionError),

    #[error("record store error: {0}")]
    Records(#[from] RecordError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl ArchiveError {
    /// Whether issuing the operation again may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Submission(_) => true,
            Self::Reconciliation(ReconciliationError::Ticket(err)) => err.is_transient(),
            _ => false,
        }
    }
}

/// Result alias for orchestrator operations.
pub type ArchiveResult<T> = Result<T, ArchiveError>;
