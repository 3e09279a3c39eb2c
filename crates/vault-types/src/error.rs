use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid deposit id: {0}")]
    InvalidDepositId(String),

    #[error("unknown object type tag: {0}")]
    UnknownObjectType(String),

    #[error("unknown deposit status: {0}")]
    UnknownStatus(String),

    #[error("invalid transition of deposit {deposit_id} from {from}")]
    InvalidTransition { deposit_id: String, from: String },
}
