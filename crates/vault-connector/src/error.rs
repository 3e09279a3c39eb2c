use thiserror::Error;

/// Faults reported by a remote archive connector.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectorError {
    /// The archive refused the request as malformed.
    #[error("client fault: {0}")]
    ClientFault(String),

    /// The request did not reach the archive or the archive failed to answer.
    #[error("transport error: {0}")]
    Transport(String),

    /// The referenced ticket or upload is unknown to the archive.
    #[error("not found: {0}")]
    NotFound(String),
}

impl ConnectorError {
    /// Transport faults are transient; the others are not.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

/// Result alias for connector operations.
pub type ConnectorResult<T> = Result<T, ConnectorError>;
