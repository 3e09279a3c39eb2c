use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::ids::{BusinessId, DepositId, EntityId, TicketId};
use crate::object::ObjectType;

/// Lifecycle state of a deposit attempt.
///
/// `Pending` is the only non-terminal state. `Deposited` and `Failed` are
/// final: a record never leaves them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DepositStatus {
    Pending,
    Deposited,
    Failed,
}

impl DepositStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Deposited => "DEPOSITED",
            Self::Failed => "FAILED",
        }
    }
}

impl fmt::Display for DepositStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DepositStatus {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "PENDING" => Ok(Self::Pending),
            "DEPOSITED" => Ok(Self::Deposited),
            "FAILED" => Ok(Self::Failed),
            _ => Err(TypeError::UnknownStatus(s.to_string())),
        }
    }
}

/// Local audit row for one deposit attempt.
///
/// Created `Pending` when a package is submitted. Only the reconciler moves
/// it to `Deposited` (filling `archive_id` and `state_id`) or `Failed`.
/// Records are never deleted: there is one row per attempt, not per object.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositRecord {
    pub deposit_id: DepositId,
    pub business_id: BusinessId,
    pub parent_deposit_id: Option<DepositId>,
    pub object_type: ObjectType,
    pub status: DepositStatus,
    /// Ticket issued by the connector for the submitted package.
    pub ticket: TicketId,
    /// Root DU id, set on completion.
    pub archive_id: Option<EntityId>,
    /// State DU id of the deposited version, set on completion.
    pub state_id: Option<EntityId>,
    /// Remote-reported reason for a failed deposit.
    pub status_reason: Option<String>,
    pub deposit_timestamp: DateTime<Utc>,
}

impl DepositRecord {
    /// A fresh `Pending` record stamped with the current time.
    pub fn pending(
        deposit_id: DepositId,
        business_id: BusinessId,
        parent_deposit_id: Option<DepositId>,
        object_type: ObjectType,
        ticket: TicketId,
    ) -> Self {
        Self {
            deposit_id,
            business_id,
            parent_deposit_id,
            object_type,
            status: DepositStatus::Pending,
            ticket,
            archive_id: None,
            state_id: None,
            status_reason: None,
            deposit_timestamp: Utc::now(),
        }
    }

    /// The completed form of this record. Only valid from `Pending`.
    pub fn deposited(&self, archive_id: EntityId, state_id: EntityId) -> Result<Self, TypeError> {
        self.ensure_pending()?;
        Ok(Self {
            status: DepositStatus::Deposited,
            archive_id: Some(archive_id),
            state_id: Some(state_id),
            status_reason: None,
            ..self.clone()
        })
    }

    /// The failed form of this record. Only valid from `Pending`.
    pub fn failed(&self, reason: impl Into<String>) -> Result<Self, TypeError> {
        self.ensure_pending()?;
        Ok(Self {
            status: DepositStatus::Failed,
            status_reason: Some(reason.into()),
            ..self.clone()
        })
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    fn ensure_pending(&self) -> Result<(), TypeError> {
        if self.status.is_terminal() {
            return Err(TypeError::InvalidTransition {
                deposit_id: self.deposit_id.to_string(),
                from: self.status.to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> DepositRecord {
        DepositRecord::pending(
            DepositId::new(),
            BusinessId::new("C1"),
            None,
            ObjectType::Collection,
            TicketId("ticket:1".into()),
        )
    }

    #[test]
    fn pending_record_has_no_archive_ids() {
        let r = record();
        assert_eq!(r.status, DepositStatus::Pending);
        assert!(r.archive_id.is_none());
        assert!(r.state_id.is_none());
        assert!(!r.is_terminal());
    }

    #[test]
    fn deposited_sets_both_ids() {
        let r = record()
            .deposited(EntityId::new("du:root"), EntityId::new("du:state"))
            .unwrap();
        assert_eq!(r.status, DepositStatus::Deposited);
        assert_eq!(r.archive_id, Some(EntityId::new("du:root")));
        assert_eq!(r.state_id, Some(EntityId::new("du:state")));
    }

    #[test]
    fn terminal_records_refuse_transitions() {
        let failed = record().failed("virus detected").unwrap();
        assert_eq!(failed.status_reason.as_deref(), Some("virus detected"));
        let err = failed
            .deposited(EntityId::new("a"), EntityId::new("b"))
            .unwrap_err();
        assert!(matches!(err, TypeError::InvalidTransition { .. }));
        assert!(failed.failed("again").is_err());
    }

    #[test]
    fn status_parses_case_insensitively() {
        assert_eq!("pending".parse::<DepositStatus>().unwrap(), DepositStatus::Pending);
        assert_eq!("DEPOSITED".parse::<DepositStatus>().unwrap(), DepositStatus::Deposited);
        assert!("done".parse::<DepositStatus>().is_err());
    }

    #[test]
    fn status_serializes_uppercase() {
        let json = serde_json::to_string(&DepositStatus::Failed).unwrap();
        assert_eq!(json, "\"FAILED\"");
    }
}
