use serde::Serialize;

use super::domain::{
    CategorySet, DrawerId, EmployeeId, EnvelopeCategory, FolderId, RequestId, WithdrawalId,
};
use super::store::StoreError;

/// Error raised by custody operations. Any error aborts the surrounding transaction.
#[derive(Debug, thiserror::Error)]
pub enum CustodyError {
    #[error("{0}")]
    Validation(String),
    #[error("drawer {drawer_id} is full ({occupancy}/{capacity})")]
    CapacityExceeded {
        drawer_id: DrawerId,
        capacity: u32,
        occupancy: u32,
    },
    #[error("employee {employee_id} already has an active folder")]
    DuplicateActiveFolder { employee_id: EmployeeId },
    #[error("drawer number {number} already exists in this cabinet")]
    DuplicateDrawer { number: String },
    #[error("envelope {category} is already reserved by another pending request")]
    CategoryReserved { category: EnvelopeCategory },
    #[error("envelope {category} is not available for withdrawal")]
    EnvelopeUnavailable { category: EnvelopeCategory },
    #[error("folder {folder_id} is archived")]
    FolderArchived { folder_id: FolderId },
    #[error("request {request_id} was already processed")]
    AlreadyProcessed { request_id: RequestId },
    #[error("request {request_id} has no folder attached")]
    MissingFolderLink { request_id: RequestId },
    #[error("withdrawal {withdrawal_id} was already finalized")]
    AlreadyFinalized { withdrawal_id: WithdrawalId },
    #[error("folder {folder_id} still has withdrawn envelopes {withdrawn}; wait for their return")]
    OutstandingEnvelopes {
        folder_id: FolderId,
        withdrawn: CategorySet,
    },
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: u64 },
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Coarse classification used by callers to decide how to react to a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    Capacity,
    Conflict,
    Consistency,
    NotFound,
    Storage,
}

impl CustodyError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(entity: &'static str, id: u64) -> Self {
        Self::NotFound { entity, id }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            CustodyError::Validation(_) => ErrorKind::Validation,
            CustodyError::CapacityExceeded { .. } => ErrorKind::Capacity,
            CustodyError::DuplicateActiveFolder { .. }
            | CustodyError::DuplicateDrawer { .. }
            | CustodyError::CategoryReserved { .. }
            | CustodyError::EnvelopeUnavailable { .. }
            | CustodyError::FolderArchived { .. }
            | CustodyError::AlreadyProcessed { .. }
            | CustodyError::AlreadyFinalized { .. } => ErrorKind::Conflict,
            CustodyError::MissingFolderLink { .. } | CustodyError::OutstandingEnvelopes { .. } => {
                ErrorKind::Consistency
            }
            CustodyError::NotFound { .. } => ErrorKind::NotFound,
            CustodyError::Store(_) => ErrorKind::Storage,
        }
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            CustodyError::Validation(_) => "validation_failed",
            CustodyError::CapacityExceeded { .. } => "capacity_exceeded",
            CustodyError::DuplicateActiveFolder { .. } => "duplicate_active_folder",
            CustodyError::DuplicateDrawer { .. } => "duplicate_drawer",
            CustodyError::CategoryReserved { .. } => "category_reserved",
            CustodyError::EnvelopeUnavailable { .. } => "envelope_unavailable",
            CustodyError::FolderArchived { .. } => "folder_archived",
            CustodyError::AlreadyProcessed { .. } => "already_processed",
            CustodyError::MissingFolderLink { .. } => "missing_folder_link",
            CustodyError::AlreadyFinalized { .. } => "already_finalized",
            CustodyError::OutstandingEnvelopes { .. } => "outstanding_envelopes",
            CustodyError::NotFound { .. } => "not_found",
            CustodyError::Store(_) => "storage_error",
        }
    }

    pub fn to_failure(&self) -> Failure {
        Failure {
            ok: false,
            kind: self.kind(),
            code: self.code(),
            message: self.to_string(),
        }
    }
}

/// Structured failure returned across the operation boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    pub ok: bool,
    pub kind: ErrorKind,
    pub code: &'static str,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_carries_kind_code_and_message() {
        let error = CustodyError::CapacityExceeded {
            drawer_id: DrawerId(3),
            capacity: 50,
            occupancy: 50,
        };
        let failure = error.to_failure();

        assert!(!failure.ok);
        assert_eq!(failure.kind, ErrorKind::Capacity);
        assert_eq!(failure.code, "capacity_exceeded");
        assert_eq!(failure.message, "drawer 3 is full (50/50)");
    }

    #[test]
    fn outstanding_envelopes_is_a_consistency_error() {
        let error = CustodyError::OutstandingEnvelopes {
            folder_id: FolderId(1),
            withdrawn: [EnvelopeCategory::Medicine].into_iter().collect(),
        };
        assert_eq!(error.kind(), ErrorKind::Consistency);
        assert!(error.to_string().contains("[Medicine]"));
    }
}
