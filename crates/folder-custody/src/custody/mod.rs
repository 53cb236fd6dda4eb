//! Custody of employee folders: drawer capacity, envelope reservations, withdrawals with return
//! deadlines, escalating alerts and dismissal-driven archival.
//!
//! Every operation exposed by [`CustodyService`] runs as a single transaction against a
//! [`CustodyStore`]; a rejected operation leaves no partial writes behind.

pub mod alerts;
pub(crate) mod audit;
pub mod clock;
pub mod dismissal;
pub mod domain;
pub mod error;
pub mod policy;
pub mod registry;
pub mod requests;
pub mod router;
pub mod service;
pub mod stats;
pub mod store;
pub mod views;
pub mod withdrawals;

#[cfg(test)]
mod tests;

pub use alerts::ScanReport;
pub use clock::{Clock, ManualClock, SystemClock};
pub use dismissal::{DismissalMode, DismissalReceipt};
pub use domain::{
    Alert, AlertId, AlertKind, AuditEntry, Cabinet, CabinetId, CategorySet, Drawer, DrawerId,
    Employee, EmployeeId, EmployeeIdentity, EmployeeStatus, Envelope, EnvelopeCategory,
    EnvelopeStatus, Folder, FolderId, RequestId, RequestStatus, Severity, UserId, Withdrawal,
    WithdrawalId, WithdrawalRequest, WithdrawalStatus,
};
pub use error::{CustodyError, ErrorKind, Failure};
pub use policy::CustodyPolicy;
pub use registry::{NewFolder, UNKNOWN_DEPARTMENT};
pub use requests::{ApprovalOutcome, NewRequest};
pub use router::custody_router;
pub use service::CustodyService;
pub use stats::DashboardStats;
pub use store::{CustodyStore, InMemoryStore, StoreError, Tables};
pub use views::{AlertView, FolderView, PendingRequestView, WithdrawalView};
pub use withdrawals::ReturnReceipt;
