use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use tracing::{debug, info, warn};

use super::alerts::{self, ScanReport};
use super::audit;
use super::clock::Clock;
use super::dismissal::{self, DismissalMode, DismissalReceipt};
use super::domain::{
    AlertId, AuditEntry, Cabinet, CabinetId, Drawer, DrawerId, Employee, EmployeeId, Envelope,
    FolderId, Folder, RequestId, UserId, Withdrawal, WithdrawalId, WithdrawalRequest,
};
use super::error::CustodyError;
use super::policy::CustodyPolicy;
use super::registry::{self, NewFolder};
use super::requests::{self, ApprovalOutcome, NewRequest};
use super::stats::{self, DashboardStats};
use super::store::{CustodyStore, Tables};
use super::views::{self, AlertView, FolderView, PendingRequestView, WithdrawalView};
use super::withdrawals::{self, ReturnReceipt};

/// Entry point for every custody operation. Each call runs as one store transaction.
pub struct CustodyService<S, C> {
    store: Arc<S>,
    clock: Arc<C>,
    policy: CustodyPolicy,
}

impl<S, C> CustodyService<S, C>
where
    S: CustodyStore + 'static,
    C: Clock + 'static,
{
    pub fn new(store: Arc<S>, clock: Arc<C>, policy: CustodyPolicy) -> Self {
        Self {
            store,
            clock,
            policy,
        }
    }

    pub fn policy(&self) -> &CustodyPolicy {
        &self.policy
    }

    fn execute<T>(
        &self,
        operation: &'static str,
        work: impl FnOnce(&mut Tables, DateTime<Utc>) -> Result<T, CustodyError>,
    ) -> Result<T, CustodyError> {
        let now = self.clock.now();
        let result = self.store.transaction(|tables| work(tables, now));
        if let Err(error) = &result {
            warn!(operation, code = error.code(), %error, "custody operation rejected");
        }
        result
    }

    fn query<T>(&self, view: impl FnOnce(&Tables) -> Result<T, CustodyError>) -> Result<T, CustodyError> {
        self.store.read(view)
    }

    pub fn register_cabinet(&self, name: &str, location: &str) -> Result<CabinetId, CustodyError> {
        let cabinet_id = self.execute("register_cabinet", |tables, now| {
            let cabinet_id = registry::register_cabinet(tables, name, location)?;
            audit::record(
                tables,
                now,
                None,
                "register_cabinet",
                "cabinets",
                Some(cabinet_id.0),
                Some(name.trim().to_string()),
            );
            Ok(cabinet_id)
        })?;
        info!(%cabinet_id, "cabinet registered");
        Ok(cabinet_id)
    }

    pub fn register_drawer(
        &self,
        cabinet_id: CabinetId,
        number: &str,
        capacity: u32,
    ) -> Result<DrawerId, CustodyError> {
        let drawer_id = self.execute("register_drawer", |tables, now| {
            let drawer_id = registry::register_drawer(tables, cabinet_id, number, capacity)?;
            audit::record(
                tables,
                now,
                None,
                "register_drawer",
                "drawers",
                Some(drawer_id.0),
                Some(format!("cabinet {cabinet_id}, number {number}, capacity {capacity}")),
            );
            Ok(drawer_id)
        })?;
        info!(%cabinet_id, %drawer_id, capacity, "drawer registered");
        Ok(drawer_id)
    }

    /// Register a folder, resolving or creating its employee, with all four envelopes present.
    pub fn create_folder(&self, input: NewFolder) -> Result<FolderId, CustodyError> {
        let folder_id = self.execute("create_folder", |tables, now| {
            let folder_id = registry::create_folder(tables, now.date_naive(), &input)?;
            audit::record(
                tables,
                now,
                None,
                "create_folder",
                "folders",
                Some(folder_id.0),
                Some(format!("drawer {}", input.drawer_id)),
            );
            Ok(folder_id)
        })?;
        info!(%folder_id, drawer_id = %input.drawer_id, "folder created");
        Ok(folder_id)
    }

    /// Archive a folder and free its drawer slot. Returns `false` if it was already archived.
    pub fn archive_folder(&self, folder_id: FolderId) -> Result<bool, CustodyError> {
        let released = self.execute("archive_folder", |tables, now| {
            let released = registry::archive_folder(tables, folder_id)?;
            if released {
                audit::record(
                    tables,
                    now,
                    None,
                    "archive_folder",
                    "folders",
                    Some(folder_id.0),
                    None,
                );
            }
            Ok(released)
        })?;
        info!(%folder_id, released, "folder archive processed");
        Ok(released)
    }

    pub fn create_request(&self, input: NewRequest) -> Result<RequestId, CustodyError> {
        let request_id = self.execute("create_request", |tables, now| {
            let request_id = requests::create_request(tables, now, &input)?;
            audit::record(
                tables,
                now,
                Some(input.user_id),
                "create_request",
                "requests",
                Some(request_id.0),
                Some(format!(
                    "folder {}, envelopes {}, dismissal {}",
                    input.folder_id, input.categories, input.is_dismissal
                )),
            );
            Ok(request_id)
        })?;
        info!(
            %request_id,
            folder_id = %input.folder_id,
            categories = %input.categories,
            is_dismissal = input.is_dismissal,
            "withdrawal request submitted"
        );
        Ok(request_id)
    }

    pub fn approve_request(
        &self,
        request_id: RequestId,
        actor: UserId,
    ) -> Result<ApprovalOutcome, CustodyError> {
        let policy = self.policy;
        let outcome = self.execute("approve_request", |tables, now| {
            let outcome = requests::approve_request(tables, &policy, now, request_id)?;
            let details = match outcome {
                ApprovalOutcome::Withdrawal { withdrawal_id, .. } => {
                    format!("withdrawal {withdrawal_id} opened")
                }
                ApprovalOutcome::Dismissal { folder_id, .. } => {
                    format!("dismissal completed, folder {folder_id} archived")
                }
            };
            audit::record(
                tables,
                now,
                Some(actor),
                "approve_request",
                "requests",
                Some(request_id.0),
                Some(details),
            );
            Ok(outcome)
        })?;
        info!(%request_id, %actor, ?outcome, "request approved");
        Ok(outcome)
    }

    pub fn reject_request(
        &self,
        request_id: RequestId,
        actor: UserId,
        reason: Option<String>,
    ) -> Result<(), CustodyError> {
        self.execute("reject_request", |tables, now| {
            requests::reject_request(tables, request_id, reason.clone())?;
            audit::record(
                tables,
                now,
                Some(actor),
                "reject_request",
                "requests",
                Some(request_id.0),
                reason.clone(),
            );
            Ok(())
        })?;
        info!(%request_id, %actor, "request rejected");
        Ok(())
    }

    /// Return the envelopes of a withdrawal, whether it is Active or already Overdue.
    pub fn finalize_withdrawal(
        &self,
        withdrawal_id: WithdrawalId,
        actor: UserId,
    ) -> Result<ReturnReceipt, CustodyError> {
        let receipt = self.execute("finalize_withdrawal", |tables, now| {
            let receipt = withdrawals::finalize_withdrawal(tables, now, withdrawal_id)?;
            audit::record(
                tables,
                now,
                Some(actor),
                "finalize_withdrawal",
                "withdrawals",
                Some(withdrawal_id.0),
                Some(format!("envelopes {} returned", receipt.restored)),
            );
            Ok(receipt)
        })?;
        info!(
            %withdrawal_id,
            %actor,
            restored = %receipt.restored,
            alerts_resolved = receipt.alerts_resolved,
            "withdrawal returned"
        );
        Ok(receipt)
    }

    /// Recompute elapsed days and deadlines for every outstanding withdrawal.
    pub fn scan_alerts(&self) -> Result<ScanReport, CustodyError> {
        let policy = self.policy;
        let report = self.execute("scan_alerts", |tables, now| {
            alerts::scan(tables, &policy, now)
        })?;
        if report.marked_overdue > 0 || report.warnings_raised > 0 || report.criticals_raised > 0 {
            info!(
                scanned = report.scanned,
                marked_overdue = report.marked_overdue,
                warnings = report.warnings_raised,
                criticals = report.criticals_raised,
                "alert scan escalated withdrawals"
            );
        } else {
            debug!(scanned = report.scanned, "alert scan completed");
        }
        Ok(report)
    }

    pub fn resolve_alert(&self, alert_id: AlertId) -> Result<bool, CustodyError> {
        let resolved = self.execute("resolve_alert", |tables, now| {
            let resolved = alerts::resolve_alert(tables, alert_id)?;
            if resolved {
                audit::record(
                    tables,
                    now,
                    None,
                    "resolve_alert",
                    "alerts",
                    Some(alert_id.0),
                    None,
                );
            }
            Ok(resolved)
        })?;
        info!(%alert_id, resolved, "alert resolution processed");
        Ok(resolved)
    }

    /// Dismiss an employee directly, refusing while any of their envelopes is still out.
    pub fn dismiss_employee(
        &self,
        employee_id: EmployeeId,
        dismissal_date: NaiveDate,
        actor: UserId,
    ) -> Result<DismissalReceipt, CustodyError> {
        self.dismiss(employee_id, dismissal_date, DismissalMode::Strict, actor)
    }

    /// Dismiss an employee and archive their folders even with envelopes still out.
    pub fn force_dismiss_employee(
        &self,
        employee_id: EmployeeId,
        dismissal_date: NaiveDate,
        actor: UserId,
    ) -> Result<DismissalReceipt, CustodyError> {
        self.dismiss(employee_id, dismissal_date, DismissalMode::Force, actor)
    }

    pub fn dismiss(
        &self,
        employee_id: EmployeeId,
        dismissal_date: NaiveDate,
        mode: DismissalMode,
        actor: UserId,
    ) -> Result<DismissalReceipt, CustodyError> {
        let receipt = self.execute("dismiss_employee", |tables, now| {
            let receipt = dismissal::dismiss_employee(tables, employee_id, dismissal_date, mode)?;
            audit::record(
                tables,
                now,
                Some(actor),
                "dismiss_employee",
                "employees",
                Some(employee_id.0),
                Some(format!(
                    "{mode:?} dismissal, {} folder(s) archived",
                    receipt.archived_folders.len()
                )),
            );
            Ok(receipt)
        })?;
        info!(
            %employee_id,
            %actor,
            ?mode,
            archived = receipt.archived_folders.len(),
            "employee dismissed"
        );
        Ok(receipt)
    }

    /// Dashboard counters, computed after a fresh alert scan.
    pub fn dashboard(&self) -> Result<DashboardStats, CustodyError> {
        self.scan_alerts()?;
        self.query(|tables| Ok(stats::dashboard(tables)))
    }

    pub fn employee(&self, employee_id: EmployeeId) -> Result<Employee, CustodyError> {
        self.query(|tables| tables.employee(employee_id).cloned())
    }

    /// Employees ordered by name, ignoring case.
    pub fn employees(&self) -> Result<Vec<Employee>, CustodyError> {
        self.query(|tables| {
            let mut employees: Vec<Employee> = tables.employees.values().cloned().collect();
            employees.sort_by_key(|employee| (employee.name.to_lowercase(), employee.id));
            Ok(employees)
        })
    }

    pub fn cabinets(&self) -> Result<Vec<Cabinet>, CustodyError> {
        self.query(|tables| {
            let mut cabinets: Vec<Cabinet> = tables.cabinets.values().cloned().collect();
            cabinets.sort_by(|a, b| a.name.cmp(&b.name));
            Ok(cabinets)
        })
    }

    pub fn drawer(&self, drawer_id: DrawerId) -> Result<Drawer, CustodyError> {
        self.query(|tables| tables.drawer(drawer_id).cloned())
    }

    pub fn drawers(&self, cabinet_id: Option<CabinetId>) -> Result<Vec<Drawer>, CustodyError> {
        self.query(|tables| Ok(views::drawers(tables, cabinet_id)))
    }

    pub fn folder(&self, folder_id: FolderId) -> Result<Folder, CustodyError> {
        self.query(|tables| tables.folder(folder_id).cloned())
    }

    pub fn envelopes(&self, folder_id: FolderId) -> Result<Vec<Envelope>, CustodyError> {
        self.query(|tables| {
            tables.folder(folder_id)?;
            let mut envelopes: Vec<Envelope> = tables.envelopes_of(folder_id).cloned().collect();
            envelopes.sort_by_key(|envelope| envelope.category);
            Ok(envelopes)
        })
    }

    pub fn folders_in_drawer(&self, drawer_id: DrawerId) -> Result<Vec<FolderView>, CustodyError> {
        self.query(|tables| {
            tables.drawer(drawer_id)?;
            Ok(views::folders_in_drawer(tables, drawer_id))
        })
    }

    pub fn request(&self, request_id: RequestId) -> Result<WithdrawalRequest, CustodyError> {
        self.query(|tables| tables.request(request_id).cloned())
    }

    pub fn pending_requests(&self) -> Result<Vec<PendingRequestView>, CustodyError> {
        self.query(|tables| Ok(views::pending_requests(tables)))
    }

    pub fn withdrawal(&self, withdrawal_id: WithdrawalId) -> Result<Withdrawal, CustodyError> {
        self.query(|tables| tables.withdrawal(withdrawal_id).cloned())
    }

    pub fn outstanding_withdrawals(&self) -> Result<Vec<WithdrawalView>, CustodyError> {
        self.query(|tables| Ok(views::outstanding_withdrawals(tables, None)))
    }

    pub fn withdrawals_for_user(&self, user_id: UserId) -> Result<Vec<WithdrawalView>, CustodyError> {
        self.query(|tables| Ok(views::outstanding_withdrawals(tables, Some(user_id))))
    }

    pub fn unresolved_alerts(&self) -> Result<Vec<AlertView>, CustodyError> {
        let policy = self.policy;
        self.query(|tables| Ok(views::unresolved_alerts(tables, &policy)))
    }

    pub fn audit_log(&self, limit: usize) -> Result<Vec<AuditEntry>, CustodyError> {
        self.query(|tables| Ok(audit::recent(tables, limit)))
    }
}
