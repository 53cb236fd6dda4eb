use chrono::{DateTime, Utc};
use serde::Serialize;

use super::domain::{
    Alert, AlertId, AlertKind, CabinetId, CategorySet, Drawer, DrawerId, EmployeeId,
    EnvelopeStatus, Folder, FolderId, RequestId, RequestStatus, Severity, UserId, WithdrawalId,
    WithdrawalRequest, WithdrawalStatus,
};
use super::policy::CustodyPolicy;
use super::store::Tables;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingRequestView {
    pub request_id: RequestId,
    pub folder_id: Option<FolderId>,
    pub employee_id: EmployeeId,
    pub employee_name: String,
    pub user_id: UserId,
    pub categories: CategorySet,
    pub reason: String,
    pub is_dismissal: bool,
    pub requested_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WithdrawalView {
    pub withdrawal_id: WithdrawalId,
    pub folder_id: FolderId,
    pub folder_label: String,
    pub employee_id: EmployeeId,
    pub employee_name: String,
    pub user_id: UserId,
    pub categories: CategorySet,
    pub started_at: DateTime<Utc>,
    pub due_at: DateTime<Utc>,
    pub status: WithdrawalStatus,
    pub elapsed_days: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlertView {
    pub alert_id: AlertId,
    pub withdrawal_id: WithdrawalId,
    pub employee_id: EmployeeId,
    pub employee_name: String,
    pub kind: AlertKind,
    pub severity: Severity,
    pub detail: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FolderView {
    pub folder: Folder,
    pub employee_name: String,
    pub department: String,
    pub badge_id: Option<String>,
    pub withdrawn: CategorySet,
}

fn employee_name(tables: &Tables, employee_id: EmployeeId) -> String {
    tables
        .employees
        .get(employee_id)
        .map(|employee| employee.name.clone())
        .unwrap_or_default()
}

pub(crate) fn pending_requests(tables: &Tables) -> Vec<PendingRequestView> {
    let mut pending: Vec<&WithdrawalRequest> = tables
        .requests
        .values()
        .filter(|request| request.status == RequestStatus::Pending)
        .collect();
    pending.sort_by(|a, b| b.requested_at.cmp(&a.requested_at).then(b.id.cmp(&a.id)));

    pending
        .into_iter()
        .map(|request| PendingRequestView {
            request_id: request.id,
            folder_id: request.folder_id,
            employee_id: request.employee_id,
            employee_name: employee_name(tables, request.employee_id),
            user_id: request.user_id,
            categories: request.categories,
            reason: request.reason.clone(),
            is_dismissal: request.is_dismissal,
            requested_at: request.requested_at,
        })
        .collect()
}

/// Active and Overdue withdrawals, newest first, optionally for one operator.
pub(crate) fn outstanding_withdrawals(
    tables: &Tables,
    user: Option<UserId>,
) -> Vec<WithdrawalView> {
    let mut views: Vec<WithdrawalView> = tables
        .withdrawals
        .values()
        .filter(|withdrawal| withdrawal.status.is_outstanding())
        .filter(|withdrawal| user.map_or(true, |user| withdrawal.user_id == user))
        .map(|withdrawal| WithdrawalView {
            withdrawal_id: withdrawal.id,
            folder_id: withdrawal.folder_id,
            folder_label: tables
                .folders
                .get(withdrawal.folder_id)
                .map(|folder| folder.label.clone())
                .unwrap_or_default(),
            employee_id: withdrawal.employee_id,
            employee_name: employee_name(tables, withdrawal.employee_id),
            user_id: withdrawal.user_id,
            categories: withdrawal.categories,
            started_at: withdrawal.started_at,
            due_at: withdrawal.due_at,
            status: withdrawal.status,
            elapsed_days: withdrawal.elapsed_days,
        })
        .collect();
    views.sort_by(|a, b| {
        b.started_at
            .cmp(&a.started_at)
            .then(b.withdrawal_id.cmp(&a.withdrawal_id))
    });
    views
}

/// Unresolved alerts, most severe first, then newest first.
pub(crate) fn unresolved_alerts(tables: &Tables, policy: &CustodyPolicy) -> Vec<AlertView> {
    let mut open: Vec<&Alert> = tables
        .alerts
        .values()
        .filter(|alert| !alert.resolved)
        .collect();
    open.sort_by(|a, b| {
        b.severity
            .cmp(&a.severity)
            .then(b.created_at.cmp(&a.created_at))
            .then(b.id.cmp(&a.id))
    });

    open.into_iter()
        .filter_map(|alert| {
            let withdrawal = tables.withdrawals.get(alert.withdrawal_id)?;
            let employee = tables.employees.get(withdrawal.employee_id)?;
            let deadline = policy.deadline_days(employee.status);
            Some(AlertView {
                alert_id: alert.id,
                withdrawal_id: withdrawal.id,
                employee_id: employee.id,
                employee_name: employee.name.clone(),
                kind: alert.kind,
                severity: alert.severity,
                detail: alert_detail(alert.kind, deadline, withdrawal.elapsed_days),
                created_at: alert.created_at,
            })
        })
        .collect()
}

fn alert_detail(kind: AlertKind, deadline: i64, elapsed: i64) -> String {
    let plural = |days: i64| if days == 1 { "day" } else { "days" };
    match kind {
        AlertKind::Approaching => {
            let remaining = (deadline - elapsed).max(0);
            format!(
                "return deadline approaching ({remaining} {} remaining)",
                plural(remaining)
            )
        }
        AlertKind::Expired => {
            let late = (elapsed - deadline).max(0);
            format!("return deadline passed (overdue by {late} {})", plural(late))
        }
    }
}

/// Folders occupying the drawer, in shelf order.
pub(crate) fn folders_in_drawer(tables: &Tables, drawer_id: DrawerId) -> Vec<FolderView> {
    let mut folders: Vec<&Folder> = tables
        .folders
        .values()
        .filter(|folder| folder.drawer_id == drawer_id && folder.occupies_slot())
        .collect();
    folders.sort_by_key(|folder| (folder.order, folder.id));

    folders
        .into_iter()
        .map(|folder| {
            let employee = tables.employees.get(folder.employee_id);
            FolderView {
                folder: folder.clone(),
                employee_name: employee.map(|e| e.name.clone()).unwrap_or_default(),
                department: employee.map(|e| e.department.clone()).unwrap_or_default(),
                badge_id: employee.and_then(|e| e.badge_id.clone()),
                withdrawn: tables
                    .envelopes_of(folder.id)
                    .filter(|envelope| envelope.status == EnvelopeStatus::Withdrawn)
                    .map(|envelope| envelope.category)
                    .collect(),
            }
        })
        .collect()
}

pub(crate) fn drawers(tables: &Tables, cabinet: Option<CabinetId>) -> Vec<Drawer> {
    let mut drawers: Vec<Drawer> = tables
        .drawers
        .values()
        .filter(|drawer| cabinet.map_or(true, |cabinet| drawer.cabinet_id == cabinet))
        .cloned()
        .collect();
    drawers.sort_by(|a, b| {
        a.cabinet_id
            .cmp(&b.cabinet_id)
            .then_with(|| a.number.to_lowercase().cmp(&b.number.to_lowercase()))
    });
    drawers
}
