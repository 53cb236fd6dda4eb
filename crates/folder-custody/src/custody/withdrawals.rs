use chrono::{DateTime, Utc};
use serde::Serialize;

use super::alerts;
use super::domain::{
    CategorySet, EmployeeId, EnvelopeStatus, FolderId, UserId, Withdrawal, WithdrawalId,
    WithdrawalStatus,
};
use super::error::CustodyError;
use super::policy::CustodyPolicy;
use super::store::Tables;

/// What a return changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReturnReceipt {
    pub withdrawal_id: WithdrawalId,
    pub restored: CategorySet,
    pub alerts_resolved: usize,
}

/// Open an active withdrawal. The due date follows the employee's status right now.
pub(crate) fn open_withdrawal(
    tables: &mut Tables,
    policy: &CustodyPolicy,
    now: DateTime<Utc>,
    folder_id: FolderId,
    user_id: UserId,
    employee_id: EmployeeId,
    categories: CategorySet,
) -> Result<WithdrawalId, CustodyError> {
    if categories.is_empty() {
        return Err(CustodyError::validation(
            "a withdrawal needs at least one envelope",
        ));
    }
    tables.folder(folder_id)?;
    let status = tables.employee(employee_id)?.status;
    let due_at = policy.due_at(status, now)?;

    Ok(tables.withdrawals.insert_with(|id| Withdrawal {
        id,
        folder_id,
        user_id,
        employee_id,
        categories,
        started_at: now,
        due_at,
        returned_at: None,
        status: WithdrawalStatus::Active,
        elapsed_days: 0,
    }))
}

/// Return every envelope of the withdrawal and close its alerts.
///
/// Envelopes of a folder archived in the meantime are left as they are; the return is still
/// recorded.
pub(crate) fn finalize_withdrawal(
    tables: &mut Tables,
    now: DateTime<Utc>,
    withdrawal_id: WithdrawalId,
) -> Result<ReturnReceipt, CustodyError> {
    let withdrawal = tables.withdrawal(withdrawal_id)?;
    if !withdrawal.status.is_outstanding() {
        return Err(CustodyError::AlreadyFinalized { withdrawal_id });
    }
    let folder_id = withdrawal.folder_id;
    let categories = withdrawal.categories;

    let mut restored = CategorySet::empty();
    if !tables.folder(folder_id)?.archived {
        for category in categories.iter() {
            if let Some(envelope) = tables.envelope_mut(folder_id, category) {
                envelope.status = EnvelopeStatus::Present;
                restored.insert(category);
            }
        }
    }

    let withdrawal = tables.withdrawal_mut(withdrawal_id)?;
    withdrawal.status = WithdrawalStatus::Returned;
    withdrawal.returned_at = Some(now);

    let alerts_resolved = alerts::resolve_all_for(tables, withdrawal_id);

    Ok(ReturnReceipt {
        withdrawal_id,
        restored,
        alerts_resolved,
    })
}
