//! Withdrawal requests and envelope reservations.
//!
//! A Pending request reserves its categories on the folder: no second Pending request may ask
//! for any of them. Approval re-checks envelope availability inside the same transaction that
//! mutates the envelopes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::dismissal;
use super::domain::{
    CategorySet, EmployeeId, EnvelopeStatus, FolderId, RequestId, RequestStatus, UserId,
    WithdrawalId, WithdrawalRequest,
};
use super::error::CustodyError;
use super::policy::CustodyPolicy;
use super::registry;
use super::store::Tables;
use super::withdrawals;

/// Input for [`create_request`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRequest {
    pub folder_id: FolderId,
    pub categories: CategorySet,
    pub user_id: UserId,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub is_dismissal: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ApprovalOutcome {
    Withdrawal {
        request_id: RequestId,
        withdrawal_id: WithdrawalId,
    },
    Dismissal {
        request_id: RequestId,
        employee_id: EmployeeId,
        folder_id: FolderId,
        slot_released: bool,
    },
}

/// Union of the categories held by Pending requests on the folder.
pub(crate) fn reserved_categories(tables: &Tables, folder_id: FolderId) -> CategorySet {
    tables
        .requests
        .values()
        .filter(|request| {
            request.folder_id == Some(folder_id) && request.status == RequestStatus::Pending
        })
        .fold(CategorySet::empty(), |reserved, request| {
            reserved.union(request.categories)
        })
}

pub(crate) fn create_request(
    tables: &mut Tables,
    now: DateTime<Utc>,
    input: &NewRequest,
) -> Result<RequestId, CustodyError> {
    if input.categories.is_empty() {
        return Err(CustodyError::validation("select at least one envelope"));
    }

    let folder = tables.folder(input.folder_id)?;
    if folder.archived {
        return Err(CustodyError::FolderArchived {
            folder_id: folder.id,
        });
    }
    let employee_id = folder.employee_id;

    let reserved = reserved_categories(tables, input.folder_id);
    if let Some(category) = input.categories.intersection(reserved).iter().next() {
        return Err(CustodyError::CategoryReserved { category });
    }
    ensure_present(tables, input.folder_id, input.categories)?;

    Ok(tables.requests.insert_with(|id| WithdrawalRequest {
        id,
        employee_id,
        user_id: input.user_id,
        folder_id: Some(input.folder_id),
        reason: input.reason.trim().to_string(),
        status: RequestStatus::Pending,
        requested_at: now,
        approved_at: None,
        categories: input.categories,
        is_dismissal: input.is_dismissal,
        rejection_reason: None,
    }))
}

pub(crate) fn approve_request(
    tables: &mut Tables,
    policy: &CustodyPolicy,
    now: DateTime<Utc>,
    request_id: RequestId,
) -> Result<ApprovalOutcome, CustodyError> {
    let request = tables.request(request_id)?.clone();
    if request.status != RequestStatus::Pending {
        return Err(CustodyError::AlreadyProcessed { request_id });
    }
    let folder_id = request
        .folder_id
        .ok_or(CustodyError::MissingFolderLink { request_id })?;
    let folder = tables.folder(folder_id)?;
    tables.drawer(folder.drawer_id)?;
    let employee_id = folder.employee_id;
    let archived = folder.archived;

    if request.is_dismissal {
        let withdrawn: CategorySet = tables
            .envelopes_of(folder_id)
            .filter(|envelope| envelope.status == EnvelopeStatus::Withdrawn)
            .map(|envelope| envelope.category)
            .collect();
        if !withdrawn.is_empty() {
            return Err(CustodyError::OutstandingEnvelopes {
                folder_id,
                withdrawn,
            });
        }

        mark_approved(tables, request_id, now)?;
        dismissal::mark_dismissed(tables, employee_id, now.date_naive())?;
        let slot_released = registry::archive_folder(tables, folder_id)?;

        return Ok(ApprovalOutcome::Dismissal {
            request_id,
            employee_id,
            folder_id,
            slot_released,
        });
    }

    if archived {
        return Err(CustodyError::FolderArchived { folder_id });
    }
    ensure_present(tables, folder_id, request.categories)?;
    for category in request.categories.iter() {
        if let Some(envelope) = tables.envelope_mut(folder_id, category) {
            envelope.status = EnvelopeStatus::Withdrawn;
        }
    }
    mark_approved(tables, request_id, now)?;

    let withdrawal_id = withdrawals::open_withdrawal(
        tables,
        policy,
        now,
        folder_id,
        request.user_id,
        employee_id,
        request.categories,
    )?;

    Ok(ApprovalOutcome::Withdrawal {
        request_id,
        withdrawal_id,
    })
}

pub(crate) fn reject_request(
    tables: &mut Tables,
    request_id: RequestId,
    reason: Option<String>,
) -> Result<(), CustodyError> {
    let request = tables.request_mut(request_id)?;
    if request.status != RequestStatus::Pending {
        return Err(CustodyError::AlreadyProcessed { request_id });
    }
    request.status = RequestStatus::Rejected;
    request.rejection_reason = reason
        .map(|reason| reason.trim().to_string())
        .filter(|reason| !reason.is_empty());
    Ok(())
}

fn mark_approved(
    tables: &mut Tables,
    request_id: RequestId,
    now: DateTime<Utc>,
) -> Result<(), CustodyError> {
    let request = tables.request_mut(request_id)?;
    request.status = RequestStatus::Approved;
    request.approved_at = Some(now);
    Ok(())
}

fn ensure_present(
    tables: &Tables,
    folder_id: FolderId,
    categories: CategorySet,
) -> Result<(), CustodyError> {
    for category in categories.iter() {
        let present = tables
            .envelope(folder_id, category)
            .is_some_and(|envelope| envelope.status == EnvelopeStatus::Present);
        if !present {
            return Err(CustodyError::EnvelopeUnavailable { category });
        }
    }
    Ok(())
}
