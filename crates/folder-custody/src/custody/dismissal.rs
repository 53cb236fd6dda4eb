use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::domain::{CategorySet, EmployeeId, EmployeeStatus, EnvelopeStatus, FolderId};
use super::error::CustodyError;
use super::registry;
use super::store::Tables;

/// How a direct dismissal treats folders whose envelopes are still out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DismissalMode {
    /// Refuse while any envelope of the employee's active folders is withdrawn.
    #[default]
    Strict,
    /// Archive regardless of withdrawn envelopes.
    Force,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DismissalReceipt {
    pub employee_id: EmployeeId,
    pub dismissal_date: Option<NaiveDate>,
    pub archived_folders: Vec<FolderId>,
}

/// Set the employee Dismissed. A second dismissal keeps the first date.
pub(crate) fn mark_dismissed(
    tables: &mut Tables,
    employee_id: EmployeeId,
    date: NaiveDate,
) -> Result<bool, CustodyError> {
    let employee = tables.employee_mut(employee_id)?;
    if employee.status == EmployeeStatus::Dismissed {
        return Ok(false);
    }
    employee.status = EmployeeStatus::Dismissed;
    employee.dismissal_date = Some(date);
    Ok(true)
}

/// Dismiss an employee outside the request flow and archive every folder they still occupy.
pub(crate) fn dismiss_employee(
    tables: &mut Tables,
    employee_id: EmployeeId,
    date: NaiveDate,
    mode: DismissalMode,
) -> Result<DismissalReceipt, CustodyError> {
    tables.employee(employee_id)?;

    let folders: Vec<FolderId> = tables
        .folders
        .values()
        .filter(|folder| folder.employee_id == employee_id && folder.occupies_slot())
        .map(|folder| folder.id)
        .collect();

    if mode == DismissalMode::Strict {
        for &folder_id in &folders {
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
        }
    }

    mark_dismissed(tables, employee_id, date)?;

    let mut archived_folders = Vec::with_capacity(folders.len());
    for folder_id in folders {
        if registry::archive_folder(tables, folder_id)? {
            archived_folders.push(folder_id);
        }
    }

    Ok(DismissalReceipt {
        employee_id,
        dismissal_date: tables.employee(employee_id)?.dismissal_date,
        archived_folders,
    })
}
