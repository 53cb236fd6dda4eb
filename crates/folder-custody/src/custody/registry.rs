//! Folder and envelope registry: cabinets, drawers, folders and drawer capacity accounting.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::domain::{
    Cabinet, CabinetId, Drawer, DrawerId, Employee, EmployeeId, EmployeeIdentity,
    EmployeeStatus, Envelope, EnvelopeCategory, EnvelopeStatus, Folder, FolderId,
};
use super::error::CustodyError;
use super::store::Tables;

/// Department stored when a new employee is registered without one.
pub const UNKNOWN_DEPARTMENT: &str = "Not informed";

/// Input for [`create_folder`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewFolder {
    pub drawer_id: DrawerId,
    pub employee: EmployeeIdentity,
    /// Defaults to the employee name when absent or blank.
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub order: u32,
}

pub(crate) fn register_cabinet(
    tables: &mut Tables,
    name: &str,
    location: &str,
) -> Result<CabinetId, CustodyError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(CustodyError::validation("cabinet name is required"));
    }

    Ok(tables.cabinets.insert_with(|id| Cabinet {
        id,
        name: name.to_string(),
        location: location.trim().to_string(),
    }))
}

pub(crate) fn register_drawer(
    tables: &mut Tables,
    cabinet_id: CabinetId,
    number: &str,
    capacity: u32,
) -> Result<DrawerId, CustodyError> {
    tables.cabinet(cabinet_id)?;

    let number = number.trim();
    if number.is_empty() {
        return Err(CustodyError::validation("drawer number is required"));
    }
    if capacity == 0 {
        return Err(CustodyError::validation("drawer capacity must be positive"));
    }
    let taken = tables.drawers.values().any(|drawer| {
        drawer.cabinet_id == cabinet_id && drawer.number.eq_ignore_ascii_case(number)
    });
    if taken {
        return Err(CustodyError::DuplicateDrawer {
            number: number.to_string(),
        });
    }

    Ok(tables.drawers.insert_with(|id| Drawer {
        id,
        cabinet_id,
        number: number.to_string(),
        capacity,
        occupancy: 0,
    }))
}

/// Register a folder with its four envelopes and take one slot of the drawer.
pub(crate) fn create_folder(
    tables: &mut Tables,
    today: NaiveDate,
    input: &NewFolder,
) -> Result<FolderId, CustodyError> {
    let drawer = tables.drawer(input.drawer_id)?;
    if drawer.is_full() {
        return Err(CustodyError::CapacityExceeded {
            drawer_id: drawer.id,
            capacity: drawer.capacity,
            occupancy: drawer.occupancy,
        });
    }

    let employee_id = resolve_employee(tables, &input.employee, today)?;

    let has_active_folder = tables
        .folders
        .values()
        .any(|folder| folder.employee_id == employee_id && folder.occupies_slot());
    if has_active_folder {
        return Err(CustodyError::DuplicateActiveFolder { employee_id });
    }

    let label = match input.label.as_deref().map(str::trim) {
        Some(label) if !label.is_empty() => label.to_string(),
        _ => tables.employee(employee_id)?.name.clone(),
    };

    let folder_id = tables.folders.insert_with(|id| Folder {
        id,
        drawer_id: input.drawer_id,
        employee_id,
        label,
        created_at: today,
        order: input.order,
        active: true,
        archived: false,
    });

    for category in EnvelopeCategory::ALL {
        tables.envelopes.insert_with(|id| Envelope {
            id,
            folder_id,
            category,
            status: EnvelopeStatus::Present,
        });
    }

    tables.drawer_mut(input.drawer_id)?.occupancy += 1;

    Ok(folder_id)
}

/// Archive a folder and release its drawer slot.
///
/// Returns `false` without touching anything when the folder no longer occupies a slot, so a
/// repeated call never releases the same slot twice.
pub(crate) fn archive_folder(tables: &mut Tables, folder_id: FolderId) -> Result<bool, CustodyError> {
    let folder = tables.folder_mut(folder_id)?;
    if !folder.occupies_slot() {
        return Ok(false);
    }
    folder.active = false;
    folder.archived = true;
    let drawer_id = folder.drawer_id;

    let drawer = tables.drawer_mut(drawer_id)?;
    drawer.occupancy = drawer.occupancy.saturating_sub(1);
    Ok(true)
}

/// Find the employee by badge, then by case-insensitive name, else register a new one.
/// Known employees only get blank fields filled in.
fn resolve_employee(
    tables: &mut Tables,
    identity: &EmployeeIdentity,
    today: NaiveDate,
) -> Result<EmployeeId, CustodyError> {
    let name = identity.name.trim();
    let badge = identity
        .badge_id
        .as_deref()
        .map(str::trim)
        .filter(|badge| !badge.is_empty())
        .map(str::to_uppercase);
    let department = identity
        .department
        .as_deref()
        .map(str::trim)
        .filter(|department| !department.is_empty());

    let by_badge = badge.as_deref().and_then(|badge| {
        tables
            .employees
            .values()
            .find(|employee| employee.badge_id.as_deref() == Some(badge))
            .map(|employee| employee.id)
    });

    // A record carrying a different badge is a different person, even with the same name.
    let existing = by_badge.or_else(|| {
        if name.is_empty() {
            return None;
        }
        tables
            .employees
            .values()
            .find(|employee| {
                employee.name.trim().to_lowercase() == name.to_lowercase()
                    && (badge.is_none() || employee.badge_id.is_none())
            })
            .map(|employee| employee.id)
    });

    match existing {
        Some(employee_id) => {
            let employee = tables.employee_mut(employee_id)?;
            fill_blanks(employee, badge, department);
            Ok(employee_id)
        }
        None => {
            if name.is_empty() {
                return Err(CustodyError::validation(
                    "employee name is required to register a folder",
                ));
            }
            Ok(tables.employees.insert_with(|id| Employee {
                id,
                name: name.to_string(),
                badge_id: badge,
                department: department.unwrap_or(UNKNOWN_DEPARTMENT).to_string(),
                hire_date: identity.hire_date.unwrap_or(today),
                dismissal_date: None,
                status: EmployeeStatus::Active,
            }))
        }
    }
}

fn fill_blanks(employee: &mut Employee, badge: Option<String>, department: Option<&str>) {
    if employee.badge_id.is_none() {
        employee.badge_id = badge;
    }
    let department_blank =
        employee.department.trim().is_empty() || employee.department == UNKNOWN_DEPARTMENT;
    if let (true, Some(department)) = (department_blank, department) {
        employee.department = department.to_string();
    }
}
