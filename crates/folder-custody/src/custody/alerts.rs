//! Deadline scan over outstanding withdrawals.
//!
//! Each scan recomputes the elapsed days of every Active or Overdue withdrawal and derives the
//! deadline from the employee's status at scan time, not the status the withdrawal was opened
//! under. A dismissal therefore shortens the deadline of withdrawals already out.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::domain::{Alert, AlertId, AlertKind, WithdrawalId, WithdrawalStatus};
use super::error::CustodyError;
use super::policy::CustodyPolicy;
use super::store::Tables;

const SECONDS_PER_DAY: i64 = 86_400;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScanReport {
    pub scanned: usize,
    pub marked_overdue: usize,
    pub warnings_raised: usize,
    pub criticals_raised: usize,
}

/// Whole days between `started_at` and `now`, rounded down.
pub fn elapsed_days(started_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - started_at).num_seconds().div_euclid(SECONDS_PER_DAY)
}

pub(crate) fn scan(
    tables: &mut Tables,
    policy: &CustodyPolicy,
    now: DateTime<Utc>,
) -> Result<ScanReport, CustodyError> {
    let outstanding: Vec<WithdrawalId> = tables
        .withdrawals
        .values()
        .filter(|withdrawal| withdrawal.status.is_outstanding())
        .map(|withdrawal| withdrawal.id)
        .collect();

    let mut report = ScanReport {
        scanned: outstanding.len(),
        ..ScanReport::default()
    };

    for withdrawal_id in outstanding {
        let employee_id = tables.withdrawal(withdrawal_id)?.employee_id;
        let deadline = policy.deadline_days(tables.employee(employee_id)?.status);

        let withdrawal = tables.withdrawal_mut(withdrawal_id)?;
        let elapsed = elapsed_days(withdrawal.started_at, now);
        withdrawal.elapsed_days = elapsed;

        if elapsed >= deadline {
            if withdrawal.status == WithdrawalStatus::Active {
                withdrawal.status = WithdrawalStatus::Overdue;
                report.marked_overdue += 1;
            }
            if ensure_alert(tables, withdrawal_id, AlertKind::Expired, now) {
                report.criticals_raised += 1;
            }
        } else if elapsed >= deadline - policy.warning_window_days
            && ensure_alert(tables, withdrawal_id, AlertKind::Approaching, now)
        {
            report.warnings_raised += 1;
        }
    }

    Ok(report)
}

/// Insert an unresolved alert of `kind` unless one already exists. Returns whether a row was
/// inserted.
pub(crate) fn ensure_alert(
    tables: &mut Tables,
    withdrawal_id: WithdrawalId,
    kind: AlertKind,
    now: DateTime<Utc>,
) -> bool {
    let exists = tables.alerts.values().any(|alert| {
        alert.withdrawal_id == withdrawal_id && alert.kind == kind && !alert.resolved
    });
    if exists {
        return false;
    }

    tables.alerts.insert_with(|id| Alert {
        id,
        withdrawal_id,
        kind,
        severity: kind.severity(),
        created_at: now,
        resolved: false,
    });
    true
}

pub(crate) fn resolve_all_for(tables: &mut Tables, withdrawal_id: WithdrawalId) -> usize {
    let mut resolved = 0;
    for alert in tables.alerts.values_mut() {
        if alert.withdrawal_id == withdrawal_id && !alert.resolved {
            alert.resolved = true;
            resolved += 1;
        }
    }
    resolved
}

/// Resolve one alert by hand. Returns `false` if it was already resolved.
pub(crate) fn resolve_alert(tables: &mut Tables, alert_id: AlertId) -> Result<bool, CustodyError> {
    let alert = tables
        .alerts
        .get_mut(alert_id)
        .ok_or(CustodyError::not_found("alert", alert_id.0))?;
    if alert.resolved {
        return Ok(false);
    }
    alert.resolved = true;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn elapsed_days_rounds_down() {
        let start = Utc.with_ymd_and_hms(2025, 5, 1, 12, 0, 0).unwrap();
        assert_eq!(elapsed_days(start, start + Duration::hours(23)), 0);
        assert_eq!(elapsed_days(start, start + Duration::hours(24)), 1);
        assert_eq!(elapsed_days(start, start + Duration::hours(71)), 2);
    }

    #[test]
    fn elapsed_days_is_negative_when_clock_is_behind() {
        let start = Utc.with_ymd_and_hms(2025, 5, 1, 12, 0, 0).unwrap();
        assert_eq!(elapsed_days(start, start - Duration::hours(1)), -1);
    }
}
