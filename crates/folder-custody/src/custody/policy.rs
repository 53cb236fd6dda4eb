use chrono::{DateTime, Duration, Utc};

use super::domain::EmployeeStatus;
use super::error::CustodyError;

/// Longest deadline accepted for either employee status, roughly ten years.
pub const MAX_DEADLINE_DAYS: i64 = 3650;

/// Return deadlines applied to withdrawals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CustodyPolicy {
    /// Days an active employee's envelopes may stay out.
    pub active_deadline_days: i64,
    /// Days a dismissed employee's envelopes may stay out.
    pub dismissed_deadline_days: i64,
    /// Days before the deadline at which a warning alert is raised.
    pub warning_window_days: i64,
}

impl Default for CustodyPolicy {
    fn default() -> Self {
        Self {
            active_deadline_days: 7,
            dismissed_deadline_days: 3,
            warning_window_days: 2,
        }
    }
}

impl CustodyPolicy {
    pub fn deadline_days(&self, status: EmployeeStatus) -> i64 {
        match status {
            EmployeeStatus::Active => self.active_deadline_days,
            EmployeeStatus::Dismissed => self.dismissed_deadline_days,
        }
    }

    pub fn due_at(
        &self,
        status: EmployeeStatus,
        started_at: DateTime<Utc>,
    ) -> Result<DateTime<Utc>, CustodyError> {
        let days = self.deadline_days(status);
        Duration::try_days(days)
            .and_then(|deadline| started_at.checked_add_signed(deadline))
            .ok_or_else(|| {
                CustodyError::validation(format!("a {days}-day deadline is out of range"))
            })
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.dismissed_deadline_days <= 0 {
            return Err("dismissed deadline must be at least one day".to_string());
        }
        if self.active_deadline_days > MAX_DEADLINE_DAYS {
            return Err(format!("active deadline cannot exceed {MAX_DEADLINE_DAYS} days"));
        }
        if self.dismissed_deadline_days > self.active_deadline_days {
            return Err("dismissed deadline cannot exceed the active deadline".to_string());
        }
        if self.warning_window_days < 0 || self.warning_window_days >= self.dismissed_deadline_days
        {
            return Err("warning window must be shorter than the dismissed deadline".to_string());
        }
        Ok(())
    }
}
