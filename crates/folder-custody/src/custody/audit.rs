use chrono::{DateTime, Utc};

use super::domain::{AuditEntry, UserId};
use super::store::Tables;

/// Append an audit row inside the caller's transaction, so it commits or rolls back with the
/// change it describes.
pub(crate) fn record(
    tables: &mut Tables,
    now: DateTime<Utc>,
    user_id: Option<UserId>,
    action: &str,
    table: &str,
    record_id: Option<u64>,
    details: Option<String>,
) {
    tables.audit_log.insert_with(|id| AuditEntry {
        id,
        user_id,
        action: action.to_string(),
        table: table.to_string(),
        record_id,
        details,
        recorded_at: now,
    });
}

/// Newest entries first.
pub(crate) fn recent(tables: &Tables, limit: usize) -> Vec<AuditEntry> {
    let mut entries: Vec<AuditEntry> = tables.audit_log.values().cloned().collect();
    entries.sort_by(|a, b| b.recorded_at.cmp(&a.recorded_at).then(b.id.cmp(&a.id)));
    entries.truncate(limit);
    entries
}
