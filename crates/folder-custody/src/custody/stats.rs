use serde::Serialize;

use super::domain::Severity;
use super::store::Tables;

/// Drawers at or above this fill ratio (and not yet full) need attention.
const ATTENTION_RATIO: f64 = 0.8;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub total_drawers: usize,
    pub full_drawers: usize,
    pub attention_drawers: usize,
    pub empty_drawers: usize,
    pub available_drawers: usize,
    pub active_folders: usize,
    pub outstanding_withdrawals: usize,
    pub critical_alerts: usize,
}

pub(crate) fn dashboard(tables: &Tables) -> DashboardStats {
    let mut stats = DashboardStats {
        total_drawers: tables.drawers.len(),
        ..DashboardStats::default()
    };

    for drawer in tables.drawers.values() {
        if drawer.is_full() {
            stats.full_drawers += 1;
        } else if drawer.capacity > 0
            && f64::from(drawer.occupancy) / f64::from(drawer.capacity) >= ATTENTION_RATIO
        {
            stats.attention_drawers += 1;
        }
        if drawer.occupancy == 0 {
            stats.empty_drawers += 1;
        }
    }
    stats.available_drawers = stats.total_drawers.saturating_sub(stats.full_drawers);

    stats.active_folders = tables
        .folders
        .values()
        .filter(|folder| folder.occupies_slot())
        .count();
    stats.outstanding_withdrawals = tables
        .withdrawals
        .values()
        .filter(|withdrawal| withdrawal.status.is_outstanding())
        .count();
    stats.critical_alerts = tables
        .alerts
        .values()
        .filter(|alert| !alert.resolved && alert.severity == Severity::Critical)
        .count();

    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::custody::domain::{CabinetId, Drawer};

    fn add_drawer(tables: &mut Tables, capacity: u32, occupancy: u32) {
        tables.drawers.insert_with(|id| Drawer {
            id,
            cabinet_id: CabinetId(1),
            number: format!("{}", id.0),
            capacity,
            occupancy,
        });
    }

    #[test]
    fn classifies_drawers_by_fill_level() {
        let mut tables = Tables::default();
        add_drawer(&mut tables, 10, 10);
        add_drawer(&mut tables, 10, 8);
        add_drawer(&mut tables, 10, 7);
        add_drawer(&mut tables, 10, 0);

        let stats = dashboard(&tables);
        assert_eq!(stats.total_drawers, 4);
        assert_eq!(stats.full_drawers, 1);
        assert_eq!(stats.attention_drawers, 1);
        assert_eq!(stats.empty_drawers, 1);
        assert_eq!(stats.available_drawers, 3);
    }
}
