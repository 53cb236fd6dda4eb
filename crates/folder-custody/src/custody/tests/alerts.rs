use super::common::*;
use crate::custody::EnvelopeCategory::{Personal, Training};
use crate::custody::{AlertKind, ErrorKind, Severity, WithdrawalStatus};
use chrono::Duration;

#[test]
fn warning_is_raised_inside_the_window_and_only_once() {
    let (service, _, clock) = build_service();
    let folder_id = seed_folder(&service, "Ana Souza");
    let withdrawal_id = withdraw(&service, folder_id, &[Personal]);

    advance_days(&clock, 4);
    let report = service.scan_alerts().unwrap();
    assert_eq!(report.scanned, 1);
    assert_eq!(report.warnings_raised, 0);

    advance_days(&clock, 1);
    let report = service.scan_alerts().unwrap();
    assert_eq!(report.warnings_raised, 1);
    let again = service.scan_alerts().unwrap();
    assert_eq!(again.warnings_raised, 0);

    let alerts = service.unresolved_alerts().unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].kind, AlertKind::Approaching);
    assert_eq!(alerts[0].severity, Severity::Warning);
    assert_eq!(
        alerts[0].detail,
        "return deadline approaching (2 days remaining)"
    );
    assert_eq!(service.withdrawal(withdrawal_id).unwrap().elapsed_days, 5);
    assert_eq!(
        service.withdrawal(withdrawal_id).unwrap().status,
        WithdrawalStatus::Active
    );
}

#[test]
fn deadline_marks_withdrawal_overdue_with_a_critical_alert() {
    let (service, _, clock) = build_service();
    let folder_id = seed_folder(&service, "Ana Souza");
    let withdrawal_id = withdraw(&service, folder_id, &[Personal]);

    advance_days(&clock, 6);
    service.scan_alerts().unwrap();
    advance_days(&clock, 2);
    let report = service.scan_alerts().unwrap();
    assert_eq!(report.marked_overdue, 1);
    assert_eq!(report.criticals_raised, 1);

    let later = service.scan_alerts().unwrap();
    assert_eq!(later.marked_overdue, 0);
    assert_eq!(later.criticals_raised, 0);

    let withdrawal = service.withdrawal(withdrawal_id).unwrap();
    assert_eq!(withdrawal.status, WithdrawalStatus::Overdue);
    assert_eq!(withdrawal.elapsed_days, 8);

    let alerts = service.unresolved_alerts().unwrap();
    assert_eq!(alerts.len(), 2);
    assert_eq!(alerts[0].severity, Severity::Critical);
    assert_eq!(alerts[0].detail, "return deadline passed (overdue by 1 day)");
    assert_eq!(alerts[1].severity, Severity::Warning);
}

#[test]
fn overdue_is_kept_even_if_the_clock_moves_back() {
    let (service, _, clock) = build_service();
    let folder_id = seed_folder(&service, "Ana Souza");
    let withdrawal_id = withdraw(&service, folder_id, &[Personal]);

    advance_days(&clock, 9);
    service.scan_alerts().unwrap();
    clock.set(start() + Duration::days(1));
    service.scan_alerts().unwrap();

    let withdrawal = service.withdrawal(withdrawal_id).unwrap();
    assert_eq!(withdrawal.status, WithdrawalStatus::Overdue);
    assert_eq!(withdrawal.elapsed_days, 1);
}

#[test]
fn dismissal_shortens_the_deadline_of_withdrawals_already_out() {
    let (service, _, clock) = build_service();
    let folder_id = seed_folder(&service, "Ana Souza");
    let employee_id = service.folder(folder_id).unwrap().employee_id;
    let withdrawal_id = withdraw(&service, folder_id, &[Training]);

    advance_days(&clock, 2);
    service
        .force_dismiss_employee(
            employee_id,
            (start() + Duration::days(2)).date_naive(),
            SUPERVISOR,
        )
        .expect("force dismissal succeeds");
    advance_days(&clock, 1);
    service.scan_alerts().unwrap();

    let withdrawal = service.withdrawal(withdrawal_id).unwrap();
    assert_eq!(withdrawal.status, WithdrawalStatus::Overdue);
    assert_eq!(withdrawal.due_at, start() + Duration::days(7));
    let alerts = service.unresolved_alerts().unwrap();
    assert_eq!(alerts[0].kind, AlertKind::Expired);
}

#[test]
fn manual_resolution_is_idempotent() {
    let (service, _, clock) = build_service();
    let folder_id = seed_folder(&service, "Ana Souza");
    withdraw(&service, folder_id, &[Personal]);
    advance_days(&clock, 5);
    service.scan_alerts().unwrap();

    let alert_id = service.unresolved_alerts().unwrap()[0].alert_id;
    assert!(service.resolve_alert(alert_id).unwrap());
    assert!(!service.resolve_alert(alert_id).unwrap());
    assert!(service.unresolved_alerts().unwrap().is_empty());

    let error = service
        .resolve_alert(crate::custody::AlertId(999))
        .expect_err("missing alert");
    assert_eq!(error.kind(), ErrorKind::NotFound);
}

#[test]
fn resolved_warning_is_raised_again_on_the_next_scan() {
    let (service, _, clock) = build_service();
    let folder_id = seed_folder(&service, "Ana Souza");
    withdraw(&service, folder_id, &[Personal]);
    advance_days(&clock, 5);
    service.scan_alerts().unwrap();

    let alert_id = service.unresolved_alerts().unwrap()[0].alert_id;
    service.resolve_alert(alert_id).unwrap();
    let report = service.scan_alerts().unwrap();
    assert_eq!(report.warnings_raised, 1);
}

#[test]
fn dashboard_scans_before_counting() {
    let (service, _, clock) = build_service();
    let drawer_id = seed_drawer(&service, 1);
    let folder_id = service
        .create_folder(new_folder(drawer_id, "Ana Souza", None))
        .unwrap();
    seed_drawer(&service, 5);
    withdraw(&service, folder_id, &[Personal]);
    advance_days(&clock, 7);

    let stats = service.dashboard().expect("dashboard computes");
    assert_eq!(stats.total_drawers, 2);
    assert_eq!(stats.full_drawers, 1);
    assert_eq!(stats.empty_drawers, 1);
    assert_eq!(stats.available_drawers, 1);
    assert_eq!(stats.active_folders, 1);
    assert_eq!(stats.outstanding_withdrawals, 1);
    assert_eq!(stats.critical_alerts, 1);
}
