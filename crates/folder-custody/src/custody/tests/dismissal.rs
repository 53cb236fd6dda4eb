use super::common::*;
use crate::custody::EnvelopeCategory::{Medicine, Security};
use crate::custody::{CustodyError, EmployeeStatus, ErrorKind, WithdrawalStatus};
use chrono::NaiveDate;

fn dismissal_day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 12).expect("valid date")
}

#[test]
fn strict_dismissal_waits_for_outstanding_envelopes() {
    let (service, store, _) = build_service();
    let folder_id = seed_folder(&service, "Ana Souza");
    let employee_id = service.folder(folder_id).unwrap().employee_id;
    withdraw(&service, folder_id, &[Medicine]);

    let error = service
        .dismiss_employee(employee_id, dismissal_day(), SUPERVISOR)
        .expect_err("envelope still out");
    assert_eq!(error.kind(), ErrorKind::Consistency);
    match error {
        CustodyError::OutstandingEnvelopes { withdrawn, .. } => {
            assert_eq!(withdrawn, categories(&[Medicine]));
        }
        other => panic!("unexpected error {other:?}"),
    }

    let employee = service.employee(employee_id).unwrap();
    assert_eq!(employee.status, EmployeeStatus::Active);
    assert!(employee.dismissal_date.is_none());
    assert!(!service.folder(folder_id).unwrap().archived);
    assert_store_consistent(&store);
}

#[test]
fn strict_dismissal_archives_every_active_folder() {
    let (service, store, _) = build_service();
    let folder_id = seed_folder(&service, "Ana Souza");
    let employee_id = service.folder(folder_id).unwrap().employee_id;
    let drawer_id = service.folder(folder_id).unwrap().drawer_id;

    let receipt = service
        .dismiss_employee(employee_id, dismissal_day(), SUPERVISOR)
        .expect("dismissal succeeds");
    assert_eq!(receipt.archived_folders, vec![folder_id]);
    assert_eq!(receipt.dismissal_date, Some(dismissal_day()));

    let employee = service.employee(employee_id).unwrap();
    assert_eq!(employee.status, EmployeeStatus::Dismissed);
    assert_eq!(service.drawer(drawer_id).unwrap().occupancy, 0);
    assert_store_consistent(&store);
}

#[test]
fn repeated_dismissal_keeps_the_first_date_and_releases_nothing() {
    let (service, store, _) = build_service();
    let folder_id = seed_folder(&service, "Ana Souza");
    let employee_id = service.folder(folder_id).unwrap().employee_id;
    service
        .dismiss_employee(employee_id, dismissal_day(), SUPERVISOR)
        .unwrap();

    let later = NaiveDate::from_ymd_opt(2025, 4, 1).expect("valid date");
    let receipt = service
        .force_dismiss_employee(employee_id, later, SUPERVISOR)
        .expect("repeat succeeds");
    assert!(receipt.archived_folders.is_empty());
    assert_eq!(receipt.dismissal_date, Some(dismissal_day()));
    assert_store_consistent(&store);
}

#[test]
fn force_dismissal_archives_with_envelopes_out() {
    let (service, store, _) = build_service();
    let folder_id = seed_folder(&service, "Ana Souza");
    let employee_id = service.folder(folder_id).unwrap().employee_id;
    let withdrawal_id = withdraw(&service, folder_id, &[Security]);

    let receipt = service
        .force_dismiss_employee(employee_id, dismissal_day(), SUPERVISOR)
        .expect("force dismissal succeeds");
    assert_eq!(receipt.archived_folders, vec![folder_id]);
    assert!(service.folder(folder_id).unwrap().archived);

    let return_receipt = service
        .finalize_withdrawal(withdrawal_id, SUPERVISOR)
        .expect("the return is still recorded");
    assert!(return_receipt.restored.is_empty());
    assert_eq!(
        service.withdrawal(withdrawal_id).unwrap().status,
        WithdrawalStatus::Returned
    );
    assert_eq!(withdrawn(&service, folder_id), categories(&[Security]));
    assert_store_consistent(&store);
}

#[test]
fn unknown_employee_is_not_found() {
    let (service, _, _) = build_service();
    let error = service
        .dismiss_employee(crate::custody::EmployeeId(42), dismissal_day(), SUPERVISOR)
        .expect_err("missing employee");
    assert_eq!(error.kind(), ErrorKind::NotFound);
}
