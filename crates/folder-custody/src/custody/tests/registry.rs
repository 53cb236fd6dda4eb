use super::common::*;
use crate::custody::{
    CustodyError, EmployeeIdentity, EnvelopeStatus, ErrorKind, NewFolder, UNKNOWN_DEPARTMENT,
};

#[test]
fn create_folder_fills_the_last_slot_then_reports_capacity() {
    let (service, store, _) = build_service();
    let drawer_id = seed_drawer(&service, 2);

    service
        .create_folder(new_folder(drawer_id, "Ana Souza", Some("b-1")))
        .expect("first folder fits");
    service
        .create_folder(new_folder(drawer_id, "Bruno Lima", Some("b-2")))
        .expect("second folder fills the drawer");
    assert_eq!(service.drawer(drawer_id).unwrap().occupancy, 2);

    let error = service
        .create_folder(new_folder(drawer_id, "Carla Dias", Some("b-3")))
        .expect_err("drawer is full");
    assert_eq!(error.kind(), ErrorKind::Capacity);
    assert_eq!(service.drawer(drawer_id).unwrap().occupancy, 2);
    assert_eq!(service.employees().unwrap().len(), 2);
    assert_store_consistent(&store);
}

#[test]
fn new_folder_starts_with_every_envelope_present() {
    let (service, store, _) = build_service();
    let folder_id = seed_folder(&service, "Ana Souza");

    let envelopes = service.envelopes(folder_id).expect("envelopes load");
    assert_eq!(envelopes.len(), 4);
    assert!(envelopes
        .iter()
        .all(|envelope| envelope.status == EnvelopeStatus::Present));

    let folder = service.folder(folder_id).expect("folder loads");
    assert_eq!(folder.label, "Ana Souza");
    assert!(folder.active && !folder.archived);
    assert_eq!(folder.created_at, start().date_naive());
    assert_store_consistent(&store);
}

#[test]
fn badge_is_normalized_and_reused_for_known_employees() {
    let (service, _, _) = build_service();
    let drawer_id = seed_drawer(&service, 10);

    let first = service
        .create_folder(new_folder(drawer_id, "Ana Souza", Some(" ab-12 ")))
        .expect("folder is created");
    let employee_id = service.folder(first).unwrap().employee_id;
    assert_eq!(
        service.employee(employee_id).unwrap().badge_id.as_deref(),
        Some("AB-12")
    );

    service.archive_folder(first).expect("archive succeeds");
    let second = service
        .create_folder(new_folder(drawer_id, "Ana S.", Some("AB-12")))
        .expect("employee can get a new folder once the old one is archived");
    assert_eq!(service.folder(second).unwrap().employee_id, employee_id);
    assert_eq!(service.employees().unwrap().len(), 1);
}

#[test]
fn a_second_active_folder_for_the_same_employee_is_rejected() {
    let (service, store, _) = build_service();
    let drawer_id = seed_drawer(&service, 10);

    service
        .create_folder(new_folder(drawer_id, "Ana Souza", None))
        .expect("folder is created");
    let error = service
        .create_folder(new_folder(drawer_id, "  ana souza ", None))
        .expect_err("duplicate folder");

    assert!(matches!(error, CustodyError::DuplicateActiveFolder { .. }));
    assert_eq!(service.drawer(drawer_id).unwrap().occupancy, 1);
    assert_store_consistent(&store);
}

#[test]
fn missing_details_fall_back_to_defaults() {
    let (service, _, _) = build_service();
    let drawer_id = seed_drawer(&service, 10);

    let folder_id = service
        .create_folder(NewFolder {
            drawer_id,
            employee: EmployeeIdentity {
                name: "Davi Rocha".to_string(),
                badge_id: None,
                department: Some("   ".to_string()),
                hire_date: None,
            },
            label: Some("Rocha, D.".to_string()),
            order: 3,
        })
        .expect("folder is created");

    let folder = service.folder(folder_id).unwrap();
    assert_eq!(folder.label, "Rocha, D.");
    let employee = service.employee(folder.employee_id).unwrap();
    assert_eq!(employee.department, UNKNOWN_DEPARTMENT);
    assert_eq!(employee.hire_date, start().date_naive());
    assert!(employee.badge_id.is_none());
}

#[test]
fn known_employee_gets_blank_department_filled_in() {
    let (service, _, _) = build_service();
    let drawer_id = seed_drawer(&service, 10);

    let mut input = new_folder(drawer_id, "Davi Rocha", None);
    input.employee.department = None;
    let folder_id = service.create_folder(input).expect("folder is created");
    service.archive_folder(folder_id).expect("archive succeeds");

    let again = service
        .create_folder(new_folder(drawer_id, "Davi Rocha", Some("dr-9")))
        .expect("folder is created");
    let employee = service
        .employee(service.folder(again).unwrap().employee_id)
        .unwrap();
    assert_eq!(employee.department, "Logistics");
    assert_eq!(employee.badge_id.as_deref(), Some("DR-9"));
}

#[test]
fn blank_name_without_known_badge_is_a_validation_error() {
    let (service, _, _) = build_service();
    let drawer_id = seed_drawer(&service, 10);

    let error = service
        .create_folder(new_folder(drawer_id, "  ", Some("zz-1")))
        .expect_err("name is required");
    assert_eq!(error.kind(), ErrorKind::Validation);
    assert_eq!(service.drawer(drawer_id).unwrap().occupancy, 0);
}

#[test]
fn unknown_drawer_is_not_found() {
    let (service, _, _) = build_service();
    let error = service
        .create_folder(new_folder(crate::custody::DrawerId(99), "Ana", None))
        .expect_err("drawer missing");
    assert_eq!(error.kind(), ErrorKind::NotFound);
}

#[test]
fn archive_releases_the_slot_exactly_once() {
    let (service, store, _) = build_service();
    let folder_id = seed_folder(&service, "Ana Souza");
    let drawer_id = service.folder(folder_id).unwrap().drawer_id;

    assert!(service.archive_folder(folder_id).expect("archive succeeds"));
    assert!(!service.archive_folder(folder_id).expect("repeat is a no-op"));

    let folder = service.folder(folder_id).unwrap();
    assert!(folder.archived && !folder.active);
    assert_eq!(service.drawer(drawer_id).unwrap().occupancy, 0);
    assert_store_consistent(&store);
}

#[test]
fn drawer_registration_validates_capacity_and_number() {
    let (service, _, _) = build_service();
    let cabinet_id = service
        .register_cabinet("Cabinet B", "Second floor")
        .expect("cabinet registers");

    let zero = service
        .register_drawer(cabinet_id, "1", 0)
        .expect_err("zero capacity");
    assert_eq!(zero.kind(), ErrorKind::Validation);

    service
        .register_drawer(cabinet_id, "A1", 20)
        .expect("drawer registers");
    let duplicate = service
        .register_drawer(cabinet_id, "a1", 20)
        .expect_err("number is taken");
    assert!(matches!(duplicate, CustodyError::DuplicateDrawer { .. }));

    let other_cabinet = service
        .register_cabinet("Cabinet C", "Annex")
        .expect("cabinet registers");
    service
        .register_drawer(other_cabinet, "A1", 20)
        .expect("numbers are unique per cabinet only");
    assert_eq!(service.drawers(Some(cabinet_id)).unwrap().len(), 1);
    assert_eq!(service.drawers(None).unwrap().len(), 2);
}

#[test]
fn folders_in_drawer_lists_active_folders_in_shelf_order() {
    let (service, _, _) = build_service();
    let drawer_id = seed_drawer(&service, 10);

    let mut late = new_folder(drawer_id, "Zoe Prado", None);
    late.order = 2;
    let mut early = new_folder(drawer_id, "Yuri Alves", None);
    early.order = 1;
    let late_id = service.create_folder(late).unwrap();
    let early_id = service.create_folder(early).unwrap();
    let archived = service
        .create_folder(new_folder(drawer_id, "Xavier Reis", None))
        .unwrap();
    service.archive_folder(archived).unwrap();

    let listed: Vec<_> = service
        .folders_in_drawer(drawer_id)
        .unwrap()
        .into_iter()
        .map(|view| view.folder.id)
        .collect();
    assert_eq!(listed, vec![early_id, late_id]);
}
