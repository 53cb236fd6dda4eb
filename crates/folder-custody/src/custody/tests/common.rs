use std::sync::Arc;

use axum::response::Response;
use axum::Router;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::Value;

use crate::custody::store::{CustodyStore, StoreError, Tables};
use crate::custody::{
    custody_router, CategorySet, CustodyError, CustodyPolicy, CustodyService, DrawerId,
    EmployeeIdentity, EnvelopeCategory, EnvelopeStatus, FolderId, InMemoryStore, ManualClock,
    NewFolder, NewRequest, UserId, WithdrawalId,
};

pub(super) type MemoryService = CustodyService<InMemoryStore, ManualClock>;

pub(super) const CLERK: UserId = UserId(7);

/// Operator who approves, rejects and closes out custody work in tests.
pub(super) const SUPERVISOR: UserId = UserId(9);

pub(super) fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap()
}

pub(super) fn build_service() -> (MemoryService, Arc<InMemoryStore>, Arc<ManualClock>) {
    let store = Arc::new(InMemoryStore::new());
    let clock = Arc::new(ManualClock::new(start()));
    let service = CustodyService::new(store.clone(), clock.clone(), CustodyPolicy::default());
    (service, store, clock)
}

pub(super) fn custody_router_with_service(service: MemoryService) -> Router {
    custody_router(Arc::new(service))
}

pub(super) fn categories(list: &[EnvelopeCategory]) -> CategorySet {
    list.iter().copied().collect()
}

pub(super) fn seed_drawer(service: &MemoryService, capacity: u32) -> DrawerId {
    let cabinet_id = service
        .register_cabinet("Cabinet A", "Records room")
        .expect("cabinet registers");
    service
        .register_drawer(cabinet_id, "1", capacity)
        .expect("drawer registers")
}

pub(super) fn new_folder(drawer_id: DrawerId, name: &str, badge: Option<&str>) -> NewFolder {
    NewFolder {
        drawer_id,
        employee: EmployeeIdentity {
            name: name.to_string(),
            badge_id: badge.map(str::to_string),
            department: Some("Logistics".to_string()),
            hire_date: None,
        },
        label: None,
        order: 0,
    }
}

pub(super) fn seed_folder(service: &MemoryService, name: &str) -> FolderId {
    let drawer_id = seed_drawer(service, 10);
    service
        .create_folder(new_folder(drawer_id, name, None))
        .expect("folder is created")
}

pub(super) fn new_request(folder_id: FolderId, list: &[EnvelopeCategory]) -> NewRequest {
    NewRequest {
        folder_id,
        categories: categories(list),
        user_id: CLERK,
        reason: "audit review".to_string(),
        is_dismissal: false,
    }
}

/// Request and approve a withdrawal of `list`, returning its id.
pub(super) fn withdraw(
    service: &MemoryService,
    folder_id: FolderId,
    list: &[EnvelopeCategory],
) -> WithdrawalId {
    let request_id = service
        .create_request(new_request(folder_id, list))
        .expect("request is accepted");
    match service.approve_request(request_id, SUPERVISOR).expect("approval succeeds") {
        crate::custody::ApprovalOutcome::Withdrawal { withdrawal_id, .. } => withdrawal_id,
        other => panic!("expected a withdrawal, got {other:?}"),
    }
}

pub(super) fn advance_days(clock: &ManualClock, days: i64) {
    clock.advance(Duration::days(days));
}

pub(super) fn withdrawn(service: &MemoryService, folder_id: FolderId) -> CategorySet {
    service
        .envelopes(folder_id)
        .expect("envelopes load")
        .into_iter()
        .filter(|envelope| envelope.status == EnvelopeStatus::Withdrawn)
        .map(|envelope| envelope.category)
        .collect()
}

/// Every drawer's occupancy equals the number of folders holding a slot in it, and every folder
/// has exactly one envelope per category.
pub(super) fn assert_store_consistent(store: &InMemoryStore) {
    store
        .read(|tables| {
            for drawer in tables.drawers.values() {
                let active = tables
                    .folders
                    .values()
                    .filter(|folder| folder.drawer_id == drawer.id && folder.occupies_slot())
                    .count();
                assert_eq!(drawer.occupancy as usize, active, "drawer {}", drawer.id);
                assert!(drawer.occupancy <= drawer.capacity);
            }
            for folder in tables.folders.values() {
                let envelopes: CategorySet = tables
                    .envelopes_of(folder.id)
                    .map(|envelope| envelope.category)
                    .collect();
                assert_eq!(envelopes, CategorySet::all(), "folder {}", folder.id);
                assert_eq!(tables.envelopes_of(folder.id).count(), 4);
            }
            Ok(())
        })
        .expect("store readable");
}

/// Store that refuses every transaction.
#[derive(Debug, Default)]
pub(super) struct UnavailableStore;

impl CustodyStore for UnavailableStore {
    fn transaction<T, F>(&self, _work: F) -> Result<T, CustodyError>
    where
        F: FnOnce(&mut Tables) -> Result<T, CustodyError>,
    {
        Err(StoreError::Unavailable("disk detached".to_string()).into())
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
