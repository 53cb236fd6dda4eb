use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::clock::Clock;
use super::domain::{
    AlertId, CabinetId, DrawerId, EmployeeId, Envelope, Folder, FolderId, RequestId, UserId,
    WithdrawalId,
};
use super::error::{CustodyError, ErrorKind};
use super::registry::NewFolder;
use super::requests::NewRequest;
use super::service::CustodyService;
use super::store::CustodyStore;

const DEFAULT_AUDIT_LIMIT: usize = 50;

/// Router builder exposing the custody operations over HTTP.
pub fn custody_router<S, C>(service: Arc<CustodyService<S, C>>) -> Router
where
    S: CustodyStore + 'static,
    C: Clock + 'static,
{
    Router::new()
        .route(
            "/api/v1/cabinets",
            get(list_cabinets_handler::<S, C>).post(register_cabinet_handler::<S, C>),
        )
        .route(
            "/api/v1/drawers",
            get(list_drawers_handler::<S, C>).post(register_drawer_handler::<S, C>),
        )
        .route(
            "/api/v1/drawers/:drawer_id/folders",
            get(drawer_folders_handler::<S, C>),
        )
        .route("/api/v1/folders", post(create_folder_handler::<S, C>))
        .route("/api/v1/folders/:folder_id", get(folder_handler::<S, C>))
        .route(
            "/api/v1/folders/:folder_id/archive",
            post(archive_folder_handler::<S, C>),
        )
        .route("/api/v1/employees", get(list_employees_handler::<S, C>))
        .route(
            "/api/v1/employees/:employee_id",
            get(employee_handler::<S, C>),
        )
        .route(
            "/api/v1/employees/:employee_id/dismiss",
            post(dismiss_employee_handler::<S, C>),
        )
        .route("/api/v1/requests", post(create_request_handler::<S, C>))
        .route(
            "/api/v1/requests/pending",
            get(pending_requests_handler::<S, C>),
        )
        .route("/api/v1/requests/:request_id", get(request_handler::<S, C>))
        .route(
            "/api/v1/requests/:request_id/approve",
            post(approve_request_handler::<S, C>),
        )
        .route(
            "/api/v1/requests/:request_id/reject",
            post(reject_request_handler::<S, C>),
        )
        .route(
            "/api/v1/withdrawals",
            get(outstanding_withdrawals_handler::<S, C>),
        )
        .route(
            "/api/v1/withdrawals/:withdrawal_id",
            get(withdrawal_handler::<S, C>),
        )
        .route(
            "/api/v1/withdrawals/:withdrawal_id/return",
            post(finalize_withdrawal_handler::<S, C>),
        )
        .route(
            "/api/v1/users/:user_id/withdrawals",
            get(user_withdrawals_handler::<S, C>),
        )
        .route("/api/v1/alerts", get(unresolved_alerts_handler::<S, C>))
        .route("/api/v1/alerts/scan", post(scan_alerts_handler::<S, C>))
        .route(
            "/api/v1/alerts/:alert_id/resolve",
            post(resolve_alert_handler::<S, C>),
        )
        .route("/api/v1/dashboard", get(dashboard_handler::<S, C>))
        .route("/api/v1/audit", get(audit_log_handler::<S, C>))
        .with_state(service)
}

impl IntoResponse for CustodyError {
    fn into_response(self) -> Response {
        let status = match self.kind() {
            ErrorKind::Validation => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorKind::Capacity | ErrorKind::Conflict | ErrorKind::Consistency => {
                StatusCode::CONFLICT
            }
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Storage => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self.to_failure())).into_response()
    }
}

fn respond<T: Serialize>(status: StatusCode, result: Result<T, CustodyError>) -> Response {
    match result {
        Ok(value) => (status, Json(value)).into_response(),
        Err(error) => error.into_response(),
    }
}

fn created<T: Serialize>(result: Result<T, CustodyError>) -> Response {
    respond(StatusCode::CREATED, result.map(|id| json!({ "ok": true, "id": id })))
}

/// Unwraps a JSON body, turning axum's rejection into a validation failure.
fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, CustodyError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| CustodyError::validation(rejection.body_text()))
}

#[derive(Debug, Deserialize)]
pub(crate) struct CabinetPayload {
    pub name: String,
    #[serde(default)]
    pub location: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DrawerPayload {
    pub cabinet_id: CabinetId,
    pub number: String,
    pub capacity: u32,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DrawerFilter {
    pub cabinet_id: Option<CabinetId>,
}

/// Operator performing a state change.
#[derive(Debug, Deserialize)]
pub(crate) struct ActorPayload {
    pub user_id: UserId,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RejectPayload {
    pub user_id: UserId,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DismissPayload {
    pub user_id: UserId,
    pub dismissal_date: NaiveDate,
    #[serde(default)]
    pub force: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AuditQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
struct FolderDetail {
    folder: Folder,
    envelopes: Vec<Envelope>,
}

pub(crate) async fn register_cabinet_handler<S, C>(
    State(service): State<Arc<CustodyService<S, C>>>,
    payload: Result<Json<CabinetPayload>, JsonRejection>,
) -> Response
where
    S: CustodyStore + 'static,
    C: Clock + 'static,
{
    created(body(payload).and_then(|payload| {
        service.register_cabinet(&payload.name, &payload.location)
    }))
}

pub(crate) async fn list_cabinets_handler<S, C>(
    State(service): State<Arc<CustodyService<S, C>>>,
) -> Response
where
    S: CustodyStore + 'static,
    C: Clock + 'static,
{
    respond(StatusCode::OK, service.cabinets())
}

pub(crate) async fn register_drawer_handler<S, C>(
    State(service): State<Arc<CustodyService<S, C>>>,
    payload: Result<Json<DrawerPayload>, JsonRejection>,
) -> Response
where
    S: CustodyStore + 'static,
    C: Clock + 'static,
{
    created(body(payload).and_then(|payload| {
        service.register_drawer(payload.cabinet_id, &payload.number, payload.capacity)
    }))
}

pub(crate) async fn list_drawers_handler<S, C>(
    State(service): State<Arc<CustodyService<S, C>>>,
    Query(filter): Query<DrawerFilter>,
) -> Response
where
    S: CustodyStore + 'static,
    C: Clock + 'static,
{
    respond(StatusCode::OK, service.drawers(filter.cabinet_id))
}

pub(crate) async fn drawer_folders_handler<S, C>(
    State(service): State<Arc<CustodyService<S, C>>>,
    Path(drawer_id): Path<u64>,
) -> Response
where
    S: CustodyStore + 'static,
    C: Clock + 'static,
{
    respond(StatusCode::OK, service.folders_in_drawer(DrawerId(drawer_id)))
}

pub(crate) async fn create_folder_handler<S, C>(
    State(service): State<Arc<CustodyService<S, C>>>,
    payload: Result<Json<NewFolder>, JsonRejection>,
) -> Response
where
    S: CustodyStore + 'static,
    C: Clock + 'static,
{
    created(body(payload).and_then(|payload| service.create_folder(payload)))
}

pub(crate) async fn folder_handler<S, C>(
    State(service): State<Arc<CustodyService<S, C>>>,
    Path(folder_id): Path<u64>,
) -> Response
where
    S: CustodyStore + 'static,
    C: Clock + 'static,
{
    let folder_id = FolderId(folder_id);
    let detail = service.folder(folder_id).and_then(|folder| {
        Ok(FolderDetail {
            folder,
            envelopes: service.envelopes(folder_id)?,
        })
    });
    respond(StatusCode::OK, detail)
}

pub(crate) async fn archive_folder_handler<S, C>(
    State(service): State<Arc<CustodyService<S, C>>>,
    Path(folder_id): Path<u64>,
) -> Response
where
    S: CustodyStore + 'static,
    C: Clock + 'static,
{
    let result = service
        .archive_folder(FolderId(folder_id))
        .map(|released| json!({ "ok": true, "slot_released": released }));
    respond(StatusCode::OK, result)
}

pub(crate) async fn list_employees_handler<S, C>(
    State(service): State<Arc<CustodyService<S, C>>>,
) -> Response
where
    S: CustodyStore + 'static,
    C: Clock + 'static,
{
    respond(StatusCode::OK, service.employees())
}

pub(crate) async fn employee_handler<S, C>(
    State(service): State<Arc<CustodyService<S, C>>>,
    Path(employee_id): Path<u64>,
) -> Response
where
    S: CustodyStore + 'static,
    C: Clock + 'static,
{
    respond(StatusCode::OK, service.employee(EmployeeId(employee_id)))
}

pub(crate) async fn dismiss_employee_handler<S, C>(
    State(service): State<Arc<CustodyService<S, C>>>,
    Path(employee_id): Path<u64>,
    payload: Result<Json<DismissPayload>, JsonRejection>,
) -> Response
where
    S: CustodyStore + 'static,
    C: Clock + 'static,
{
    let employee_id = EmployeeId(employee_id);
    let result = body(payload).and_then(|payload| {
        if payload.force {
            service.force_dismiss_employee(employee_id, payload.dismissal_date, payload.user_id)
        } else {
            service.dismiss_employee(employee_id, payload.dismissal_date, payload.user_id)
        }
    });
    respond(StatusCode::OK, result)
}

pub(crate) async fn create_request_handler<S, C>(
    State(service): State<Arc<CustodyService<S, C>>>,
    payload: Result<Json<NewRequest>, JsonRejection>,
) -> Response
where
    S: CustodyStore + 'static,
    C: Clock + 'static,
{
    created(body(payload).and_then(|payload| service.create_request(payload)))
}

pub(crate) async fn pending_requests_handler<S, C>(
    State(service): State<Arc<CustodyService<S, C>>>,
) -> Response
where
    S: CustodyStore + 'static,
    C: Clock + 'static,
{
    respond(StatusCode::OK, service.pending_requests())
}

pub(crate) async fn request_handler<S, C>(
    State(service): State<Arc<CustodyService<S, C>>>,
    Path(request_id): Path<u64>,
) -> Response
where
    S: CustodyStore + 'static,
    C: Clock + 'static,
{
    respond(StatusCode::OK, service.request(RequestId(request_id)))
}

pub(crate) async fn approve_request_handler<S, C>(
    State(service): State<Arc<CustodyService<S, C>>>,
    Path(request_id): Path<u64>,
    payload: Result<Json<ActorPayload>, JsonRejection>,
) -> Response
where
    S: CustodyStore + 'static,
    C: Clock + 'static,
{
    let result = body(payload)
        .and_then(|actor| service.approve_request(RequestId(request_id), actor.user_id));
    respond(StatusCode::OK, result)
}

pub(crate) async fn reject_request_handler<S, C>(
    State(service): State<Arc<CustodyService<S, C>>>,
    Path(request_id): Path<u64>,
    payload: Result<Json<RejectPayload>, JsonRejection>,
) -> Response
where
    S: CustodyStore + 'static,
    C: Clock + 'static,
{
    let result = body(payload)
        .and_then(|payload| {
            service.reject_request(RequestId(request_id), payload.user_id, payload.reason)
        })
        .map(|()| json!({ "ok": true }));
    respond(StatusCode::OK, result)
}

pub(crate) async fn outstanding_withdrawals_handler<S, C>(
    State(service): State<Arc<CustodyService<S, C>>>,
) -> Response
where
    S: CustodyStore + 'static,
    C: Clock + 'static,
{
    respond(StatusCode::OK, service.outstanding_withdrawals())
}

pub(crate) async fn withdrawal_handler<S, C>(
    State(service): State<Arc<CustodyService<S, C>>>,
    Path(withdrawal_id): Path<u64>,
) -> Response
where
    S: CustodyStore + 'static,
    C: Clock + 'static,
{
    respond(StatusCode::OK, service.withdrawal(WithdrawalId(withdrawal_id)))
}

pub(crate) async fn user_withdrawals_handler<S, C>(
    State(service): State<Arc<CustodyService<S, C>>>,
    Path(user_id): Path<u64>,
) -> Response
where
    S: CustodyStore + 'static,
    C: Clock + 'static,
{
    respond(StatusCode::OK, service.withdrawals_for_user(UserId(user_id)))
}

pub(crate) async fn finalize_withdrawal_handler<S, C>(
    State(service): State<Arc<CustodyService<S, C>>>,
    Path(withdrawal_id): Path<u64>,
    payload: Result<Json<ActorPayload>, JsonRejection>,
) -> Response
where
    S: CustodyStore + 'static,
    C: Clock + 'static,
{
    let result = body(payload).and_then(|actor| {
        service.finalize_withdrawal(WithdrawalId(withdrawal_id), actor.user_id)
    });
    respond(StatusCode::OK, result)
}

pub(crate) async fn unresolved_alerts_handler<S, C>(
    State(service): State<Arc<CustodyService<S, C>>>,
) -> Response
where
    S: CustodyStore + 'static,
    C: Clock + 'static,
{
    respond(StatusCode::OK, service.unresolved_alerts())
}

pub(crate) async fn scan_alerts_handler<S, C>(
    State(service): State<Arc<CustodyService<S, C>>>,
) -> Response
where
    S: CustodyStore + 'static,
    C: Clock + 'static,
{
    respond(StatusCode::OK, service.scan_alerts())
}

pub(crate) async fn resolve_alert_handler<S, C>(
    State(service): State<Arc<CustodyService<S, C>>>,
    Path(alert_id): Path<u64>,
) -> Response
where
    S: CustodyStore + 'static,
    C: Clock + 'static,
{
    let result = service
        .resolve_alert(AlertId(alert_id))
        .map(|resolved| json!({ "ok": true, "resolved": resolved }));
    respond(StatusCode::OK, result)
}

pub(crate) async fn dashboard_handler<S, C>(
    State(service): State<Arc<CustodyService<S, C>>>,
) -> Response
where
    S: CustodyStore + 'static,
    C: Clock + 'static,
{
    respond(StatusCode::OK, service.dashboard())
}

pub(crate) async fn audit_log_handler<S, C>(
    State(service): State<Arc<CustodyService<S, C>>>,
    Query(query): Query<AuditQuery>,
) -> Response
where
    S: CustodyStore + 'static,
    C: Clock + 'static,
{
    let limit = query.limit.unwrap_or(DEFAULT_AUDIT_LIMIT);
    respond(StatusCode::OK, service.audit_log(limit))
}
