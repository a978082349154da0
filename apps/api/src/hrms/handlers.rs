use axum::{
    extract::{rejection::{JsonRejection, PathRejection, QueryRejection}, Path, Query, State},
    Json,
};
use uuid::Uuid;

use crate::hrms::models::{EmployeeRow, EmployeeUpdate, Headcount, NewEmployee};
use crate::hrms::service;
use crate::listing::{ListParams, Page};
use crate::response::{ActionResponse, Deleted};
use crate::state::AppState;
use crate::tenancy::{tenant_action, Caller};
use crate::validation::{payload, path_params, query_params};

/// POST /api/v1/hrms/employees
pub async fn handle_create_employee(
    State(state): State<AppState>,
    caller: Caller,
    body: Result<Json<NewEmployee>, JsonRejection>,
) -> ActionResponse<EmployeeRow> {
    let store = &state.store;
    tenant_action(store, caller, |ctx| async move {
        service::create_employee(store, &ctx, payload(body)?).await
    })
    .await
}

/// GET /api/v1/hrms/employees
pub async fn handle_list_employees(
    State(state): State<AppState>,
    caller: Caller,
    params: Result<Query<ListParams>, QueryRejection>,
) -> ActionResponse<Page<EmployeeRow>> {
    let store = &state.store;
    tenant_action(store, caller, |ctx| async move {
        service::list_employees(store, &ctx, &query_params(params)?).await
    })
    .await
}

/// PATCH /api/v1/hrms/employees/:id
pub async fn handle_update_employee(
    State(state): State<AppState>,
    caller: Caller,
    id: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<EmployeeUpdate>, JsonRejection>,
) -> ActionResponse<EmployeeRow> {
    let store = &state.store;
    tenant_action(store, caller, |ctx| async move {
        let id = path_params(id)?;
        service::update_employee(store, &ctx, id, payload(body)?).await
    })
    .await
}

/// DELETE /api/v1/hrms/employees/:id
pub async fn handle_delete_employee(
    State(state): State<AppState>,
    caller: Caller,
    id: Result<Path<Uuid>, PathRejection>,
) -> ActionResponse<Deleted> {
    let store = &state.store;
    tenant_action(store, caller, |ctx| async move {
        let id = path_params(id)?;
        service::delete_employee(store, &ctx, id).await?;
        Ok(Deleted { id })
    })
    .await
}

/// GET /api/v1/hrms/headcount
pub async fn handle_headcount(
    State(state): State<AppState>,
    caller: Caller,
) -> ActionResponse<Headcount> {
    let store = &state.store;
    tenant_action(store, caller, |ctx| async move {
        service::headcount(store, &ctx).await
    })
    .await
}
