use axum::{
    extract::{rejection::{JsonRejection, PathRejection, QueryRejection}, Path, Query, State},
    Json,
};
use uuid::Uuid;

use crate::bench::models::{AvailabilityUpdate, BenchMatch, BenchResourceRow, NewBenchResource};
use crate::bench::service;
use crate::listing::{ListParams, Page};
use crate::response::ActionResponse;
use crate::state::AppState;
use crate::tenancy::{tenant_action, Caller};
use crate::validation::{payload, path_params, query_params};

/// POST /api/v1/bench/resources
pub async fn handle_add_bench_resource(
    State(state): State<AppState>,
    caller: Caller,
    body: Result<Json<NewBenchResource>, JsonRejection>,
) -> ActionResponse<BenchResourceRow> {
    let store = &state.store;
    tenant_action(store, caller, |ctx| async move {
        service::add_bench_resource(store, &ctx, payload(body)?).await
    })
    .await
}

/// GET /api/v1/bench/resources
pub async fn handle_list_bench(
    State(state): State<AppState>,
    caller: Caller,
    params: Result<Query<ListParams>, QueryRejection>,
) -> ActionResponse<Page<BenchResourceRow>> {
    let store = &state.store;
    tenant_action(store, caller, |ctx| async move {
        service::list_bench(store, &ctx, &query_params(params)?).await
    })
    .await
}

/// PATCH /api/v1/bench/resources/:id/availability
pub async fn handle_update_availability(
    State(state): State<AppState>,
    caller: Caller,
    id: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<AvailabilityUpdate>, JsonRejection>,
) -> ActionResponse<BenchResourceRow> {
    let store = &state.store;
    tenant_action(store, caller, |ctx| async move {
        let id = path_params(id)?;
        service::update_availability(store, &ctx, id, payload(body)?).await
    })
    .await
}

/// GET /api/v1/bench/requisitions/:id/matches
pub async fn handle_match_resources(
    State(state): State<AppState>,
    caller: Caller,
    requisition_id: Result<Path<Uuid>, PathRejection>,
) -> ActionResponse<Vec<BenchMatch>> {
    let store = &state.store;
    tenant_action(store, caller, |ctx| async move {
        let requisition_id = path_params(requisition_id)?;
        service::match_resources(store, &ctx, requisition_id).await
    })
    .await
}
