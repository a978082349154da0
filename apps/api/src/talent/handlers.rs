use axum::{
    extract::{rejection::{JsonRejection, PathRejection, QueryRejection}, Path, Query, State},
    Json,
};
use uuid::Uuid;

use crate::enrichment::insights::ParsedResume;
use crate::enrichment::Enriched;
use crate::listing::{ListParams, Page};
use crate::response::ActionResponse;
use crate::state::AppState;
use crate::talent::models::{
    CandidateRow, CandidateStatusUpdate, MatchScoreRow, NewCandidate, NewRequisition,
    RankedCandidate, RequisitionRow, ResumeText,
};
use crate::talent::service;
use crate::tenancy::{tenant_action, Caller};
use crate::validation::{payload, path_params, query_params};

/// POST /api/v1/talent/requisitions
pub async fn handle_create_requisition(
    State(state): State<AppState>,
    caller: Caller,
    body: Result<Json<NewRequisition>, JsonRejection>,
) -> ActionResponse<RequisitionRow> {
    let store = &state.store;
    tenant_action(store, caller, |ctx| async move {
        service::create_requisition(store, &ctx, payload(body)?).await
    })
    .await
}

/// GET /api/v1/talent/requisitions
pub async fn handle_list_requisitions(
    State(state): State<AppState>,
    caller: Caller,
    params: Result<Query<ListParams>, QueryRejection>,
) -> ActionResponse<Page<RequisitionRow>> {
    let store = &state.store;
    tenant_action(store, caller, |ctx| async move {
        service::list_requisitions(store, &ctx, &query_params(params)?).await
    })
    .await
}

/// GET /api/v1/talent/requisitions/:id/ranking
pub async fn handle_rank_candidates(
    State(state): State<AppState>,
    caller: Caller,
    requisition_id: Result<Path<Uuid>, PathRejection>,
) -> ActionResponse<Vec<RankedCandidate>> {
    let store = &state.store;
    tenant_action(store, caller, |ctx| async move {
        let requisition_id = path_params(requisition_id)?;
        service::rank_candidates(store, &ctx, requisition_id).await
    })
    .await
}

/// POST /api/v1/talent/candidates
///
/// The AI summary is filled in by a background job after the response.
pub async fn handle_create_candidate(
    State(state): State<AppState>,
    caller: Caller,
    body: Result<Json<NewCandidate>, JsonRejection>,
) -> ActionResponse<CandidateRow> {
    let (store, queue) = (&state.store, &state.enrichment);
    tenant_action(store, caller, |ctx| async move {
        let (candidate, _handle) =
            service::create_candidate(store, queue, &ctx, payload(body)?).await?;
        Ok(candidate)
    })
    .await
}

/// GET /api/v1/talent/candidates
pub async fn handle_list_candidates(
    State(state): State<AppState>,
    caller: Caller,
    params: Result<Query<ListParams>, QueryRejection>,
) -> ActionResponse<Page<CandidateRow>> {
    let store = &state.store;
    tenant_action(store, caller, |ctx| async move {
        service::list_candidates(store, &ctx, &query_params(params)?).await
    })
    .await
}

/// PATCH /api/v1/talent/candidates/:id/status
pub async fn handle_update_candidate_status(
    State(state): State<AppState>,
    caller: Caller,
    id: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<CandidateStatusUpdate>, JsonRejection>,
) -> ActionResponse<CandidateRow> {
    let store = &state.store;
    tenant_action(store, caller, |ctx| async move {
        let id = path_params(id)?;
        service::update_candidate_status(store, &ctx, id, payload(body)?).await
    })
    .await
}

/// POST /api/v1/talent/resume/parse
pub async fn handle_parse_resume(
    State(state): State<AppState>,
    caller: Caller,
    body: Result<Json<ResumeText>, JsonRejection>,
) -> ActionResponse<Enriched<ParsedResume>> {
    let (store, queue) = (&state.store, &state.enrichment);
    tenant_action(store, caller, |_ctx| async move {
        service::parse_resume(queue.llm(), payload(body)?).await
    })
    .await
}

/// POST /api/v1/talent/candidates/:id/match/:requisition_id
pub async fn handle_match_candidate(
    State(state): State<AppState>,
    caller: Caller,
    ids: Result<Path<(Uuid, Uuid)>, PathRejection>,
) -> ActionResponse<MatchScoreRow> {
    let store = &state.store;
    tenant_action(store, caller, |ctx| async move {
        let (candidate_id, requisition_id) = path_params(ids)?;
        service::match_candidate(store, &ctx, candidate_id, requisition_id).await
    })
    .await
}

/// POST /api/v1/talent/candidates/:id/questions/:requisition_id
pub async fn handle_interview_questions(
    State(state): State<AppState>,
    caller: Caller,
    ids: Result<Path<(Uuid, Uuid)>, PathRejection>,
) -> ActionResponse<Enriched<Vec<String>>> {
    let (store, queue) = (&state.store, &state.enrichment);
    tenant_action(store, caller, |ctx| async move {
        let (candidate_id, requisition_id) = path_params(ids)?;
        service::interview_questions(store, queue.llm(), &ctx, requisition_id, candidate_id).await
    })
    .await
}
