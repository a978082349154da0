use axum::{
    extract::{rejection::{JsonRejection, PathRejection, QueryRejection}, Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::crm::csv::ImportSummary;
use crate::crm::models::{
    LeadRow, LeadStatusUpdate, NewLead, NewOpportunity, OpportunityRow, StageUpdate,
};
use crate::crm::service::{self, PipelineSummary};
use crate::enrichment::EnrichmentOutcome;
use crate::listing::{ListParams, Page};
use crate::response::{ActionResponse, Deleted};
use crate::state::AppState;
use crate::tenancy::{tenant_action, Caller};
use crate::validation::{payload, path_params, query_params, validate_input};

#[derive(Debug, Deserialize, Validate)]
pub struct CsvUpload {
    #[validate(required(message = "csv is required"))]
    pub csv: Option<String>,
}

/// POST /api/v1/crm/leads
pub async fn handle_create_lead(
    State(state): State<AppState>,
    caller: Caller,
    body: Result<Json<NewLead>, JsonRejection>,
) -> ActionResponse<LeadRow> {
    let store = &state.store;
    tenant_action(store, caller, |ctx| async move {
        service::create_lead(store, &ctx, payload(body)?).await
    })
    .await
}

/// GET /api/v1/crm/leads
pub async fn handle_list_leads(
    State(state): State<AppState>,
    caller: Caller,
    params: Result<Query<ListParams>, QueryRejection>,
) -> ActionResponse<Page<LeadRow>> {
    let store = &state.store;
    tenant_action(store, caller, |ctx| async move {
        service::list_leads(store, &ctx, &query_params(params)?).await
    })
    .await
}

/// GET /api/v1/crm/leads/:id
pub async fn handle_get_lead(
    State(state): State<AppState>,
    caller: Caller,
    id: Result<Path<Uuid>, PathRejection>,
) -> ActionResponse<LeadRow> {
    let store = &state.store;
    tenant_action(store, caller, |ctx| async move {
        let id = path_params(id)?;
        service::get_lead(store, &ctx, id).await
    })
    .await
}

/// PATCH /api/v1/crm/leads/:id/status
pub async fn handle_update_lead_status(
    State(state): State<AppState>,
    caller: Caller,
    id: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<LeadStatusUpdate>, JsonRejection>,
) -> ActionResponse<LeadRow> {
    let store = &state.store;
    tenant_action(store, caller, |ctx| async move {
        let id = path_params(id)?;
        service::update_lead_status(store, &ctx, id, payload(body)?).await
    })
    .await
}

/// DELETE /api/v1/crm/leads/:id
pub async fn handle_delete_lead(
    State(state): State<AppState>,
    caller: Caller,
    id: Result<Path<Uuid>, PathRejection>,
) -> ActionResponse<Deleted> {
    let store = &state.store;
    tenant_action(store, caller, |ctx| async move {
        let id = path_params(id)?;
        service::delete_lead(store, &ctx, id).await?;
        Ok(Deleted { id })
    })
    .await
}

/// POST /api/v1/crm/leads/:id/score
pub async fn handle_score_lead(
    State(state): State<AppState>,
    caller: Caller,
    id: Result<Path<Uuid>, PathRejection>,
) -> ActionResponse<EnrichmentOutcome> {
    let (store, queue) = (&state.store, &state.enrichment);
    tenant_action(store, caller, |ctx| async move {
        let id = path_params(id)?;
        service::score_lead(store, queue, &ctx, id).await
    })
    .await
}

/// POST /api/v1/crm/import/leads
pub async fn handle_import_leads(
    State(state): State<AppState>,
    caller: Caller,
    body: Result<Json<CsvUpload>, JsonRejection>,
) -> ActionResponse<ImportSummary> {
    let store = &state.store;
    tenant_action(store, caller, |ctx| async move {
        let upload = payload(body)?;
        validate_input(&upload)?;
        let csv = upload.csv.unwrap_or_default();
        service::import_leads(store, &ctx, &csv).await
    })
    .await
}

/// GET /api/v1/crm/export/leads
pub async fn handle_export_leads(
    State(state): State<AppState>,
    caller: Caller,
) -> ActionResponse<String> {
    let store = &state.store;
    tenant_action(store, caller, |ctx| async move {
        service::export_leads(store, &ctx).await
    })
    .await
}

/// POST /api/v1/crm/opportunities
///
/// Responds as soon as the row is committed; AI insights land later.
pub async fn handle_create_opportunity(
    State(state): State<AppState>,
    caller: Caller,
    body: Result<Json<NewOpportunity>, JsonRejection>,
) -> ActionResponse<OpportunityRow> {
    let (store, queue) = (&state.store, &state.enrichment);
    tenant_action(store, caller, |ctx| async move {
        let (opportunity, _handle) =
            service::create_opportunity(store, queue, &ctx, payload(body)?).await?;
        Ok(opportunity)
    })
    .await
}

/// GET /api/v1/crm/opportunities
pub async fn handle_list_opportunities(
    State(state): State<AppState>,
    caller: Caller,
    params: Result<Query<ListParams>, QueryRejection>,
) -> ActionResponse<Page<OpportunityRow>> {
    let store = &state.store;
    tenant_action(store, caller, |ctx| async move {
        service::list_opportunities(store, &ctx, &query_params(params)?).await
    })
    .await
}

/// PATCH /api/v1/crm/opportunities/:id/stage
pub async fn handle_update_opportunity_stage(
    State(state): State<AppState>,
    caller: Caller,
    id: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<StageUpdate>, JsonRejection>,
) -> ActionResponse<OpportunityRow> {
    let store = &state.store;
    tenant_action(store, caller, |ctx| async move {
        let id = path_params(id)?;
        service::update_opportunity_stage(store, &ctx, id, payload(body)?).await
    })
    .await
}

/// POST /api/v1/crm/opportunities/:id/insights
pub async fn handle_refresh_opportunity_insights(
    State(state): State<AppState>,
    caller: Caller,
    id: Result<Path<Uuid>, PathRejection>,
) -> ActionResponse<EnrichmentOutcome> {
    let (store, queue) = (&state.store, &state.enrichment);
    tenant_action(store, caller, |ctx| async move {
        let id = path_params(id)?;
        service::refresh_opportunity_insights(store, queue, &ctx, id).await
    })
    .await
}

/// GET /api/v1/crm/pipeline
pub async fn handle_pipeline_summary(
    State(state): State<AppState>,
    caller: Caller,
) -> ActionResponse<PipelineSummary> {
    let store = &state.store;
    tenant_action(store, caller, |ctx| async move {
        service::pipeline_summary(store, &ctx).await
    })
    .await
}
