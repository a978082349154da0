use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::audit::{AuditAction, AuditSink, NewAuditEntry};
use crate::bench::models::{AvailabilityUpdate, BenchMatch, BenchResourceRow, NewBenchResource};
use crate::bench::repo::BenchStore;
use crate::errors::AppError;
use crate::hrms::repo::HrStore;
use crate::listing::{ListParams, Page};
use crate::scoring::compute_match_score;
use crate::talent::repo::TalentStore;
use crate::tenancy::RequestContext;
use crate::validation::validate_input;

pub trait BenchBackend: BenchStore + HrStore + TalentStore + AuditSink {}
impl<T: BenchStore + HrStore + TalentStore + AuditSink + ?Sized> BenchBackend for T {}

pub async fn add_bench_resource<S: BenchBackend + ?Sized>(
    store: &S,
    ctx: &RequestContext,
    input: NewBenchResource,
) -> Result<BenchResourceRow, AppError> {
    let draft = input.validated()?;

    if let Some(employee_id) = draft.employee_id {
        store
            .get_employee(ctx, employee_id)
            .await?
            .ok_or_else(|| AppError::Validation(format!("Employee {employee_id} not found")))?;
    }

    let resource = store.insert_bench_resource(ctx, &draft).await?;
    store
        .record(
            ctx,
            NewAuditEntry::new(AuditAction::Create, "bench_resource", resource.id),
        )
        .await?;
    info!(
        "Added bench resource {} for tenant {}",
        resource.id, ctx.tenant_id
    );
    Ok(resource)
}

pub async fn list_bench<S: BenchBackend + ?Sized>(
    store: &S,
    ctx: &RequestContext,
    params: &ListParams,
) -> Result<Page<BenchResourceRow>, AppError> {
    store.list_bench(ctx, params).await
}

pub async fn update_availability<S: BenchBackend + ?Sized>(
    store: &S,
    ctx: &RequestContext,
    id: Uuid,
    input: AvailabilityUpdate,
) -> Result<BenchResourceRow, AppError> {
    validate_input(&input)?;
    let availability = input.availability.unwrap_or_default();

    let resource = store
        .update_availability(ctx, id, availability, input.available_from)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Bench resource {id} not found")))?;
    store
        .record(
            ctx,
            NewAuditEntry::new(AuditAction::Update, "bench_resource", id)
                .with_metadata(json!({ "availability": availability.as_str() })),
        )
        .await?;
    Ok(resource)
}

/// Scores every bench resource against a requisition's required skills,
/// best first. Read-only: nothing is stored and no audit row is written.
pub async fn match_resources<S: BenchBackend + ?Sized>(
    store: &S,
    ctx: &RequestContext,
    requisition_id: Uuid,
) -> Result<Vec<BenchMatch>, AppError> {
    let req = store
        .get_requisition(ctx, requisition_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Requisition {requisition_id} not found")))?;

    let mut matches: Vec<BenchMatch> = store
        .all_bench(ctx)
        .await?
        .into_iter()
        .map(|resource| {
            let result = compute_match_score(&resource.skills, &req.required_skills);
            BenchMatch {
                resource_id: resource.id,
                full_name: resource.full_name,
                availability: resource.availability,
                score: result.score,
                explain: result.explain,
            }
        })
        .collect();
    matches.sort_by(|a, b| b.score.cmp(&a.score));
    Ok(matches)
}
