//! Recruiting actions: requisitions, candidates, skill matching and the
//! AI helpers (resume parsing, interview questions).

use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::audit::{AuditAction, AuditSink, NewAuditEntry};
use crate::enrichment::insights::ParsedResume;
use crate::enrichment::{self, EnrichmentHandle, EnrichmentJob, EnrichmentQueue, Enriched};
use crate::errors::AppError;
use crate::listing::{ListParams, Page};
use crate::llm_client::CompletionClient;
use crate::scoring::compute_match_score;
use crate::talent::models::{
    CandidateRow, CandidateStatusUpdate, MatchScoreRow, MatchUpsert, NewCandidate,
    NewRequisition, RankedCandidate, RequisitionRow, ResumeText,
};
use crate::talent::repo::TalentStore;
use crate::tenancy::RequestContext;
use crate::validation::validate_input;

pub trait TalentBackend: TalentStore + AuditSink {}
impl<T: TalentStore + AuditSink + ?Sized> TalentBackend for T {}

async fn load_requisition<S: TalentBackend + ?Sized>(
    store: &S,
    ctx: &RequestContext,
    id: Uuid,
) -> Result<RequisitionRow, AppError> {
    store
        .get_requisition(ctx, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Requisition {id} not found")))
}

async fn load_candidate<S: TalentBackend + ?Sized>(
    store: &S,
    ctx: &RequestContext,
    id: Uuid,
) -> Result<CandidateRow, AppError> {
    store
        .get_candidate(ctx, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Candidate {id} not found")))
}

pub async fn create_requisition<S: TalentBackend + ?Sized>(
    store: &S,
    ctx: &RequestContext,
    input: NewRequisition,
) -> Result<RequisitionRow, AppError> {
    let draft = input.validated()?;
    let req = store.insert_requisition(ctx, &draft).await?;
    store
        .record(ctx, NewAuditEntry::new(AuditAction::Create, "requisition", req.id))
        .await?;
    info!("Created requisition {} for tenant {}", req.id, ctx.tenant_id);
    Ok(req)
}

pub async fn list_requisitions<S: TalentBackend + ?Sized>(
    store: &S,
    ctx: &RequestContext,
    params: &ListParams,
) -> Result<Page<RequisitionRow>, AppError> {
    store.list_requisitions(ctx, params).await
}

/// Creates the candidate and queues the AI summary in the background.
pub async fn create_candidate<S: TalentBackend + ?Sized>(
    store: &S,
    queue: &EnrichmentQueue,
    ctx: &RequestContext,
    input: NewCandidate,
) -> Result<(CandidateRow, EnrichmentHandle), AppError> {
    let draft = input.validated()?;
    let candidate = store.insert_candidate(ctx, &draft).await?;
    store
        .record(
            ctx,
            NewAuditEntry::new(AuditAction::Create, "candidate", candidate.id),
        )
        .await?;
    info!(
        "Created candidate {} for tenant {}",
        candidate.id, ctx.tenant_id
    );

    let handle = queue.submit(EnrichmentJob::Candidate {
        ctx: *ctx,
        candidate: candidate.clone(),
    });
    Ok((candidate, handle))
}

pub async fn list_candidates<S: TalentBackend + ?Sized>(
    store: &S,
    ctx: &RequestContext,
    params: &ListParams,
) -> Result<Page<CandidateRow>, AppError> {
    store.list_candidates(ctx, params).await
}

pub async fn update_candidate_status<S: TalentBackend + ?Sized>(
    store: &S,
    ctx: &RequestContext,
    id: Uuid,
    input: CandidateStatusUpdate,
) -> Result<CandidateRow, AppError> {
    validate_input(&input)?;
    let status = input.status.unwrap_or_default();

    let candidate = store
        .update_candidate_status(ctx, id, status)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Candidate {id} not found")))?;
    store
        .record(
            ctx,
            NewAuditEntry::new(AuditAction::Update, "candidate", id)
                .with_metadata(json!({ "status": status.as_str() })),
        )
        .await?;
    Ok(candidate)
}

/// Extracts candidate fields from pasted resume text. Nothing is persisted;
/// an unusable completion yields an empty parse.
pub async fn parse_resume(
    llm: &dyn CompletionClient,
    input: ResumeText,
) -> Result<Enriched<ParsedResume>, AppError> {
    validate_input(&input)?;
    let text = input.resume_text.unwrap_or_default();
    Ok(enrichment::parse_resume(llm, &text).await)
}

/// Scores one candidate against one requisition and stores the result,
/// replacing any earlier score for the pair.
pub async fn match_candidate<S: TalentBackend + ?Sized>(
    store: &S,
    ctx: &RequestContext,
    candidate_id: Uuid,
    requisition_id: Uuid,
) -> Result<MatchScoreRow, AppError> {
    let candidate = load_candidate(store, ctx, candidate_id).await?;
    let req = load_requisition(store, ctx, requisition_id).await?;

    let result = compute_match_score(&candidate.skills, &req.required_skills);
    let row = store
        .upsert_match(
            ctx,
            &MatchUpsert {
                candidate_id,
                requisition_id,
                result,
            },
        )
        .await?;
    store
        .record(
            ctx,
            NewAuditEntry::new(AuditAction::Score, "candidate", candidate_id).with_metadata(
                json!({ "requisition_id": requisition_id, "score": row.score }),
            ),
        )
        .await?;
    Ok(row)
}

/// Scores every candidate of the tenant against a requisition, persists each
/// score and returns them best first. Ties keep candidate creation order.
pub async fn rank_candidates<S: TalentBackend + ?Sized>(
    store: &S,
    ctx: &RequestContext,
    requisition_id: Uuid,
) -> Result<Vec<RankedCandidate>, AppError> {
    let req = load_requisition(store, ctx, requisition_id).await?;
    let candidates = store.all_candidates(ctx).await?;

    let mut ranked = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let result = compute_match_score(&candidate.skills, &req.required_skills);
        store
            .upsert_match(
                ctx,
                &MatchUpsert {
                    candidate_id: candidate.id,
                    requisition_id,
                    result: result.clone(),
                },
            )
            .await?;
        ranked.push(RankedCandidate {
            candidate_id: candidate.id,
            full_name: candidate.full_name,
            score: result.score,
            explain: result.explain,
        });
    }
    ranked.sort_by(|a, b| b.score.cmp(&a.score));

    store
        .record(
            ctx,
            NewAuditEntry::new(AuditAction::Score, "requisition", requisition_id)
                .with_metadata(json!({ "candidates": ranked.len() })),
        )
        .await?;
    Ok(ranked)
}

pub async fn interview_questions<S: TalentBackend + ?Sized>(
    store: &S,
    llm: &dyn CompletionClient,
    ctx: &RequestContext,
    requisition_id: Uuid,
    candidate_id: Uuid,
) -> Result<Enriched<Vec<String>>, AppError> {
    let req = load_requisition(store, ctx, requisition_id).await?;
    let candidate = load_candidate(store, ctx, candidate_id).await?;
    Ok(enrichment::interview_questions(llm, &req, &candidate).await)
}
