//! Background enrichment.
//!
//! Creation flows submit a job and return immediately. Each job runs on its
//! own tokio task; the returned `EnrichmentHandle` may be awaited (tests,
//! synchronous refreshes) or dropped. Failures are logged and also delivered
//! through the handle. Jobs are never retried.

use std::sync::Arc;

use anyhow::anyhow;
use async_trait::async_trait;
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{error, info};
use uuid::Uuid;

use crate::crm::models::{LeadRow, OpportunityRow};
use crate::db::PgStore;
use crate::enrichment::insights::{CandidateSummary, LeadScore, OpportunityInsights};
use crate::enrichment::{self, Enriched};
use crate::errors::AppError;
use crate::llm_client::CompletionClient;
use crate::talent::models::CandidateRow;
use crate::tenancy::RequestContext;

/// Write-back target for enrichment results. Every update is tenant-filtered
/// and overwrites the previous score/insight wholesale.
#[async_trait]
pub trait EnrichmentSink: Send + Sync {
    async fn save_opportunity_insights(
        &self,
        ctx: &RequestContext,
        opportunity_id: Uuid,
        insights: &OpportunityInsights,
    ) -> Result<(), AppError>;

    async fn save_lead_score(
        &self,
        ctx: &RequestContext,
        lead_id: Uuid,
        score: &LeadScore,
    ) -> Result<(), AppError>;

    async fn save_candidate_summary(
        &self,
        ctx: &RequestContext,
        candidate_id: Uuid,
        summary: &CandidateSummary,
    ) -> Result<(), AppError>;
}

#[derive(Debug, Clone)]
pub enum EnrichmentJob {
    Opportunity {
        ctx: RequestContext,
        opportunity: OpportunityRow,
    },
    Lead {
        ctx: RequestContext,
        lead: LeadRow,
    },
    Candidate {
        ctx: RequestContext,
        candidate: CandidateRow,
    },
}

impl EnrichmentJob {
    pub fn kind(&self) -> &'static str {
        match self {
            EnrichmentJob::Opportunity { .. } => "opportunity",
            EnrichmentJob::Lead { .. } => "lead",
            EnrichmentJob::Candidate { .. } => "candidate",
        }
    }

    pub fn entity_id(&self) -> Uuid {
        match self {
            EnrichmentJob::Opportunity { opportunity, .. } => opportunity.id,
            EnrichmentJob::Lead { lead, .. } => lead.id,
            EnrichmentJob::Candidate { candidate, .. } => candidate.id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EnrichmentOutcome {
    Opportunity(Enriched<OpportunityInsights>),
    Lead(Enriched<LeadScore>),
    Candidate(Enriched<CandidateSummary>),
}

impl EnrichmentOutcome {
    pub fn used_fallback(&self) -> bool {
        match self {
            EnrichmentOutcome::Opportunity(e) => e.used_fallback,
            EnrichmentOutcome::Lead(e) => e.used_fallback,
            EnrichmentOutcome::Candidate(e) => e.used_fallback,
        }
    }
}

/// Handle to a submitted job. Dropping it detaches the task.
pub struct EnrichmentHandle {
    inner: JoinHandle<Result<EnrichmentOutcome, AppError>>,
}

impl EnrichmentHandle {
    pub async fn join(self) -> Result<EnrichmentOutcome, AppError> {
        self.inner
            .await
            .map_err(|e| AppError::Internal(anyhow!("enrichment task aborted: {e}")))?
    }
}

#[derive(Clone)]
pub struct EnrichmentQueue {
    llm: Arc<dyn CompletionClient>,
    sink: Arc<dyn EnrichmentSink>,
}

impl EnrichmentQueue {
    pub fn new(llm: Arc<dyn CompletionClient>, sink: Arc<dyn EnrichmentSink>) -> Self {
        Self { llm, sink }
    }

    pub fn llm(&self) -> &dyn CompletionClient {
        self.llm.as_ref()
    }

    /// Spawns the job and returns without waiting for it.
    pub fn submit(&self, job: EnrichmentJob) -> EnrichmentHandle {
        let llm = Arc::clone(&self.llm);
        let sink = Arc::clone(&self.sink);
        let kind = job.kind();
        let entity_id = job.entity_id();

        let inner = tokio::spawn(async move {
            let result = run_job(llm.as_ref(), sink.as_ref(), job).await;
            if let Err(e) = &result {
                error!("Background {kind} enrichment for {entity_id} failed: {e}");
            }
            result
        });

        EnrichmentHandle { inner }
    }

    /// Runs the job on the caller's task. Used by explicit refresh actions.
    pub async fn run_now(&self, job: EnrichmentJob) -> Result<EnrichmentOutcome, AppError> {
        run_job(self.llm.as_ref(), self.sink.as_ref(), job).await
    }
}

async fn run_job(
    llm: &dyn CompletionClient,
    sink: &dyn EnrichmentSink,
    job: EnrichmentJob,
) -> Result<EnrichmentOutcome, AppError> {
    info!("Running {} enrichment for {}", job.kind(), job.entity_id());

    match job {
        EnrichmentJob::Opportunity { ctx, opportunity } => {
            let insights = enrichment::opportunity_insights(llm, &opportunity).await;
            sink.save_opportunity_insights(&ctx, opportunity.id, &insights.value)
                .await?;
            Ok(EnrichmentOutcome::Opportunity(insights))
        }
        EnrichmentJob::Lead { ctx, lead } => {
            let score = enrichment::lead_score(llm, &lead).await;
            sink.save_lead_score(&ctx, lead.id, &score.value).await?;
            Ok(EnrichmentOutcome::Lead(score))
        }
        EnrichmentJob::Candidate { ctx, candidate } => {
            let summary = enrichment::candidate_summary(llm, &candidate).await;
            sink.save_candidate_summary(&ctx, candidate.id, &summary.value)
                .await?;
            Ok(EnrichmentOutcome::Candidate(summary))
        }
    }
}

#[async_trait]
impl EnrichmentSink for PgStore {
    async fn save_opportunity_insights(
        &self,
        ctx: &RequestContext,
        opportunity_id: Uuid,
        insights: &OpportunityInsights,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE opportunities
            SET win_probability = $1, risk_score = $2, ai_insights = $3, updated_at = NOW()
            WHERE id = $4 AND tenant_id = $5
            "#,
        )
        .bind(insights.win_probability)
        .bind(insights.risk_score)
        .bind(&insights.insights)
        .bind(opportunity_id)
        .bind(ctx.tenant_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn save_lead_score(
        &self,
        ctx: &RequestContext,
        lead_id: Uuid,
        score: &LeadScore,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE leads
            SET score = $1, ai_insights = $2, updated_at = NOW()
            WHERE id = $3 AND tenant_id = $4
            "#,
        )
        .bind(score.score)
        .bind(&score.insights)
        .bind(lead_id)
        .bind(ctx.tenant_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn save_candidate_summary(
        &self,
        ctx: &RequestContext,
        candidate_id: Uuid,
        summary: &CandidateSummary,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE candidates
            SET ai_summary = $1, ai_strengths = $2, ai_concerns = $3, updated_at = NOW()
            WHERE id = $4 AND tenant_id = $5
            "#,
        )
        .bind(&summary.summary)
        .bind(&summary.strengths)
        .bind(&summary.concerns)
        .bind(candidate_id)
        .bind(ctx.tenant_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
