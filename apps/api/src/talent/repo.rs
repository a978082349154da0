use async_trait::async_trait;
use sqlx::types::Json;
use uuid::Uuid;

use crate::db::PgStore;
use crate::errors::AppError;
use crate::listing::{fetch_page, ListParams, ListSpec, Page};
use crate::talent::models::{
    CandidateDraft, CandidateRow, CandidateStatus, MatchScoreRow, MatchUpsert, RequisitionDraft,
    RequisitionRow,
};
use crate::tenancy::RequestContext;

/// Tenant-scoped persistence for requisitions, candidates and match scores.
#[async_trait]
pub trait TalentStore: Send + Sync {
    async fn insert_requisition(
        &self,
        ctx: &RequestContext,
        req: &RequisitionDraft,
    ) -> Result<RequisitionRow, AppError>;
    async fn list_requisitions(
        &self,
        ctx: &RequestContext,
        params: &ListParams,
    ) -> Result<Page<RequisitionRow>, AppError>;
    async fn get_requisition(
        &self,
        ctx: &RequestContext,
        id: Uuid,
    ) -> Result<Option<RequisitionRow>, AppError>;

    async fn insert_candidate(
        &self,
        ctx: &RequestContext,
        candidate: &CandidateDraft,
    ) -> Result<CandidateRow, AppError>;
    async fn list_candidates(
        &self,
        ctx: &RequestContext,
        params: &ListParams,
    ) -> Result<Page<CandidateRow>, AppError>;
    /// Every candidate of the tenant. Used for requisition ranking.
    async fn all_candidates(&self, ctx: &RequestContext) -> Result<Vec<CandidateRow>, AppError>;
    async fn get_candidate(
        &self,
        ctx: &RequestContext,
        id: Uuid,
    ) -> Result<Option<CandidateRow>, AppError>;
    async fn update_candidate_status(
        &self,
        ctx: &RequestContext,
        id: Uuid,
        status: CandidateStatus,
    ) -> Result<Option<CandidateRow>, AppError>;

    /// Inserts or replaces the score for `(candidate_id, requisition_id)`.
    async fn upsert_match(
        &self,
        ctx: &RequestContext,
        upsert: &MatchUpsert,
    ) -> Result<MatchScoreRow, AppError>;
}

const REQUISITION_LIST: ListSpec = ListSpec {
    table: "requisitions",
    search_columns: &["title", "department", "location"],
    status_column: Some("status"),
    sort_columns: &["created_at", "title", "department"],
    default_sort: "created_at",
};

const CANDIDATE_LIST: ListSpec = ListSpec {
    table: "candidates",
    search_columns: &["full_name", "email", "current_title"],
    status_column: Some("status"),
    sort_columns: &["created_at", "updated_at", "full_name", "experience_years"],
    default_sort: "created_at",
};

#[async_trait]
impl TalentStore for PgStore {
    async fn insert_requisition(
        &self,
        ctx: &RequestContext,
        req: &RequisitionDraft,
    ) -> Result<RequisitionRow, AppError> {
        Ok(sqlx::query_as::<_, RequisitionRow>(
            r#"
            INSERT INTO requisitions
                (tenant_id, title, department, location, employment_type, required_skills,
                 min_experience_years, status, description, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(ctx.tenant_id)
        .bind(&req.title)
        .bind(&req.department)
        .bind(&req.location)
        .bind(&req.employment_type)
        .bind(&req.required_skills)
        .bind(req.min_experience_years)
        .bind(req.status.as_str())
        .bind(&req.description)
        .bind(ctx.user_id)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn list_requisitions(
        &self,
        ctx: &RequestContext,
        params: &ListParams,
    ) -> Result<Page<RequisitionRow>, AppError> {
        fetch_page(&self.pool, ctx, params, &REQUISITION_LIST).await
    }

    async fn get_requisition(
        &self,
        ctx: &RequestContext,
        id: Uuid,
    ) -> Result<Option<RequisitionRow>, AppError> {
        Ok(sqlx::query_as::<_, RequisitionRow>(
            "SELECT * FROM requisitions WHERE id = $1 AND tenant_id = $2",
        )
        .bind(id)
        .bind(ctx.tenant_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn insert_candidate(
        &self,
        ctx: &RequestContext,
        candidate: &CandidateDraft,
    ) -> Result<CandidateRow, AppError> {
        Ok(sqlx::query_as::<_, CandidateRow>(
            r#"
            INSERT INTO candidates
                (tenant_id, full_name, email, phone, skills, experience_years, current_title,
                 status, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(ctx.tenant_id)
        .bind(&candidate.full_name)
        .bind(&candidate.email)
        .bind(&candidate.phone)
        .bind(&candidate.skills)
        .bind(candidate.experience_years)
        .bind(&candidate.current_title)
        .bind(candidate.status.as_str())
        .bind(ctx.user_id)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn list_candidates(
        &self,
        ctx: &RequestContext,
        params: &ListParams,
    ) -> Result<Page<CandidateRow>, AppError> {
        fetch_page(&self.pool, ctx, params, &CANDIDATE_LIST).await
    }

    async fn all_candidates(&self, ctx: &RequestContext) -> Result<Vec<CandidateRow>, AppError> {
        Ok(sqlx::query_as::<_, CandidateRow>(
            "SELECT * FROM candidates WHERE tenant_id = $1 ORDER BY created_at ASC",
        )
        .bind(ctx.tenant_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn get_candidate(
        &self,
        ctx: &RequestContext,
        id: Uuid,
    ) -> Result<Option<CandidateRow>, AppError> {
        Ok(sqlx::query_as::<_, CandidateRow>(
            "SELECT * FROM candidates WHERE id = $1 AND tenant_id = $2",
        )
        .bind(id)
        .bind(ctx.tenant_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn update_candidate_status(
        &self,
        ctx: &RequestContext,
        id: Uuid,
        status: CandidateStatus,
    ) -> Result<Option<CandidateRow>, AppError> {
        Ok(sqlx::query_as::<_, CandidateRow>(
            r#"
            UPDATE candidates SET status = $1, updated_at = NOW()
            WHERE id = $2 AND tenant_id = $3
            RETURNING *
            "#,
        )
        .bind(status.as_str())
        .bind(id)
        .bind(ctx.tenant_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn upsert_match(
        &self,
        ctx: &RequestContext,
        upsert: &MatchUpsert,
    ) -> Result<MatchScoreRow, AppError> {
        Ok(sqlx::query_as::<_, MatchScoreRow>(
            r#"
            INSERT INTO match_scores (tenant_id, candidate_id, requisition_id, score, explain)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (candidate_id, requisition_id)
            DO UPDATE SET score = EXCLUDED.score, explain = EXCLUDED.explain, computed_at = NOW()
            RETURNING tenant_id, candidate_id, requisition_id, score, explain, computed_at
            "#,
        )
        .bind(ctx.tenant_id)
        .bind(upsert.candidate_id)
        .bind(upsert.requisition_id)
        .bind(i32::from(upsert.result.score))
        .bind(Json(&upsert.result.explain))
        .fetch_one(&self.pool)
        .await?)
    }
}
