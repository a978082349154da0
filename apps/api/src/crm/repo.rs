use async_trait::async_trait;
use uuid::Uuid;

use crate::crm::models::{
    LeadDraft, LeadRow, LeadStatus, OpportunityDraft, OpportunityRow, StageChange, StageSummary,
};
use crate::db::PgStore;
use crate::errors::AppError;
use crate::listing::{fetch_page, ListParams, ListSpec, Page};
use crate::tenancy::RequestContext;

/// Tenant-scoped persistence for leads and opportunities.
#[async_trait]
pub trait CrmStore: Send + Sync {
    async fn insert_lead(&self, ctx: &RequestContext, lead: &LeadDraft)
        -> Result<LeadRow, AppError>;
    async fn list_leads(
        &self,
        ctx: &RequestContext,
        params: &ListParams,
    ) -> Result<Page<LeadRow>, AppError>;
    /// Every lead of the tenant, oldest first. Used by CSV export.
    async fn all_leads(&self, ctx: &RequestContext) -> Result<Vec<LeadRow>, AppError>;
    async fn get_lead(&self, ctx: &RequestContext, id: Uuid) -> Result<Option<LeadRow>, AppError>;
    async fn lead_email_exists(&self, ctx: &RequestContext, email: &str) -> Result<bool, AppError>;
    async fn update_lead_status(
        &self,
        ctx: &RequestContext,
        id: Uuid,
        status: LeadStatus,
    ) -> Result<Option<LeadRow>, AppError>;
    async fn delete_lead(&self, ctx: &RequestContext, id: Uuid) -> Result<bool, AppError>;

    async fn insert_opportunity(
        &self,
        ctx: &RequestContext,
        opp: &OpportunityDraft,
    ) -> Result<OpportunityRow, AppError>;
    async fn list_opportunities(
        &self,
        ctx: &RequestContext,
        params: &ListParams,
    ) -> Result<Page<OpportunityRow>, AppError>;
    async fn get_opportunity(
        &self,
        ctx: &RequestContext,
        id: Uuid,
    ) -> Result<Option<OpportunityRow>, AppError>;
    async fn update_opportunity_stage(
        &self,
        ctx: &RequestContext,
        id: Uuid,
        change: &StageChange,
    ) -> Result<Option<OpportunityRow>, AppError>;
    async fn pipeline_summary(&self, ctx: &RequestContext) -> Result<Vec<StageSummary>, AppError>;
}

const LEAD_LIST: ListSpec = ListSpec {
    table: "leads",
    search_columns: &["first_name", "last_name", "email", "company"],
    status_column: Some("status"),
    sort_columns: &["created_at", "updated_at", "first_name", "company", "score"],
    default_sort: "created_at",
};

const OPPORTUNITY_LIST: ListSpec = ListSpec {
    table: "opportunities",
    search_columns: &["name", "company"],
    status_column: Some("status"),
    sort_columns: &[
        "created_at",
        "updated_at",
        "name",
        "amount",
        "probability",
        "expected_close_date",
    ],
    default_sort: "created_at",
};

#[async_trait]
impl CrmStore for PgStore {
    async fn insert_lead(
        &self,
        ctx: &RequestContext,
        lead: &LeadDraft,
    ) -> Result<LeadRow, AppError> {
        let row = sqlx::query_as::<_, LeadRow>(
            r#"
            INSERT INTO leads
                (tenant_id, first_name, last_name, email, phone, company, job_title,
                 source, status, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(ctx.tenant_id)
        .bind(&lead.first_name)
        .bind(&lead.last_name)
        .bind(&lead.email)
        .bind(&lead.phone)
        .bind(&lead.company)
        .bind(&lead.job_title)
        .bind(&lead.source)
        .bind(lead.status.as_str())
        .bind(ctx.user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn list_leads(
        &self,
        ctx: &RequestContext,
        params: &ListParams,
    ) -> Result<Page<LeadRow>, AppError> {
        fetch_page(&self.pool, ctx, params, &LEAD_LIST).await
    }

    async fn all_leads(&self, ctx: &RequestContext) -> Result<Vec<LeadRow>, AppError> {
        Ok(sqlx::query_as::<_, LeadRow>(
            "SELECT * FROM leads WHERE tenant_id = $1 ORDER BY created_at ASC",
        )
        .bind(ctx.tenant_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn get_lead(&self, ctx: &RequestContext, id: Uuid) -> Result<Option<LeadRow>, AppError> {
        Ok(
            sqlx::query_as::<_, LeadRow>("SELECT * FROM leads WHERE id = $1 AND tenant_id = $2")
                .bind(id)
                .bind(ctx.tenant_id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn lead_email_exists(&self, ctx: &RequestContext, email: &str) -> Result<bool, AppError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM leads WHERE tenant_id = $1 AND email = $2)",
        )
        .bind(ctx.tenant_id)
        .bind(email)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn update_lead_status(
        &self,
        ctx: &RequestContext,
        id: Uuid,
        status: LeadStatus,
    ) -> Result<Option<LeadRow>, AppError> {
        Ok(sqlx::query_as::<_, LeadRow>(
            r#"
            UPDATE leads SET status = $1, updated_at = NOW()
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

    async fn delete_lead(&self, ctx: &RequestContext, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM leads WHERE id = $1 AND tenant_id = $2")
            .bind(id)
            .bind(ctx.tenant_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_opportunity(
        &self,
        ctx: &RequestContext,
        opp: &OpportunityDraft,
    ) -> Result<OpportunityRow, AppError> {
        let row = sqlx::query_as::<_, OpportunityRow>(
            r#"
            INSERT INTO opportunities
                (tenant_id, lead_id, name, company, amount, stage, probability, status,
                 expected_close_date, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(ctx.tenant_id)
        .bind(opp.lead_id)
        .bind(&opp.name)
        .bind(&opp.company)
        .bind(opp.amount)
        .bind(opp.stage.as_str())
        .bind(opp.probability)
        .bind(opp.status.as_str())
        .bind(opp.expected_close_date)
        .bind(ctx.user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn list_opportunities(
        &self,
        ctx: &RequestContext,
        params: &ListParams,
    ) -> Result<Page<OpportunityRow>, AppError> {
        fetch_page(&self.pool, ctx, params, &OPPORTUNITY_LIST).await
    }

    async fn get_opportunity(
        &self,
        ctx: &RequestContext,
        id: Uuid,
    ) -> Result<Option<OpportunityRow>, AppError> {
        Ok(sqlx::query_as::<_, OpportunityRow>(
            "SELECT * FROM opportunities WHERE id = $1 AND tenant_id = $2",
        )
        .bind(id)
        .bind(ctx.tenant_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn update_opportunity_stage(
        &self,
        ctx: &RequestContext,
        id: Uuid,
        change: &StageChange,
    ) -> Result<Option<OpportunityRow>, AppError> {
        Ok(sqlx::query_as::<_, OpportunityRow>(
            r#"
            UPDATE opportunities
            SET stage = $1, status = $2, probability = COALESCE($3, probability), updated_at = NOW()
            WHERE id = $4 AND tenant_id = $5
            RETURNING *
            "#,
        )
        .bind(change.stage.as_str())
        .bind(change.status.as_str())
        .bind(change.probability)
        .bind(id)
        .bind(ctx.tenant_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn pipeline_summary(&self, ctx: &RequestContext) -> Result<Vec<StageSummary>, AppError> {
        Ok(sqlx::query_as::<_, StageSummary>(
            r#"
            SELECT stage, COUNT(*) AS count, COALESCE(SUM(amount), 0)::FLOAT8 AS total_amount
            FROM opportunities
            WHERE tenant_id = $1
            GROUP BY stage
            "#,
        )
        .bind(ctx.tenant_id)
        .fetch_all(&self.pool)
        .await?)
    }
}
