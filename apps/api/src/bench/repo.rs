use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::bench::models::{Availability, BenchResourceDraft, BenchResourceRow};
use crate::db::PgStore;
use crate::errors::AppError;
use crate::listing::{fetch_page, ListParams, ListSpec, Page};
use crate::tenancy::RequestContext;

#[async_trait]
pub trait BenchStore: Send + Sync {
    async fn insert_bench_resource(
        &self,
        ctx: &RequestContext,
        resource: &BenchResourceDraft,
    ) -> Result<BenchResourceRow, AppError>;
    async fn list_bench(
        &self,
        ctx: &RequestContext,
        params: &ListParams,
    ) -> Result<Page<BenchResourceRow>, AppError>;
    async fn all_bench(&self, ctx: &RequestContext) -> Result<Vec<BenchResourceRow>, AppError>;
    async fn update_availability(
        &self,
        ctx: &RequestContext,
        id: Uuid,
        availability: Availability,
        available_from: Option<NaiveDate>,
    ) -> Result<Option<BenchResourceRow>, AppError>;
}

const BENCH_LIST: ListSpec = ListSpec {
    table: "bench_resources",
    search_columns: &["full_name"],
    status_column: Some("availability"),
    sort_columns: &[
        "created_at",
        "full_name",
        "experience_years",
        "available_from",
        "hourly_rate",
    ],
    default_sort: "created_at",
};

#[async_trait]
impl BenchStore for PgStore {
    async fn insert_bench_resource(
        &self,
        ctx: &RequestContext,
        resource: &BenchResourceDraft,
    ) -> Result<BenchResourceRow, AppError> {
        Ok(sqlx::query_as::<_, BenchResourceRow>(
            r#"
            INSERT INTO bench_resources
                (tenant_id, employee_id, full_name, skills, experience_years, availability,
                 available_from, hourly_rate)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(ctx.tenant_id)
        .bind(resource.employee_id)
        .bind(&resource.full_name)
        .bind(&resource.skills)
        .bind(resource.experience_years)
        .bind(resource.availability.as_str())
        .bind(resource.available_from)
        .bind(resource.hourly_rate)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn list_bench(
        &self,
        ctx: &RequestContext,
        params: &ListParams,
    ) -> Result<Page<BenchResourceRow>, AppError> {
        fetch_page(&self.pool, ctx, params, &BENCH_LIST).await
    }

    async fn all_bench(&self, ctx: &RequestContext) -> Result<Vec<BenchResourceRow>, AppError> {
        Ok(sqlx::query_as::<_, BenchResourceRow>(
            "SELECT * FROM bench_resources WHERE tenant_id = $1 ORDER BY created_at ASC",
        )
        .bind(ctx.tenant_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn update_availability(
        &self,
        ctx: &RequestContext,
        id: Uuid,
        availability: Availability,
        available_from: Option<NaiveDate>,
    ) -> Result<Option<BenchResourceRow>, AppError> {
        Ok(sqlx::query_as::<_, BenchResourceRow>(
            r#"
            UPDATE bench_resources
            SET availability = $1, available_from = COALESCE($2, available_from)
            WHERE id = $3 AND tenant_id = $4
            RETURNING *
            "#,
        )
        .bind(availability.as_str())
        .bind(available_from)
        .bind(id)
        .bind(ctx.tenant_id)
        .fetch_optional(&self.pool)
        .await?)
    }
}
