//! Tenant overview and audit log access.

pub mod handlers;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::audit::{AuditEntryRow, AuditSink};
use crate::db::PgStore;
use crate::errors::AppError;
use crate::listing::{ListParams, Page};
use crate::tenancy::RequestContext;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TenantRow {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub plan: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct EntityCounts {
    pub users: i64,
    pub leads: i64,
    pub opportunities: i64,
    pub requisitions: i64,
    pub candidates: i64,
    pub employees: i64,
    pub bench_resources: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TenantOverview {
    pub tenant: TenantRow,
    pub counts: EntityCounts,
}

#[async_trait]
pub trait AdminStore: Send + Sync {
    async fn get_tenant(&self, ctx: &RequestContext) -> Result<Option<TenantRow>, AppError>;
    async fn entity_counts(&self, ctx: &RequestContext) -> Result<EntityCounts, AppError>;
}

#[async_trait]
impl AdminStore for PgStore {
    async fn get_tenant(&self, ctx: &RequestContext) -> Result<Option<TenantRow>, AppError> {
        Ok(
            sqlx::query_as::<_, TenantRow>("SELECT * FROM tenants WHERE id = $1")
                .bind(ctx.tenant_id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn entity_counts(&self, ctx: &RequestContext) -> Result<EntityCounts, AppError> {
        Ok(sqlx::query_as::<_, EntityCounts>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM profiles WHERE tenant_id = $1) AS users,
                (SELECT COUNT(*) FROM leads WHERE tenant_id = $1) AS leads,
                (SELECT COUNT(*) FROM opportunities WHERE tenant_id = $1) AS opportunities,
                (SELECT COUNT(*) FROM requisitions WHERE tenant_id = $1) AS requisitions,
                (SELECT COUNT(*) FROM candidates WHERE tenant_id = $1) AS candidates,
                (SELECT COUNT(*) FROM employees WHERE tenant_id = $1) AS employees,
                (SELECT COUNT(*) FROM bench_resources WHERE tenant_id = $1) AS bench_resources
            "#,
        )
        .bind(ctx.tenant_id)
        .fetch_one(&self.pool)
        .await?)
    }
}

pub async fn tenant_overview<S: AdminStore + ?Sized>(
    store: &S,
    ctx: &RequestContext,
) -> Result<TenantOverview, AppError> {
    let tenant = store
        .get_tenant(ctx)
        .await?
        .ok_or(AppError::TenantNotFound)?;
    let counts = store.entity_counts(ctx).await?;
    Ok(TenantOverview { tenant, counts })
}

pub async fn list_audit_log<S: AuditSink + ?Sized>(
    store: &S,
    ctx: &RequestContext,
    params: &ListParams,
) -> Result<Page<AuditEntryRow>, AppError> {
    store.list_audit(ctx, params).await
}
