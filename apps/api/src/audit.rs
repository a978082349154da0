//! Append-only audit log. One row per create/update/delete/import/score action.
//!
//! The `hash` column is reserved for an external hash-chain helper; this
//! service stores it when supplied and never computes it.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

use crate::db::PgStore;
use crate::errors::AppError;
use crate::listing::{fetch_page, ListParams, ListSpec, Page};
use crate::tenancy::RequestContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Create,
    Update,
    Delete,
    Import,
    Score,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Create => "create",
            AuditAction::Update => "update",
            AuditAction::Delete => "delete",
            AuditAction::Import => "import",
            AuditAction::Score => "score",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AuditEntryRow {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub actor_id: Uuid,
    pub action: String,
    pub entity: String,
    pub entity_id: Option<Uuid>,
    pub metadata: Value,
    pub hash: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewAuditEntry {
    pub action: AuditAction,
    pub entity: &'static str,
    pub entity_id: Option<Uuid>,
    pub metadata: Value,
}

impl NewAuditEntry {
    pub fn new(action: AuditAction, entity: &'static str, entity_id: Uuid) -> Self {
        Self {
            action,
            entity,
            entity_id: Some(entity_id),
            metadata: Value::Object(Default::default()),
        }
    }

    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = metadata;
        self
    }
}

#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, ctx: &RequestContext, entry: NewAuditEntry) -> Result<(), AppError>;

    async fn list_audit(
        &self,
        ctx: &RequestContext,
        params: &ListParams,
    ) -> Result<Page<AuditEntryRow>, AppError>;
}

const AUDIT_LIST: ListSpec = ListSpec {
    table: "audit_logs",
    search_columns: &["action", "entity"],
    status_column: None,
    sort_columns: &["created_at", "action", "entity"],
    default_sort: "created_at",
};

#[async_trait]
impl AuditSink for PgStore {
    async fn record(&self, ctx: &RequestContext, entry: NewAuditEntry) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO audit_logs (tenant_id, actor_id, action, entity, entity_id, metadata)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(ctx.tenant_id)
        .bind(ctx.user_id)
        .bind(entry.action.as_str())
        .bind(entry.entity)
        .bind(entry.entity_id)
        .bind(&entry.metadata)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_audit(
        &self,
        ctx: &RequestContext,
        params: &ListParams,
    ) -> Result<Page<AuditEntryRow>, AppError> {
        fetch_page(&self.pool, ctx, params, &AUDIT_LIST).await
    }
}
