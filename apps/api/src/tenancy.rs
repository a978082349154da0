//! Tenant resolution and the tenant-scoped action wrapper.
//!
//! Authentication is delegated to the upstream gateway, which forwards the
//! authenticated user id in the `x-user-id` header. Every action turns that
//! into an explicit `RequestContext` before touching any business table.

use std::convert::Infallible;
use std::future::Future;

use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};
use serde::Serialize;
use uuid::Uuid;

use crate::db::PgStore;
use crate::errors::AppError;
use crate::response::ActionResponse;

pub const USER_ID_HEADER: &str = "x-user-id";

/// The resolved identity of the caller. Passed to every store call so the
/// tenant filter is never looked up ambiently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RequestContext {
    pub tenant_id: Uuid,
    pub user_id: Uuid,
}

/// The caller as seen by the HTTP layer. `None` when the header is absent or malformed.
#[derive(Debug, Clone, Copy, Default)]
pub struct Caller(pub Option<Uuid>);

#[axum::async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Caller {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| Uuid::parse_str(s.trim()).ok());
        Ok(Caller(user_id))
    }
}

/// Maps a user to the tenant recorded on their profile row.
#[async_trait]
pub trait ProfileDirectory: Send + Sync {
    async fn tenant_for_user(&self, user_id: Uuid) -> Result<Option<Uuid>, AppError>;
}

#[async_trait]
impl ProfileDirectory for PgStore {
    async fn tenant_for_user(&self, user_id: Uuid) -> Result<Option<Uuid>, AppError> {
        let tenant_id =
            sqlx::query_scalar::<_, Option<Uuid>>("SELECT tenant_id FROM profiles WHERE id = $1")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?
                .flatten();
        Ok(tenant_id)
    }
}

pub async fn resolve_context<D>(directory: &D, caller: Caller) -> Result<RequestContext, AppError>
where
    D: ProfileDirectory + ?Sized,
{
    let user_id = caller.0.ok_or(AppError::Unauthorized)?;
    let tenant_id = directory
        .tenant_for_user(user_id)
        .await?
        .ok_or(AppError::TenantNotFound)?;
    Ok(RequestContext { tenant_id, user_id })
}

/// Runs `op` under the tenant-scoped action contract: resolve the caller,
/// resolve the tenant, then hand the context to the operation. Every failure,
/// including those raised by `op`, ends up in the envelope.
pub async fn tenant_action<D, T, F, Fut>(directory: &D, caller: Caller, op: F) -> ActionResponse<T>
where
    D: ProfileDirectory + ?Sized,
    T: Serialize,
    F: FnOnce(RequestContext) -> Fut,
    Fut: Future<Output = Result<T, AppError>>,
{
    let result = match resolve_context(directory, caller).await {
        Ok(ctx) => op(ctx).await,
        Err(e) => Err(e),
    };
    ActionResponse::from(result)
}
