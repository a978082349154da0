use axum::extract::{rejection::QueryRejection, Query, State};

use crate::admin::{self, TenantOverview};
use crate::audit::AuditEntryRow;
use crate::listing::{ListParams, Page};
use crate::response::ActionResponse;
use crate::state::AppState;
use crate::tenancy::{tenant_action, Caller};
use crate::validation::query_params;

/// GET /api/v1/admin/overview
pub async fn handle_tenant_overview(
    State(state): State<AppState>,
    caller: Caller,
) -> ActionResponse<TenantOverview> {
    let store = &state.store;
    tenant_action(store, caller, |ctx| async move {
        admin::tenant_overview(store, &ctx).await
    })
    .await
}

/// GET /api/v1/admin/audit
pub async fn handle_list_audit_log(
    State(state): State<AppState>,
    caller: Caller,
    params: Result<Query<ListParams>, QueryRejection>,
) -> ActionResponse<Page<AuditEntryRow>> {
    let store = &state.store;
    tenant_action(store, caller, |ctx| async move {
        admin::list_audit_log(store, &ctx, &query_params(params)?).await
    })
    .await
}
