use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::audit::{AuditAction, AuditSink, NewAuditEntry};
use crate::errors::AppError;
use crate::hrms::models::{EmployeeRow, EmployeeUpdate, Headcount, NewEmployee};
use crate::hrms::repo::HrStore;
use crate::listing::{ListParams, Page};
use crate::tenancy::RequestContext;

pub trait HrBackend: HrStore + AuditSink {}
impl<T: HrStore + AuditSink + ?Sized> HrBackend for T {}

fn employee_not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Employee {id} not found"))
}

fn email_conflict(email: &str) -> AppError {
    AppError::Conflict(format!("An employee with email {email} already exists"))
}

async fn ensure_manager<S: HrBackend + ?Sized>(
    store: &S,
    ctx: &RequestContext,
    manager_id: Option<Uuid>,
) -> Result<(), AppError> {
    if let Some(id) = manager_id {
        store
            .get_employee(ctx, id)
            .await?
            .ok_or_else(|| AppError::Validation(format!("Manager {id} not found")))?;
    }
    Ok(())
}

pub async fn create_employee<S: HrBackend + ?Sized>(
    store: &S,
    ctx: &RequestContext,
    input: NewEmployee,
) -> Result<EmployeeRow, AppError> {
    let draft = input.validated()?;

    if store.employee_email_taken(ctx, &draft.email, None).await? {
        return Err(email_conflict(&draft.email));
    }
    ensure_manager(store, ctx, draft.manager_id).await?;

    let employee = store.insert_employee(ctx, &draft).await?;
    store
        .record(ctx, NewAuditEntry::new(AuditAction::Create, "employee", employee.id))
        .await?;
    info!(
        "Created employee {} for tenant {}",
        employee.id, ctx.tenant_id
    );
    Ok(employee)
}

pub async fn list_employees<S: HrBackend + ?Sized>(
    store: &S,
    ctx: &RequestContext,
    params: &ListParams,
) -> Result<Page<EmployeeRow>, AppError> {
    store.list_employees(ctx, params).await
}

pub async fn update_employee<S: HrBackend + ?Sized>(
    store: &S,
    ctx: &RequestContext,
    id: Uuid,
    input: EmployeeUpdate,
) -> Result<EmployeeRow, AppError> {
    let update = input.validated()?;
    if update.is_empty() {
        return Err(AppError::Validation("No fields to update".to_string()));
    }
    if update.manager_id == Some(id) {
        return Err(AppError::Validation(
            "An employee cannot be their own manager".to_string(),
        ));
    }

    if let Some(email) = &update.email {
        if store.employee_email_taken(ctx, email, Some(id)).await? {
            return Err(email_conflict(email));
        }
    }
    ensure_manager(store, ctx, update.manager_id).await?;

    let employee = store
        .update_employee(ctx, id, &update)
        .await?
        .ok_or_else(|| employee_not_found(id))?;
    store
        .record(
            ctx,
            NewAuditEntry::new(AuditAction::Update, "employee", id)
                .with_metadata(json!({ "changes": update })),
        )
        .await?;
    Ok(employee)
}

pub async fn delete_employee<S: HrBackend + ?Sized>(
    store: &S,
    ctx: &RequestContext,
    id: Uuid,
) -> Result<(), AppError> {
    if !store.delete_employee(ctx, id).await? {
        return Err(employee_not_found(id));
    }
    store
        .record(ctx, NewAuditEntry::new(AuditAction::Delete, "employee", id))
        .await?;
    Ok(())
}

pub async fn headcount<S: HrBackend + ?Sized>(
    store: &S,
    ctx: &RequestContext,
) -> Result<Headcount, AppError> {
    let by_department = store.headcount_by_department(ctx).await?;
    let by_status = store.headcount_by_status(ctx).await?;
    let total = by_status.iter().map(|b| b.count).sum();

    Ok(Headcount {
        total,
        by_department,
        by_status,
    })
}
