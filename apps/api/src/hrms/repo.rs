use async_trait::async_trait;
use uuid::Uuid;

use crate::db::PgStore;
use crate::errors::AppError;
use crate::hrms::models::{EmployeeDraft, EmployeeRow, EmployeeUpdate, HeadcountBucket};
use crate::listing::{fetch_page, ListParams, ListSpec, Page};
use crate::tenancy::RequestContext;

/// Tenant-scoped persistence for employees.
#[async_trait]
pub trait HrStore: Send + Sync {
    async fn insert_employee(
        &self,
        ctx: &RequestContext,
        employee: &EmployeeDraft,
    ) -> Result<EmployeeRow, AppError>;
    async fn list_employees(
        &self,
        ctx: &RequestContext,
        params: &ListParams,
    ) -> Result<Page<EmployeeRow>, AppError>;
    async fn get_employee(
        &self,
        ctx: &RequestContext,
        id: Uuid,
    ) -> Result<Option<EmployeeRow>, AppError>;
    /// True when another employee of the tenant already uses `email`.
    async fn employee_email_taken(
        &self,
        ctx: &RequestContext,
        email: &str,
        except: Option<Uuid>,
    ) -> Result<bool, AppError>;
    async fn update_employee(
        &self,
        ctx: &RequestContext,
        id: Uuid,
        update: &EmployeeUpdate,
    ) -> Result<Option<EmployeeRow>, AppError>;
    async fn delete_employee(&self, ctx: &RequestContext, id: Uuid) -> Result<bool, AppError>;
    async fn headcount_by_department(
        &self,
        ctx: &RequestContext,
    ) -> Result<Vec<HeadcountBucket>, AppError>;
    async fn headcount_by_status(
        &self,
        ctx: &RequestContext,
    ) -> Result<Vec<HeadcountBucket>, AppError>;
}

pub const UNASSIGNED_DEPARTMENT: &str = "Unassigned";

const EMPLOYEE_LIST: ListSpec = ListSpec {
    table: "employees",
    search_columns: &["first_name", "last_name", "email", "department", "designation"],
    status_column: Some("status"),
    sort_columns: &[
        "created_at",
        "updated_at",
        "first_name",
        "last_name",
        "department",
        "date_of_joining",
    ],
    default_sort: "created_at",
};

#[async_trait]
impl HrStore for PgStore {
    async fn insert_employee(
        &self,
        ctx: &RequestContext,
        employee: &EmployeeDraft,
    ) -> Result<EmployeeRow, AppError> {
        Ok(sqlx::query_as::<_, EmployeeRow>(
            r#"
            INSERT INTO employees
                (tenant_id, first_name, last_name, email, department, designation,
                 employment_type, status, date_of_joining, manager_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(ctx.tenant_id)
        .bind(&employee.first_name)
        .bind(&employee.last_name)
        .bind(&employee.email)
        .bind(&employee.department)
        .bind(&employee.designation)
        .bind(&employee.employment_type)
        .bind(employee.status.as_str())
        .bind(employee.date_of_joining)
        .bind(employee.manager_id)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn list_employees(
        &self,
        ctx: &RequestContext,
        params: &ListParams,
    ) -> Result<Page<EmployeeRow>, AppError> {
        fetch_page(&self.pool, ctx, params, &EMPLOYEE_LIST).await
    }

    async fn get_employee(
        &self,
        ctx: &RequestContext,
        id: Uuid,
    ) -> Result<Option<EmployeeRow>, AppError> {
        Ok(sqlx::query_as::<_, EmployeeRow>(
            "SELECT * FROM employees WHERE id = $1 AND tenant_id = $2",
        )
        .bind(id)
        .bind(ctx.tenant_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn employee_email_taken(
        &self,
        ctx: &RequestContext,
        email: &str,
        except: Option<Uuid>,
    ) -> Result<bool, AppError> {
        let taken: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM employees
                WHERE tenant_id = $1 AND email = $2 AND ($3::UUID IS NULL OR id <> $3)
            )
            "#,
        )
        .bind(ctx.tenant_id)
        .bind(email)
        .bind(except)
        .fetch_one(&self.pool)
        .await?;
        Ok(taken)
    }

    async fn update_employee(
        &self,
        ctx: &RequestContext,
        id: Uuid,
        update: &EmployeeUpdate,
    ) -> Result<Option<EmployeeRow>, AppError> {
        Ok(sqlx::query_as::<_, EmployeeRow>(
            r#"
            UPDATE employees SET
                first_name = COALESCE($1, first_name),
                last_name = COALESCE($2, last_name),
                email = COALESCE($3, email),
                department = COALESCE($4, department),
                designation = COALESCE($5, designation),
                employment_type = COALESCE($6, employment_type),
                status = COALESCE($7, status),
                date_of_joining = COALESCE($8, date_of_joining),
                manager_id = COALESCE($9, manager_id),
                updated_at = NOW()
            WHERE id = $10 AND tenant_id = $11
            RETURNING *
            "#,
        )
        .bind(&update.first_name)
        .bind(&update.last_name)
        .bind(&update.email)
        .bind(&update.department)
        .bind(&update.designation)
        .bind(&update.employment_type)
        .bind(update.status.map(|s| s.as_str()))
        .bind(update.date_of_joining)
        .bind(update.manager_id)
        .bind(id)
        .bind(ctx.tenant_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn delete_employee(&self, ctx: &RequestContext, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM employees WHERE id = $1 AND tenant_id = $2")
            .bind(id)
            .bind(ctx.tenant_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn headcount_by_department(
        &self,
        ctx: &RequestContext,
    ) -> Result<Vec<HeadcountBucket>, AppError> {
        Ok(sqlx::query_as::<_, HeadcountBucket>(
            r#"
            SELECT COALESCE(department, $2) AS key, COUNT(*) AS count
            FROM employees
            WHERE tenant_id = $1
            GROUP BY 1
            ORDER BY count DESC, key ASC
            "#,
        )
        .bind(ctx.tenant_id)
        .bind(UNASSIGNED_DEPARTMENT)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn headcount_by_status(
        &self,
        ctx: &RequestContext,
    ) -> Result<Vec<HeadcountBucket>, AppError> {
        Ok(sqlx::query_as::<_, HeadcountBucket>(
            r#"
            SELECT status AS key, COUNT(*) AS count
            FROM employees
            WHERE tenant_id = $1
            GROUP BY status
            ORDER BY count DESC, key ASC
            "#,
        )
        .bind(ctx.tenant_id)
        .fetch_all(&self.pool)
        .await?)
    }
}
