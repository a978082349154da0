//! Search / filter / sort / paginate parameters shared by every list action,
//! and the tenant-filtered query builder that applies them.

use serde::{Deserialize, Serialize};
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};

use crate::errors::AppError;
use crate::tenancy::RequestContext;

pub const DEFAULT_PER_PAGE: u32 = 20;
pub const MAX_PER_PAGE: u32 = 100;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    fn as_sql(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListParams {
    pub search: Option<String>,
    /// Comma-separated list of statuses, matched with `= ANY(...)`.
    pub status: Option<String>,
    pub sort_by: Option<String>,
    pub sort_dir: Option<SortDirection>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl ListParams {
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn per_page(&self) -> u32 {
        self.per_page
            .unwrap_or(DEFAULT_PER_PAGE)
            .clamp(1, MAX_PER_PAGE)
    }

    pub fn offset(&self) -> i64 {
        (self.page() as i64 - 1) * self.per_page() as i64
    }

    pub fn search_term(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    pub fn statuses(&self) -> Vec<String> {
        self.status
            .as_deref()
            .map(|s| {
                s.split(',')
                    .map(|part| part.trim().to_string())
                    .filter(|part| !part.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Only whitelisted columns reach the ORDER BY clause.
    pub fn sort_column<'a>(&self, allowed: &[&'a str], default: &'a str) -> &'a str {
        self.sort_by
            .as_deref()
            .and_then(|requested| allowed.iter().copied().find(|c| *c == requested))
            .unwrap_or(default)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: u32,
    pub per_page: u32,
}

/// Per-table description of what a list action may search and sort on.
pub struct ListSpec {
    pub table: &'static str,
    pub search_columns: &'static [&'static str],
    /// Column matched by the `status` parameter; `None` ignores the parameter.
    pub status_column: Option<&'static str>,
    pub sort_columns: &'static [&'static str],
    pub default_sort: &'static str,
}

fn push_filters(
    builder: &mut QueryBuilder<'_, Postgres>,
    ctx: &RequestContext,
    params: &ListParams,
    spec: &ListSpec,
) {
    builder.push(" WHERE tenant_id = ").push_bind(ctx.tenant_id);

    if let Some(term) = params.search_term() {
        if !spec.search_columns.is_empty() {
            let pattern = format!("%{term}%");
            builder.push(" AND (");
            for (i, column) in spec.search_columns.iter().enumerate() {
                if i > 0 {
                    builder.push(" OR ");
                }
                builder
                    .push(*column)
                    .push(" ILIKE ")
                    .push_bind(pattern.clone());
            }
            builder.push(")");
        }
    }

    let statuses = params.statuses();
    if let Some(column) = spec.status_column {
        if !statuses.is_empty() {
            builder
                .push(" AND ")
                .push(column)
                .push(" = ANY(")
                .push_bind(statuses)
                .push(")");
        }
    }
}

/// Runs the count and page queries for a tenant-scoped listing.
pub async fn fetch_page<T>(
    pool: &PgPool,
    ctx: &RequestContext,
    params: &ListParams,
    spec: &ListSpec,
) -> Result<Page<T>, AppError>
where
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM ");
    count.push(spec.table);
    push_filters(&mut count, ctx, params, spec);
    let total: i64 = count.build_query_scalar().fetch_one(pool).await?;

    let mut select = QueryBuilder::<Postgres>::new("SELECT * FROM ");
    select.push(spec.table);
    push_filters(&mut select, ctx, params, spec);
    let column = params.sort_column(spec.sort_columns, spec.default_sort);
    let direction = params.sort_dir.unwrap_or_default();
    select
        .push(" ORDER BY ")
        .push(column)
        .push(" ")
        .push(direction.as_sql())
        .push(" LIMIT ")
        .push_bind(params.per_page() as i64)
        .push(" OFFSET ")
        .push_bind(params.offset());

    let items: Vec<T> = select.build_query_as().fetch_all(pool).await?;

    Ok(Page {
        items,
        total,
        page: params.page(),
        per_page: params.per_page(),
    })
}
