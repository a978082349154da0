pub mod health;

use axum::{
    routing::{get, patch, post},
    Router,
};

use crate::state::AppState;
use crate::{admin, bench, crm, hrms, talent};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // CRM
        .route(
            "/api/v1/crm/leads",
            post(crm::handlers::handle_create_lead).get(crm::handlers::handle_list_leads),
        )
        .route(
            "/api/v1/crm/leads/:id",
            get(crm::handlers::handle_get_lead).delete(crm::handlers::handle_delete_lead),
        )
        .route(
            "/api/v1/crm/leads/:id/status",
            patch(crm::handlers::handle_update_lead_status),
        )
        .route(
            "/api/v1/crm/leads/:id/score",
            post(crm::handlers::handle_score_lead),
        )
        .route(
            "/api/v1/crm/import/leads",
            post(crm::handlers::handle_import_leads),
        )
        .route(
            "/api/v1/crm/export/leads",
            get(crm::handlers::handle_export_leads),
        )
        .route(
            "/api/v1/crm/opportunities",
            post(crm::handlers::handle_create_opportunity)
                .get(crm::handlers::handle_list_opportunities),
        )
        .route(
            "/api/v1/crm/opportunities/:id/stage",
            patch(crm::handlers::handle_update_opportunity_stage),
        )
        .route(
            "/api/v1/crm/opportunities/:id/insights",
            post(crm::handlers::handle_refresh_opportunity_insights),
        )
        .route(
            "/api/v1/crm/pipeline",
            get(crm::handlers::handle_pipeline_summary),
        )
        // Talent
        .route(
            "/api/v1/talent/requisitions",
            post(talent::handlers::handle_create_requisition)
                .get(talent::handlers::handle_list_requisitions),
        )
        .route(
            "/api/v1/talent/requisitions/:id/ranking",
            get(talent::handlers::handle_rank_candidates),
        )
        .route(
            "/api/v1/talent/candidates",
            post(talent::handlers::handle_create_candidate)
                .get(talent::handlers::handle_list_candidates),
        )
        .route(
            "/api/v1/talent/candidates/:id/status",
            patch(talent::handlers::handle_update_candidate_status),
        )
        .route(
            "/api/v1/talent/candidates/:id/match/:requisition_id",
            post(talent::handlers::handle_match_candidate),
        )
        .route(
            "/api/v1/talent/candidates/:id/questions/:requisition_id",
            post(talent::handlers::handle_interview_questions),
        )
        .route(
            "/api/v1/talent/resume/parse",
            post(talent::handlers::handle_parse_resume),
        )
        // HRMS
        .route(
            "/api/v1/hrms/employees",
            post(hrms::handlers::handle_create_employee).get(hrms::handlers::handle_list_employees),
        )
        .route(
            "/api/v1/hrms/employees/:id",
            patch(hrms::handlers::handle_update_employee)
                .delete(hrms::handlers::handle_delete_employee),
        )
        .route(
            "/api/v1/hrms/headcount",
            get(hrms::handlers::handle_headcount),
        )
        // Bench
        .route(
            "/api/v1/bench/resources",
            post(bench::handlers::handle_add_bench_resource)
                .get(bench::handlers::handle_list_bench),
        )
        .route(
            "/api/v1/bench/resources/:id/availability",
            patch(bench::handlers::handle_update_availability),
        )
        .route(
            "/api/v1/bench/requisitions/:id/matches",
            get(bench::handlers::handle_match_resources),
        )
        // Admin
        .route(
            "/api/v1/admin/overview",
            get(admin::handlers::handle_tenant_overview),
        )
        .route(
            "/api/v1/admin/audit",
            get(admin::handlers::handle_list_audit_log),
        )
        .with_state(state)
}
