//! In-memory store and scripted completion client for unit tests.
//!
//! `MemoryStore` implements every store trait with the same tenant filtering
//! as the Postgres queries. Directory lookups and data-layer calls are counted
//! separately so tests can assert that a rejected action touched nothing.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use sqlx::types::Json;
use uuid::Uuid;

use crate::admin::{AdminStore, EntityCounts, TenantRow};
use crate::audit::{AuditEntryRow, AuditSink, NewAuditEntry};
use crate::bench::models::{Availability, BenchResourceDraft, BenchResourceRow};
use crate::bench::repo::BenchStore;
use crate::crm::models::{
    LeadDraft, LeadRow, LeadStatus, OpportunityDraft, OpportunityRow, StageChange, StageSummary,
};
use crate::crm::repo::CrmStore;
use crate::enrichment::insights::{CandidateSummary, LeadScore, OpportunityInsights};
use crate::enrichment::queue::EnrichmentSink;
use crate::errors::AppError;
use crate::hrms::models::{EmployeeDraft, EmployeeRow, EmployeeUpdate, HeadcountBucket};
use crate::hrms::repo::{HrStore, UNASSIGNED_DEPARTMENT};
use crate::listing::{ListParams, Page};
use crate::llm_client::{CompletionClient, LlmError};
use crate::talent::models::{
    CandidateDraft, CandidateRow, CandidateStatus, MatchScoreRow, MatchUpsert, RequisitionDraft,
    RequisitionRow,
};
use crate::talent::repo::TalentStore;
use crate::tenancy::{ProfileDirectory, RequestContext};

// ────────────────────────────────────────────────────────────────────────────
// Completion client
// ────────────────────────────────────────────────────────────────────────────

/// Returns the same reply (or the same failure) for every call.
pub struct ScriptedLlm {
    reply: Option<String>,
}

impl ScriptedLlm {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Some(reply.to_string()),
        }
    }

    pub fn failing() -> Self {
        Self { reply: None }
    }
}

#[async_trait]
impl CompletionClient for ScriptedLlm {
    async fn complete(
        &self,
        _prompt: &str,
        _system: &str,
        _max_tokens: u32,
    ) -> Result<String, LlmError> {
        self.reply.clone().ok_or(LlmError::Api {
            status: 529,
            message: "overloaded".to_string(),
        })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Fixtures
// ────────────────────────────────────────────────────────────────────────────

pub fn sample_lead() -> LeadRow {
    let now = Utc::now();
    LeadRow {
        id: Uuid::new_v4(),
        tenant_id: Uuid::new_v4(),
        first_name: "Ada".to_string(),
        last_name: Some("Lovelace".to_string()),
        email: "ada@example.com".to_string(),
        phone: None,
        company: Some("Analytical Engines".to_string()),
        job_title: Some("Analyst".to_string()),
        source: Some("referral".to_string()),
        status: LeadStatus::New.as_str().to_string(),
        score: None,
        ai_insights: None,
        created_by: Uuid::new_v4(),
        created_at: now,
        updated_at: now,
    }
}

pub fn sample_opportunity() -> OpportunityRow {
    let now = Utc::now();
    OpportunityRow {
        id: Uuid::new_v4(),
        tenant_id: Uuid::new_v4(),
        lead_id: None,
        name: "Annual renewal".to_string(),
        company: Some("Acme".to_string()),
        amount: 48_000.0,
        stage: "proposal".to_string(),
        probability: 40,
        status: "open".to_string(),
        expected_close_date: NaiveDate::from_ymd_opt(2026, 12, 15),
        win_probability: None,
        risk_score: None,
        ai_insights: None,
        created_by: Uuid::new_v4(),
        created_at: now,
        updated_at: now,
    }
}

pub fn sample_candidate() -> CandidateRow {
    let now = Utc::now();
    CandidateRow {
        id: Uuid::new_v4(),
        tenant_id: Uuid::new_v4(),
        full_name: "Grace Hopper".to_string(),
        email: "grace@example.com".to_string(),
        phone: None,
        skills: vec!["COBOL".to_string(), "Compilers".to_string()],
        experience_years: Some(12.0),
        current_title: Some("Rear Admiral".to_string()),
        status: CandidateStatus::Applied.as_str().to_string(),
        ai_summary: None,
        ai_strengths: vec![],
        ai_concerns: vec![],
        created_by: Uuid::new_v4(),
        created_at: now,
        updated_at: now,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Store
// ────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
struct Tables {
    tenants: Vec<TenantRow>,
    profiles: HashMap<Uuid, Uuid>,
    leads: Vec<LeadRow>,
    opportunities: Vec<OpportunityRow>,
    requisitions: Vec<RequisitionRow>,
    candidates: Vec<CandidateRow>,
    match_scores: Vec<MatchScoreRow>,
    employees: Vec<EmployeeRow>,
    bench: Vec<BenchResourceRow>,
    audit: Vec<AuditEntryRow>,
    opportunity_insights: HashMap<Uuid, OpportunityInsights>,
    lead_scores: HashMap<Uuid, LeadScore>,
    candidate_summaries: HashMap<Uuid, CandidateSummary>,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    directory_calls: AtomicUsize,
    data_calls: AtomicUsize,
    fail_enrichment_writes: AtomicBool,
    rejected_lead_emails: Mutex<HashSet<String>>,
}

/// Newest first, then paginated, like the default list ordering.
fn paginate<T: Clone>(rows: Vec<T>, params: &ListParams) -> Page<T> {
    let total = rows.len() as i64;
    let items = rows
        .into_iter()
        .rev()
        .skip(params.offset() as usize)
        .take(params.per_page() as usize)
        .collect();
    Page {
        items,
        total,
        page: params.page(),
        per_page: params.per_page(),
    }
}

fn status_matches(status: &str, params: &ListParams) -> bool {
    let wanted = params.statuses();
    wanted.is_empty() || wanted.iter().any(|s| s == status)
}

impl MemoryStore {
    fn tables(&self) -> std::sync::MutexGuard<'_, Tables> {
        self.tables.lock().unwrap()
    }

    fn touch(&self) {
        self.data_calls.fetch_add(1, Ordering::SeqCst);
    }

    /// Creates a tenant with one profile and returns its context.
    pub fn seed_user(&self) -> RequestContext {
        let ctx = RequestContext {
            tenant_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
        };
        let mut tables = self.tables();
        tables.tenants.push(TenantRow {
            id: ctx.tenant_id,
            name: "Acme Corp".to_string(),
            slug: format!("acme-{}", &ctx.tenant_id.simple().to_string()[..8]),
            plan: "starter".to_string(),
            created_at: Utc::now(),
        });
        tables.profiles.insert(ctx.user_id, ctx.tenant_id);
        ctx
    }

    pub fn directory_calls(&self) -> usize {
        self.directory_calls.load(Ordering::SeqCst)
    }

    pub fn data_calls(&self) -> usize {
        self.data_calls.load(Ordering::SeqCst)
    }

    pub fn fail_enrichment_writes(&self) {
        self.fail_enrichment_writes.store(true, Ordering::SeqCst);
    }

    /// Makes `insert_lead` fail with a database error for this email.
    pub fn reject_lead_inserts_for(&self, email: &str) {
        self.rejected_lead_emails
            .lock()
            .unwrap()
            .insert(email.to_string());
    }

    pub fn saved_opportunity_insights(&self, id: Uuid) -> Option<OpportunityInsights> {
        self.tables().opportunity_insights.get(&id).cloned()
    }

    pub fn saved_lead_score(&self, id: Uuid) -> Option<LeadScore> {
        self.tables().lead_scores.get(&id).cloned()
    }

    pub fn saved_candidate_summary(&self, id: Uuid) -> Option<CandidateSummary> {
        self.tables().candidate_summaries.get(&id).cloned()
    }

    pub fn audit_entries(&self) -> Vec<AuditEntryRow> {
        self.tables().audit.clone()
    }

    pub fn leads_for(&self, ctx: &RequestContext) -> Vec<LeadRow> {
        self.tables()
            .leads
            .iter()
            .filter(|l| l.tenant_id == ctx.tenant_id)
            .cloned()
            .collect()
    }

    pub fn match_scores(&self) -> Vec<MatchScoreRow> {
        self.tables().match_scores.clone()
    }

    fn check_enrichment_write(&self) -> Result<(), AppError> {
        if self.fail_enrichment_writes.load(Ordering::SeqCst) {
            return Err(AppError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

#[async_trait]
impl ProfileDirectory for MemoryStore {
    async fn tenant_for_user(&self, user_id: Uuid) -> Result<Option<Uuid>, AppError> {
        self.directory_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.tables().profiles.get(&user_id).copied())
    }
}

#[async_trait]
impl AuditSink for MemoryStore {
    async fn record(&self, ctx: &RequestContext, entry: NewAuditEntry) -> Result<(), AppError> {
        self.touch();
        self.tables().audit.push(AuditEntryRow {
            id: Uuid::new_v4(),
            tenant_id: ctx.tenant_id,
            actor_id: ctx.user_id,
            action: entry.action.as_str().to_string(),
            entity: entry.entity.to_string(),
            entity_id: entry.entity_id,
            metadata: entry.metadata,
            hash: None,
            created_at: Utc::now(),
        });
        Ok(())
    }

    async fn list_audit(
        &self,
        ctx: &RequestContext,
        params: &ListParams,
    ) -> Result<Page<AuditEntryRow>, AppError> {
        self.touch();
        let rows = self
            .tables()
            .audit
            .iter()
            .filter(|e| e.tenant_id == ctx.tenant_id)
            .cloned()
            .collect();
        Ok(paginate(rows, params))
    }
}

#[async_trait]
impl CrmStore for MemoryStore {
    async fn insert_lead(
        &self,
        ctx: &RequestContext,
        lead: &LeadDraft,
    ) -> Result<LeadRow, AppError> {
        self.touch();
        if self.rejected_lead_emails.lock().unwrap().contains(&lead.email) {
            return Err(AppError::Database(sqlx::Error::PoolTimedOut));
        }
        let now = Utc::now();
        let row = LeadRow {
            id: Uuid::new_v4(),
            tenant_id: ctx.tenant_id,
            first_name: lead.first_name.clone(),
            last_name: lead.last_name.clone(),
            email: lead.email.clone(),
            phone: lead.phone.clone(),
            company: lead.company.clone(),
            job_title: lead.job_title.clone(),
            source: lead.source.clone(),
            status: lead.status.as_str().to_string(),
            score: None,
            ai_insights: None,
            created_by: ctx.user_id,
            created_at: now,
            updated_at: now,
        };
        self.tables().leads.push(row.clone());
        Ok(row)
    }

    async fn list_leads(
        &self,
        ctx: &RequestContext,
        params: &ListParams,
    ) -> Result<Page<LeadRow>, AppError> {
        self.touch();
        let rows = self
            .tables()
            .leads
            .iter()
            .filter(|l| l.tenant_id == ctx.tenant_id && status_matches(&l.status, params))
            .cloned()
            .collect();
        Ok(paginate(rows, params))
    }

    async fn all_leads(&self, ctx: &RequestContext) -> Result<Vec<LeadRow>, AppError> {
        self.touch();
        Ok(self.leads_for(ctx))
    }

    async fn get_lead(&self, ctx: &RequestContext, id: Uuid) -> Result<Option<LeadRow>, AppError> {
        self.touch();
        Ok(self
            .tables()
            .leads
            .iter()
            .find(|l| l.id == id && l.tenant_id == ctx.tenant_id)
            .cloned())
    }

    async fn lead_email_exists(&self, ctx: &RequestContext, email: &str) -> Result<bool, AppError> {
        self.touch();
        Ok(self
            .tables()
            .leads
            .iter()
            .any(|l| l.tenant_id == ctx.tenant_id && l.email == email))
    }

    async fn update_lead_status(
        &self,
        ctx: &RequestContext,
        id: Uuid,
        status: LeadStatus,
    ) -> Result<Option<LeadRow>, AppError> {
        self.touch();
        let mut tables = self.tables();
        Ok(tables
            .leads
            .iter_mut()
            .find(|l| l.id == id && l.tenant_id == ctx.tenant_id)
            .map(|l| {
                l.status = status.as_str().to_string();
                l.updated_at = Utc::now();
                l.clone()
            }))
    }

    async fn delete_lead(&self, ctx: &RequestContext, id: Uuid) -> Result<bool, AppError> {
        self.touch();
        let mut tables = self.tables();
        let before = tables.leads.len();
        tables
            .leads
            .retain(|l| !(l.id == id && l.tenant_id == ctx.tenant_id));
        Ok(tables.leads.len() < before)
    }

    async fn insert_opportunity(
        &self,
        ctx: &RequestContext,
        opp: &OpportunityDraft,
    ) -> Result<OpportunityRow, AppError> {
        self.touch();
        let now = Utc::now();
        let row = OpportunityRow {
            id: Uuid::new_v4(),
            tenant_id: ctx.tenant_id,
            lead_id: opp.lead_id,
            name: opp.name.clone(),
            company: opp.company.clone(),
            amount: opp.amount,
            stage: opp.stage.as_str().to_string(),
            probability: opp.probability,
            status: opp.status.as_str().to_string(),
            expected_close_date: opp.expected_close_date,
            win_probability: None,
            risk_score: None,
            ai_insights: None,
            created_by: ctx.user_id,
            created_at: now,
            updated_at: now,
        };
        self.tables().opportunities.push(row.clone());
        Ok(row)
    }

    async fn list_opportunities(
        &self,
        ctx: &RequestContext,
        params: &ListParams,
    ) -> Result<Page<OpportunityRow>, AppError> {
        self.touch();
        let rows = self
            .tables()
            .opportunities
            .iter()
            .filter(|o| o.tenant_id == ctx.tenant_id && status_matches(&o.status, params))
            .cloned()
            .collect();
        Ok(paginate(rows, params))
    }

    async fn get_opportunity(
        &self,
        ctx: &RequestContext,
        id: Uuid,
    ) -> Result<Option<OpportunityRow>, AppError> {
        self.touch();
        Ok(self
            .tables()
            .opportunities
            .iter()
            .find(|o| o.id == id && o.tenant_id == ctx.tenant_id)
            .cloned())
    }

    async fn update_opportunity_stage(
        &self,
        ctx: &RequestContext,
        id: Uuid,
        change: &StageChange,
    ) -> Result<Option<OpportunityRow>, AppError> {
        self.touch();
        let mut tables = self.tables();
        Ok(tables
            .opportunities
            .iter_mut()
            .find(|o| o.id == id && o.tenant_id == ctx.tenant_id)
            .map(|o| {
                o.stage = change.stage.as_str().to_string();
                o.status = change.status.as_str().to_string();
                if let Some(p) = change.probability {
                    o.probability = p;
                }
                o.updated_at = Utc::now();
                o.clone()
            }))
    }

    async fn pipeline_summary(&self, ctx: &RequestContext) -> Result<Vec<StageSummary>, AppError> {
        self.touch();
        let mut summary: Vec<StageSummary> = Vec::new();
        for opp in self
            .tables()
            .opportunities
            .iter()
            .filter(|o| o.tenant_id == ctx.tenant_id)
        {
            match summary.iter_mut().find(|s| s.stage == opp.stage) {
                Some(s) => {
                    s.count += 1;
                    s.total_amount += opp.amount;
                }
                None => summary.push(StageSummary {
                    stage: opp.stage.clone(),
                    count: 1,
                    total_amount: opp.amount,
                }),
            }
        }
        Ok(summary)
    }
}

#[async_trait]
impl EnrichmentSink for MemoryStore {
    async fn save_opportunity_insights(
        &self,
        ctx: &RequestContext,
        opportunity_id: Uuid,
        insights: &OpportunityInsights,
    ) -> Result<(), AppError> {
        self.check_enrichment_write()?;
        let mut tables = self.tables();
        if let Some(o) = tables
            .opportunities
            .iter_mut()
            .find(|o| o.id == opportunity_id && o.tenant_id == ctx.tenant_id)
        {
            o.win_probability = Some(insights.win_probability);
            o.risk_score = Some(insights.risk_score);
            o.ai_insights = Some(insights.insights.clone());
        }
        tables
            .opportunity_insights
            .insert(opportunity_id, insights.clone());
        Ok(())
    }

    async fn save_lead_score(
        &self,
        ctx: &RequestContext,
        lead_id: Uuid,
        score: &LeadScore,
    ) -> Result<(), AppError> {
        self.check_enrichment_write()?;
        let mut tables = self.tables();
        if let Some(l) = tables
            .leads
            .iter_mut()
            .find(|l| l.id == lead_id && l.tenant_id == ctx.tenant_id)
        {
            l.score = Some(score.score);
            l.ai_insights = Some(score.insights.clone());
        }
        tables.lead_scores.insert(lead_id, score.clone());
        Ok(())
    }

    async fn save_candidate_summary(
        &self,
        ctx: &RequestContext,
        candidate_id: Uuid,
        summary: &CandidateSummary,
    ) -> Result<(), AppError> {
        self.check_enrichment_write()?;
        let mut tables = self.tables();
        if let Some(c) = tables
            .candidates
            .iter_mut()
            .find(|c| c.id == candidate_id && c.tenant_id == ctx.tenant_id)
        {
            c.ai_summary = Some(summary.summary.clone());
            c.ai_strengths = summary.strengths.clone();
            c.ai_concerns = summary.concerns.clone();
        }
        tables
            .candidate_summaries
            .insert(candidate_id, summary.clone());
        Ok(())
    }
}

#[async_trait]
impl TalentStore for MemoryStore {
    async fn insert_requisition(
        &self,
        ctx: &RequestContext,
        req: &RequisitionDraft,
    ) -> Result<RequisitionRow, AppError> {
        self.touch();
        let row = RequisitionRow {
            id: Uuid::new_v4(),
            tenant_id: ctx.tenant_id,
            title: req.title.clone(),
            department: req.department.clone(),
            location: req.location.clone(),
            employment_type: req.employment_type.clone(),
            required_skills: req.required_skills.clone(),
            min_experience_years: req.min_experience_years,
            status: req.status.as_str().to_string(),
            description: req.description.clone(),
            created_by: ctx.user_id,
            created_at: Utc::now(),
        };
        self.tables().requisitions.push(row.clone());
        Ok(row)
    }

    async fn list_requisitions(
        &self,
        ctx: &RequestContext,
        params: &ListParams,
    ) -> Result<Page<RequisitionRow>, AppError> {
        self.touch();
        let rows = self
            .tables()
            .requisitions
            .iter()
            .filter(|r| r.tenant_id == ctx.tenant_id && status_matches(&r.status, params))
            .cloned()
            .collect();
        Ok(paginate(rows, params))
    }

    async fn get_requisition(
        &self,
        ctx: &RequestContext,
        id: Uuid,
    ) -> Result<Option<RequisitionRow>, AppError> {
        self.touch();
        Ok(self
            .tables()
            .requisitions
            .iter()
            .find(|r| r.id == id && r.tenant_id == ctx.tenant_id)
            .cloned())
    }

    async fn insert_candidate(
        &self,
        ctx: &RequestContext,
        candidate: &CandidateDraft,
    ) -> Result<CandidateRow, AppError> {
        self.touch();
        let now = Utc::now();
        let row = CandidateRow {
            id: Uuid::new_v4(),
            tenant_id: ctx.tenant_id,
            full_name: candidate.full_name.clone(),
            email: candidate.email.clone(),
            phone: candidate.phone.clone(),
            skills: candidate.skills.clone(),
            experience_years: candidate.experience_years,
            current_title: candidate.current_title.clone(),
            status: candidate.status.as_str().to_string(),
            ai_summary: None,
            ai_strengths: vec![],
            ai_concerns: vec![],
            created_by: ctx.user_id,
            created_at: now,
            updated_at: now,
        };
        self.tables().candidates.push(row.clone());
        Ok(row)
    }

    async fn list_candidates(
        &self,
        ctx: &RequestContext,
        params: &ListParams,
    ) -> Result<Page<CandidateRow>, AppError> {
        self.touch();
        let rows = self
            .tables()
            .candidates
            .iter()
            .filter(|c| c.tenant_id == ctx.tenant_id && status_matches(&c.status, params))
            .cloned()
            .collect();
        Ok(paginate(rows, params))
    }

    async fn all_candidates(&self, ctx: &RequestContext) -> Result<Vec<CandidateRow>, AppError> {
        self.touch();
        Ok(self
            .tables()
            .candidates
            .iter()
            .filter(|c| c.tenant_id == ctx.tenant_id)
            .cloned()
            .collect())
    }

    async fn get_candidate(
        &self,
        ctx: &RequestContext,
        id: Uuid,
    ) -> Result<Option<CandidateRow>, AppError> {
        self.touch();
        Ok(self
            .tables()
            .candidates
            .iter()
            .find(|c| c.id == id && c.tenant_id == ctx.tenant_id)
            .cloned())
    }

    async fn update_candidate_status(
        &self,
        ctx: &RequestContext,
        id: Uuid,
        status: CandidateStatus,
    ) -> Result<Option<CandidateRow>, AppError> {
        self.touch();
        let mut tables = self.tables();
        Ok(tables
            .candidates
            .iter_mut()
            .find(|c| c.id == id && c.tenant_id == ctx.tenant_id)
            .map(|c| {
                c.status = status.as_str().to_string();
                c.updated_at = Utc::now();
                c.clone()
            }))
    }

    async fn upsert_match(
        &self,
        ctx: &RequestContext,
        upsert: &MatchUpsert,
    ) -> Result<MatchScoreRow, AppError> {
        self.touch();
        let row = MatchScoreRow {
            tenant_id: ctx.tenant_id,
            candidate_id: upsert.candidate_id,
            requisition_id: upsert.requisition_id,
            score: i32::from(upsert.result.score),
            explain: Json(upsert.result.explain.clone()),
            computed_at: Utc::now(),
        };
        let mut tables = self.tables();
        tables.match_scores.retain(|m| {
            !(m.candidate_id == upsert.candidate_id && m.requisition_id == upsert.requisition_id)
        });
        tables.match_scores.push(row.clone());
        Ok(row)
    }
}

#[async_trait]
impl HrStore for MemoryStore {
    async fn insert_employee(
        &self,
        ctx: &RequestContext,
        employee: &EmployeeDraft,
    ) -> Result<EmployeeRow, AppError> {
        self.touch();
        let now = Utc::now();
        let row = EmployeeRow {
            id: Uuid::new_v4(),
            tenant_id: ctx.tenant_id,
            first_name: employee.first_name.clone(),
            last_name: employee.last_name.clone(),
            email: employee.email.clone(),
            department: employee.department.clone(),
            designation: employee.designation.clone(),
            employment_type: employee.employment_type.clone(),
            status: employee.status.as_str().to_string(),
            date_of_joining: employee.date_of_joining,
            manager_id: employee.manager_id,
            created_at: now,
            updated_at: now,
        };
        self.tables().employees.push(row.clone());
        Ok(row)
    }

    async fn list_employees(
        &self,
        ctx: &RequestContext,
        params: &ListParams,
    ) -> Result<Page<EmployeeRow>, AppError> {
        self.touch();
        let rows = self
            .tables()
            .employees
            .iter()
            .filter(|e| e.tenant_id == ctx.tenant_id && status_matches(&e.status, params))
            .cloned()
            .collect();
        Ok(paginate(rows, params))
    }

    async fn get_employee(
        &self,
        ctx: &RequestContext,
        id: Uuid,
    ) -> Result<Option<EmployeeRow>, AppError> {
        self.touch();
        Ok(self
            .tables()
            .employees
            .iter()
            .find(|e| e.id == id && e.tenant_id == ctx.tenant_id)
            .cloned())
    }

    async fn employee_email_taken(
        &self,
        ctx: &RequestContext,
        email: &str,
        except: Option<Uuid>,
    ) -> Result<bool, AppError> {
        self.touch();
        Ok(self.tables().employees.iter().any(|e| {
            e.tenant_id == ctx.tenant_id && e.email == email && Some(e.id) != except
        }))
    }

    async fn update_employee(
        &self,
        ctx: &RequestContext,
        id: Uuid,
        update: &EmployeeUpdate,
    ) -> Result<Option<EmployeeRow>, AppError> {
        self.touch();
        let mut tables = self.tables();
        Ok(tables
            .employees
            .iter_mut()
            .find(|e| e.id == id && e.tenant_id == ctx.tenant_id)
            .map(|e| {
                let u = update.clone();
                e.first_name = u.first_name.unwrap_or(e.first_name.clone());
                e.last_name = u.last_name.unwrap_or(e.last_name.clone());
                e.email = u.email.unwrap_or(e.email.clone());
                e.department = u.department.or(e.department.take());
                e.designation = u.designation.or(e.designation.take());
                e.employment_type = u.employment_type.or(e.employment_type.take());
                if let Some(status) = u.status {
                    e.status = status.as_str().to_string();
                }
                e.date_of_joining = u.date_of_joining.or(e.date_of_joining);
                e.manager_id = u.manager_id.or(e.manager_id);
                e.updated_at = Utc::now();
                e.clone()
            }))
    }

    async fn delete_employee(&self, ctx: &RequestContext, id: Uuid) -> Result<bool, AppError> {
        self.touch();
        let mut tables = self.tables();
        let before = tables.employees.len();
        tables
            .employees
            .retain(|e| !(e.id == id && e.tenant_id == ctx.tenant_id));
        Ok(tables.employees.len() < before)
    }

    async fn headcount_by_department(
        &self,
        ctx: &RequestContext,
    ) -> Result<Vec<HeadcountBucket>, AppError> {
        self.touch();
        let keys: Vec<String> = self
            .tables()
            .employees
            .iter()
            .filter(|e| e.tenant_id == ctx.tenant_id)
            .map(|e| {
                e.department
                    .clone()
                    .unwrap_or_else(|| UNASSIGNED_DEPARTMENT.to_string())
            })
            .collect();
        Ok(buckets(keys))
    }

    async fn headcount_by_status(
        &self,
        ctx: &RequestContext,
    ) -> Result<Vec<HeadcountBucket>, AppError> {
        self.touch();
        let keys: Vec<String> = self
            .tables()
            .employees
            .iter()
            .filter(|e| e.tenant_id == ctx.tenant_id)
            .map(|e| e.status.clone())
            .collect();
        Ok(buckets(keys))
    }
}

/// Groups keys into counts ordered like the SQL: count desc, then key asc.
fn buckets(keys: Vec<String>) -> Vec<HeadcountBucket> {
    let mut counts: HashMap<String, i64> = HashMap::new();
    for key in keys {
        *counts.entry(key).or_default() += 1;
    }
    let mut out: Vec<HeadcountBucket> = counts
        .into_iter()
        .map(|(key, count)| HeadcountBucket { key, count })
        .collect();
    out.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.key.cmp(&b.key)));
    out
}

#[async_trait]
impl BenchStore for MemoryStore {
    async fn insert_bench_resource(
        &self,
        ctx: &RequestContext,
        resource: &BenchResourceDraft,
    ) -> Result<BenchResourceRow, AppError> {
        self.touch();
        let row = BenchResourceRow {
            id: Uuid::new_v4(),
            tenant_id: ctx.tenant_id,
            employee_id: resource.employee_id,
            full_name: resource.full_name.clone(),
            skills: resource.skills.clone(),
            experience_years: resource.experience_years,
            availability: resource.availability.as_str().to_string(),
            available_from: resource.available_from,
            hourly_rate: resource.hourly_rate,
            created_at: Utc::now(),
        };
        self.tables().bench.push(row.clone());
        Ok(row)
    }

    async fn list_bench(
        &self,
        ctx: &RequestContext,
        params: &ListParams,
    ) -> Result<Page<BenchResourceRow>, AppError> {
        self.touch();
        let rows = self
            .tables()
            .bench
            .iter()
            .filter(|b| b.tenant_id == ctx.tenant_id && status_matches(&b.availability, params))
            .cloned()
            .collect();
        Ok(paginate(rows, params))
    }

    async fn all_bench(&self, ctx: &RequestContext) -> Result<Vec<BenchResourceRow>, AppError> {
        self.touch();
        Ok(self
            .tables()
            .bench
            .iter()
            .filter(|b| b.tenant_id == ctx.tenant_id)
            .cloned()
            .collect())
    }

    async fn update_availability(
        &self,
        ctx: &RequestContext,
        id: Uuid,
        availability: Availability,
        available_from: Option<NaiveDate>,
    ) -> Result<Option<BenchResourceRow>, AppError> {
        self.touch();
        let mut tables = self.tables();
        Ok(tables
            .bench
            .iter_mut()
            .find(|b| b.id == id && b.tenant_id == ctx.tenant_id)
            .map(|b| {
                b.availability = availability.as_str().to_string();
                b.available_from = available_from.or(b.available_from);
                b.clone()
            }))
    }
}

#[async_trait]
impl AdminStore for MemoryStore {
    async fn get_tenant(&self, ctx: &RequestContext) -> Result<Option<TenantRow>, AppError> {
        self.touch();
        Ok(self
            .tables()
            .tenants
            .iter()
            .find(|t| t.id == ctx.tenant_id)
            .cloned())
    }

    async fn entity_counts(&self, ctx: &RequestContext) -> Result<EntityCounts, AppError> {
        self.touch();
        let t = self.tables();
        let tenant = ctx.tenant_id;
        Ok(EntityCounts {
            users: t.profiles.values().filter(|id| **id == tenant).count() as i64,
            leads: t.leads.iter().filter(|r| r.tenant_id == tenant).count() as i64,
            opportunities: t.opportunities.iter().filter(|r| r.tenant_id == tenant).count() as i64,
            requisitions: t.requisitions.iter().filter(|r| r.tenant_id == tenant).count() as i64,
            candidates: t.candidates.iter().filter(|r| r.tenant_id == tenant).count() as i64,
            employees: t.employees.iter().filter(|r| r.tenant_id == tenant).count() as i64,
            bench_resources: t.bench.iter().filter(|r| r.tenant_id == tenant).count() as i64,
        })
    }
}

#[test]
fn test_memory_store_scopes_seeded_users_to_separate_tenants() {
    let store = MemoryStore::default();
    let a = store.seed_user();
    let b = store.seed_user();
    assert_ne!(a.tenant_id, b.tenant_id);
    assert_eq!(store.tables().tenants.len(), 2);
    assert_eq!(store.directory_calls(), 0);
}
