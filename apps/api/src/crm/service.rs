//! CRM actions. Each function assumes the caller already resolved a
//! `RequestContext`; validation happens here, before any store call.

use std::collections::HashSet;

use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use crate::audit::{AuditAction, AuditSink, NewAuditEntry};
use crate::crm::csv::{export_leads_csv, parse_lead_csv, ImportFailure, ImportSummary};
use crate::crm::models::{
    LeadRow, LeadStatusUpdate, NewLead, NewOpportunity, OpportunityRow, OpportunityStage,
    StageChange, StageSummary, StageUpdate,
};
use crate::crm::repo::CrmStore;
use crate::enrichment::{EnrichmentHandle, EnrichmentJob, EnrichmentOutcome, EnrichmentQueue};
use crate::errors::AppError;
use crate::listing::{ListParams, Page};
use crate::tenancy::RequestContext;
use crate::validation::validate_input;

pub trait CrmBackend: CrmStore + AuditSink {}
impl<T: CrmStore + AuditSink + ?Sized> CrmBackend for T {}

fn lead_not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Lead {id} not found"))
}

fn opportunity_not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Opportunity {id} not found"))
}

// ────────────────────────────────────────────────────────────────────────────
// Leads
// ────────────────────────────────────────────────────────────────────────────

pub async fn create_lead<S: CrmBackend + ?Sized>(
    store: &S,
    ctx: &RequestContext,
    input: NewLead,
) -> Result<LeadRow, AppError> {
    let draft = input.validated()?;

    if store.lead_email_exists(ctx, &draft.email).await? {
        return Err(AppError::Conflict(format!(
            "A lead with email {} already exists",
            draft.email
        )));
    }

    let lead = store.insert_lead(ctx, &draft).await?;
    store
        .record(ctx, NewAuditEntry::new(AuditAction::Create, "lead", lead.id))
        .await?;
    info!("Created lead {} for tenant {}", lead.id, ctx.tenant_id);
    Ok(lead)
}

pub async fn list_leads<S: CrmBackend + ?Sized>(
    store: &S,
    ctx: &RequestContext,
    params: &ListParams,
) -> Result<Page<LeadRow>, AppError> {
    store.list_leads(ctx, params).await
}

pub async fn get_lead<S: CrmBackend + ?Sized>(
    store: &S,
    ctx: &RequestContext,
    id: Uuid,
) -> Result<LeadRow, AppError> {
    store
        .get_lead(ctx, id)
        .await?
        .ok_or_else(|| lead_not_found(id))
}

pub async fn update_lead_status<S: CrmBackend + ?Sized>(
    store: &S,
    ctx: &RequestContext,
    id: Uuid,
    input: LeadStatusUpdate,
) -> Result<LeadRow, AppError> {
    validate_input(&input)?;
    let status = input.status.unwrap_or_default();

    let lead = store
        .update_lead_status(ctx, id, status)
        .await?
        .ok_or_else(|| lead_not_found(id))?;
    store
        .record(
            ctx,
            NewAuditEntry::new(AuditAction::Update, "lead", id)
                .with_metadata(json!({ "status": status.as_str() })),
        )
        .await?;
    Ok(lead)
}

pub async fn delete_lead<S: CrmBackend + ?Sized>(
    store: &S,
    ctx: &RequestContext,
    id: Uuid,
) -> Result<(), AppError> {
    if !store.delete_lead(ctx, id).await? {
        return Err(lead_not_found(id));
    }
    store
        .record(ctx, NewAuditEntry::new(AuditAction::Delete, "lead", id))
        .await?;
    Ok(())
}

/// Scores a lead synchronously and persists the result. A failed or
/// unparseable completion still succeeds, with the fallback score.
pub async fn score_lead<S: CrmBackend + ?Sized>(
    store: &S,
    queue: &EnrichmentQueue,
    ctx: &RequestContext,
    id: Uuid,
) -> Result<EnrichmentOutcome, AppError> {
    let lead = get_lead(store, ctx, id).await?;
    let outcome = queue
        .run_now(EnrichmentJob::Lead { ctx: *ctx, lead })
        .await?;
    store
        .record(
            ctx,
            NewAuditEntry::new(AuditAction::Score, "lead", id)
                .with_metadata(json!({ "used_fallback": outcome.used_fallback() })),
        )
        .await?;
    Ok(outcome)
}

/// Imports leads row by row. Invalid rows are reported and skipped; rows whose
/// email already exists in the tenant, or earlier in the same file, count as
/// duplicates. Each insert commits on its own, so a row the store rejects is
/// reported as failed and the import carries on.
pub async fn import_leads<S: CrmBackend + ?Sized>(
    store: &S,
    ctx: &RequestContext,
    csv_text: &str,
) -> Result<ImportSummary, AppError> {
    let rows = parse_lead_csv(csv_text)?;
    let mut summary = ImportSummary::default();
    let mut seen: HashSet<String> = HashSet::new();

    for row in rows {
        let line = row.line;
        let draft = match row.into_new_lead().and_then(NewLead::validated) {
            Ok(draft) => draft,
            Err(e) => {
                summary.failed.push(ImportFailure {
                    line,
                    error: e.to_string(),
                });
                continue;
            }
        };

        if !seen.insert(draft.email.clone()) {
            summary.duplicates += 1;
            continue;
        }

        // A store error only fails its own row; earlier rows are already committed.
        let inserted = match store.lead_email_exists(ctx, &draft.email).await {
            Ok(true) => {
                summary.duplicates += 1;
                continue;
            }
            Ok(false) => store.insert_lead(ctx, &draft).await,
            Err(e) => Err(e),
        };
        match inserted {
            Ok(_) => summary.imported += 1,
            Err(e) => {
                warn!("Lead import line {line} failed for tenant {}: {e}", ctx.tenant_id);
                summary.failed.push(ImportFailure {
                    line,
                    error: e.public_message(),
                });
            }
        }
    }

    store
        .record(
            ctx,
            NewAuditEntry {
                action: AuditAction::Import,
                entity: "lead",
                entity_id: None,
                metadata: json!({
                    "imported": summary.imported,
                    "duplicates": summary.duplicates,
                    "failed": summary.failed.len(),
                }),
            },
        )
        .await?;
    info!(
        "Imported {} leads for tenant {} ({} duplicates, {} failed)",
        summary.imported,
        ctx.tenant_id,
        summary.duplicates,
        summary.failed.len()
    );
    Ok(summary)
}

pub async fn export_leads<S: CrmBackend + ?Sized>(
    store: &S,
    ctx: &RequestContext,
) -> Result<String, AppError> {
    let leads = store.all_leads(ctx).await?;
    Ok(export_leads_csv(&leads))
}

// ────────────────────────────────────────────────────────────────────────────
// Opportunities
// ────────────────────────────────────────────────────────────────────────────

/// Creates the opportunity and hands win-probability enrichment to the
/// background queue. The handle may be dropped; the row is already committed.
pub async fn create_opportunity<S: CrmBackend + ?Sized>(
    store: &S,
    queue: &EnrichmentQueue,
    ctx: &RequestContext,
    input: NewOpportunity,
) -> Result<(OpportunityRow, EnrichmentHandle), AppError> {
    let draft = input.validated()?;

    if let Some(lead_id) = draft.lead_id {
        get_lead(store, ctx, lead_id).await?;
    }

    let opportunity = store.insert_opportunity(ctx, &draft).await?;
    store
        .record(
            ctx,
            NewAuditEntry::new(AuditAction::Create, "opportunity", opportunity.id),
        )
        .await?;
    info!(
        "Created opportunity {} for tenant {}",
        opportunity.id, ctx.tenant_id
    );

    let handle = queue.submit(EnrichmentJob::Opportunity {
        ctx: *ctx,
        opportunity: opportunity.clone(),
    });
    Ok((opportunity, handle))
}

pub async fn list_opportunities<S: CrmBackend + ?Sized>(
    store: &S,
    ctx: &RequestContext,
    params: &ListParams,
) -> Result<Page<OpportunityRow>, AppError> {
    store.list_opportunities(ctx, params).await
}

pub async fn update_opportunity_stage<S: CrmBackend + ?Sized>(
    store: &S,
    ctx: &RequestContext,
    id: Uuid,
    input: StageUpdate,
) -> Result<OpportunityRow, AppError> {
    validate_input(&input)?;
    let change = StageChange::for_stage(input.stage.unwrap_or_default(), input.probability);

    let opportunity = store
        .update_opportunity_stage(ctx, id, &change)
        .await?
        .ok_or_else(|| opportunity_not_found(id))?;
    store
        .record(
            ctx,
            NewAuditEntry::new(AuditAction::Update, "opportunity", id).with_metadata(json!({
                "stage": change.stage.as_str(),
                "status": change.status.as_str(),
            })),
        )
        .await?;
    Ok(opportunity)
}

/// Re-runs opportunity enrichment on the request task and returns the result.
pub async fn refresh_opportunity_insights<S: CrmBackend + ?Sized>(
    store: &S,
    queue: &EnrichmentQueue,
    ctx: &RequestContext,
    id: Uuid,
) -> Result<EnrichmentOutcome, AppError> {
    let opportunity = store
        .get_opportunity(ctx, id)
        .await?
        .ok_or_else(|| opportunity_not_found(id))?;
    let outcome = queue
        .run_now(EnrichmentJob::Opportunity {
            ctx: *ctx,
            opportunity,
        })
        .await?;
    store
        .record(
            ctx,
            NewAuditEntry::new(AuditAction::Score, "opportunity", id)
                .with_metadata(json!({ "used_fallback": outcome.used_fallback() })),
        )
        .await?;
    Ok(outcome)
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PipelineSummary {
    pub stages: Vec<StageSummary>,
    pub open_amount: f64,
    pub won_amount: f64,
}

/// Per-stage counts and totals, with every stage present (zero-filled) in
/// pipeline order.
pub async fn pipeline_summary<S: CrmBackend + ?Sized>(
    store: &S,
    ctx: &RequestContext,
) -> Result<PipelineSummary, AppError> {
    let rows = store.pipeline_summary(ctx).await?;

    let stages: Vec<StageSummary> = OpportunityStage::ALL
        .iter()
        .map(|stage| {
            rows.iter()
                .find(|r| r.stage == stage.as_str())
                .cloned()
                .unwrap_or_else(|| StageSummary {
                    stage: stage.as_str().to_string(),
                    count: 0,
                    total_amount: 0.0,
                })
        })
        .collect();

    let amount_for = |stage: OpportunityStage| {
        stages
            .iter()
            .filter(|s| s.stage == stage.as_str())
            .map(|s| s.total_amount)
            .sum::<f64>()
    };
    let open_amount = [
        OpportunityStage::Prospecting,
        OpportunityStage::Qualification,
        OpportunityStage::Proposal,
        OpportunityStage::Negotiation,
    ]
    .into_iter()
    .map(amount_for)
    .sum();
    let won_amount = amount_for(OpportunityStage::ClosedWon);

    Ok(PipelineSummary {
        stages,
        open_amount,
        won_amount,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrichment::insights::OpportunityInsights;
    use crate::testing::{MemoryStore, ScriptedLlm};
    use crate::tenancy::{tenant_action, Caller};
    use std::sync::Arc;

    fn queue_for(store: &Arc<MemoryStore>, llm: ScriptedLlm) -> EnrichmentQueue {
        EnrichmentQueue::new(Arc::new(llm), store.clone())
    }

    fn opportunity_input(name: &str) -> NewOpportunity {
        NewOpportunity {
            name: Some(name.to_string()),
            amount: Some(25_000.0),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_opportunity_with_garbage_completion_persists_fallback() {
        let store = Arc::new(MemoryStore::default());
        let ctx = store.seed_user();
        let queue = queue_for(&store, ScriptedLlm::replying("Sure! The deal looks great."));

        let mut handle = None;
        let slot = &mut handle;
        let (s, q) = (store.as_ref(), &queue);
        let resp = tenant_action(s, Caller(Some(ctx.user_id)), |ctx| async move {
            let (opp, h) = create_opportunity(s, q, &ctx, opportunity_input("Renewal")).await?;
            *slot = Some(h);
            Ok(opp)
        })
        .await;

        assert!(resp.success);
        let opp = resp.data.unwrap();
        assert_eq!(opp.status, "open");
        assert_eq!(opp.probability, 0);

        let outcome = handle.unwrap().join().await.unwrap();
        assert!(outcome.used_fallback());
        assert_eq!(
            store.saved_opportunity_insights(opp.id),
            Some(OpportunityInsights::fallback())
        );
    }

    #[tokio::test]
    async fn test_missing_required_field_never_reaches_data_layer() {
        let store = Arc::new(MemoryStore::default());
        let ctx = store.seed_user();
        let queue = queue_for(&store, ScriptedLlm::replying("{}"));

        let (s, q) = (store.as_ref(), &queue);
        let resp = tenant_action(s, Caller(Some(ctx.user_id)), |ctx| async move {
            create_opportunity(s, q, &ctx, NewOpportunity::default())
                .await
                .map(|(opp, _)| opp)
        })
        .await;

        assert!(!resp.success);
        assert_eq!(resp.error.as_deref(), Some("name is required"));
        assert_eq!(store.data_calls(), 0);
    }

    #[tokio::test]
    async fn test_create_opportunity_rejects_foreign_lead() {
        let store = Arc::new(MemoryStore::default());
        let ctx = store.seed_user();
        let queue = queue_for(&store, ScriptedLlm::replying("{}"));

        let mut input = opportunity_input("Upsell");
        input.lead_id = Some(Uuid::new_v4());
        let err = create_opportunity(store.as_ref(), &queue, &ctx, input)
            .await
            .err()
            .unwrap();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_duplicate_lead_email_conflicts() {
        let store = MemoryStore::default();
        let ctx = store.seed_user();
        let input = NewLead {
            first_name: Some("Ada".to_string()),
            email: Some("ada@example.com".to_string()),
            ..Default::default()
        };

        create_lead(&store, &ctx, input.clone()).await.unwrap();
        let err = create_lead(&store, &ctx, input).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(store.audit_entries().len(), 1);
    }

    #[tokio::test]
    async fn test_lead_lookup_is_tenant_scoped() {
        let store = MemoryStore::default();
        let owner = store.seed_user();
        let other = store.seed_user();

        let lead = create_lead(
            &store,
            &owner,
            NewLead {
                first_name: Some("Ada".to_string()),
                email: Some("ada@example.com".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert!(get_lead(&store, &owner, lead.id).await.is_ok());
        let err = get_lead(&store, &other, lead.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert!(delete_lead(&store, &other, lead.id).await.is_err());
    }

    #[tokio::test]
    async fn test_import_applies_recognised_columns_and_skips_duplicates() {
        let store = MemoryStore::default();
        let ctx = store.seed_user();
        let csv = "First Name,Shoe Size,Email,Company\n\
                   Ada,38,ada@example.com,Analytical\n\
                   Ada,38,ada@example.com,Analytical\n\
                   ,40,nobody@example.com,Nowhere\n\
                   Grace,39,grace@example.com,Navy\n";

        let summary = import_leads(&store, &ctx, csv).await.unwrap();

        assert_eq!(summary.imported, 2);
        assert_eq!(summary.duplicates, 1);
        assert_eq!(summary.failed.len(), 1);
        assert_eq!(summary.failed[0].line, 4);
        assert_eq!(summary.failed[0].error, "first_name is required");

        let leads = store.leads_for(&ctx);
        let ada = leads.iter().find(|l| l.email == "ada@example.com").unwrap();
        assert_eq!(ada.first_name, "Ada");
        assert_eq!(ada.company.as_deref(), Some("Analytical"));
    }

    #[tokio::test]
    async fn test_import_skips_emails_already_in_tenant() {
        let store = MemoryStore::default();
        let ctx = store.seed_user();
        create_lead(
            &store,
            &ctx,
            NewLead {
                first_name: Some("Ada".to_string()),
                email: Some("ada@example.com".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let summary = import_leads(&store, &ctx, "email,first_name\nada@example.com,Ada\n")
            .await
            .unwrap();
        assert_eq!(summary.imported, 0);
        assert_eq!(summary.duplicates, 1);
    }

    #[tokio::test]
    async fn test_import_reports_store_failures_and_keeps_going() {
        let store = MemoryStore::default();
        let ctx = store.seed_user();
        store.reject_lead_inserts_for("grace@example.com");
        let csv = "first_name,email\n\
                   Ada,ada@example.com\n\
                   Grace,grace@example.com\n\
                   Linus,linus@example.com\n";

        let summary = import_leads(&store, &ctx, csv).await.unwrap();

        assert_eq!(summary.imported, 2);
        assert_eq!(summary.failed.len(), 1);
        assert_eq!(summary.failed[0].line, 3);
        assert_eq!(summary.failed[0].error, "A database error occurred");
        assert_eq!(store.leads_for(&ctx).len(), 2);

        let audit = store.audit_entries();
        let import = audit
            .iter()
            .find(|e| e.action == "import")
            .expect("import audit row");
        assert_eq!(import.metadata["imported"], 2);
        assert_eq!(import.metadata["failed"], 1);
    }

    #[tokio::test]
    async fn test_export_lists_tenant_leads() {
        let store = MemoryStore::default();
        let ctx = store.seed_user();
        import_leads(
            &store,
            &ctx,
            "first_name,email\nAda,ada@example.com\nGrace,grace@example.com\n",
        )
        .await
        .unwrap();

        let csv = export_leads(&store, &ctx).await.unwrap();
        assert_eq!(csv.lines().count(), 3);
        assert!(csv.contains(",Ada,"));
    }

    #[tokio::test]
    async fn test_score_lead_with_failed_completion_uses_fallback() {
        let store = Arc::new(MemoryStore::default());
        let ctx = store.seed_user();
        let queue = queue_for(&store, ScriptedLlm::failing());
        let lead = create_lead(
            store.as_ref(),
            &ctx,
            NewLead {
                first_name: Some("Ada".to_string()),
                email: Some("ada@example.com".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let outcome = score_lead(store.as_ref(), &queue, &ctx, lead.id)
            .await
            .unwrap();
        assert!(outcome.used_fallback());
        assert_eq!(store.leads_for(&ctx)[0].score, Some(50));
    }

    #[tokio::test]
    async fn test_closing_stage_updates_status() {
        let store = Arc::new(MemoryStore::default());
        let ctx = store.seed_user();
        let queue = queue_for(&store, ScriptedLlm::replying("{}"));
        let (opp, _) = create_opportunity(store.as_ref(), &queue, &ctx, opportunity_input("Deal"))
            .await
            .unwrap();

        let updated = update_opportunity_stage(
            store.as_ref(),
            &ctx,
            opp.id,
            StageUpdate {
                stage: Some(OpportunityStage::ClosedWon),
                probability: None,
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.status, "won");
        assert_eq!(updated.probability, 100);
    }

    #[tokio::test]
    async fn test_pipeline_summary_zero_fills_stages() {
        let store = Arc::new(MemoryStore::default());
        let ctx = store.seed_user();
        let queue = queue_for(&store, ScriptedLlm::replying("{}"));
        create_opportunity(store.as_ref(), &queue, &ctx, opportunity_input("A"))
            .await
            .unwrap();
        create_opportunity(store.as_ref(), &queue, &ctx, opportunity_input("B"))
            .await
            .unwrap();

        let summary = pipeline_summary(store.as_ref(), &ctx).await.unwrap();
        assert_eq!(summary.stages.len(), OpportunityStage::ALL.len());
        assert_eq!(summary.stages[0].stage, "prospecting");
        assert_eq!(summary.stages[0].count, 2);
        assert_eq!(summary.open_amount, 50_000.0);
        assert_eq!(summary.won_amount, 0.0);
    }
}
