//! AI enrichment: prompt → completion → best-effort parse → fixed fallback.
//!
//! Enrichment never fails. A transport error or an unparseable completion
//! yields the fallback value tagged with `used_fallback = true`, so callers and
//! tests can tell the two paths apart without scraping logs.

pub mod insights;
pub mod prompts;
pub mod queue;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use crate::crm::models::{LeadRow, OpportunityRow};
use crate::llm_client::prompts::{JSON_ONLY_SYSTEM, NUMBERED_LIST_SYSTEM};
use crate::llm_client::{strip_json_fences, CompletionClient, DEFAULT_MAX_TOKENS};
use crate::talent::models::{CandidateRow, RequisitionRow};

use self::insights::{
    fallback_interview_questions, CandidateSummary, LeadScore, OpportunityInsights,
    ParsedResume,
};

pub use self::queue::{EnrichmentHandle, EnrichmentJob, EnrichmentOutcome, EnrichmentQueue};

const RESUME_MAX_TOKENS: u32 = 2048;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Enriched<T> {
    pub value: T,
    pub used_fallback: bool,
}

impl<T> Enriched<T> {
    pub fn parsed(value: T) -> Self {
        Self {
            value,
            used_fallback: false,
        }
    }

    pub fn fallback(value: T) -> Self {
        Self {
            value,
            used_fallback: true,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Enriched<U> {
        Enriched {
            value: f(self.value),
            used_fallback: self.used_fallback,
        }
    }
}

/// Parses a JSON completion. Code fences are stripped first; if the text
/// still does not parse, the outermost `{ ... }` span is tried.
pub fn parse_json_or_fallback<T, F>(raw: &str, fallback: F) -> Enriched<T>
where
    T: DeserializeOwned,
    F: FnOnce() -> T,
{
    let text = strip_json_fences(raw);
    if let Ok(value) = serde_json::from_str::<T>(text) {
        return Enriched::parsed(value);
    }

    let embedded = match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if start < end => serde_json::from_str::<T>(&text[start..=end]).ok(),
        _ => None,
    };

    match embedded {
        Some(value) => Enriched::parsed(value),
        None => {
            warn!("Completion was not valid JSON; using fallback");
            Enriched::fallback(fallback())
        }
    }
}

/// Parses a numbered (`1. item`, `2) item`) or bulleted (`- item`, `* item`)
/// list, one item per line. Lines without a marker are ignored.
pub fn parse_lines_or_fallback<F>(raw: &str, fallback: F) -> Enriched<Vec<String>>
where
    F: FnOnce() -> Vec<String>,
{
    let items: Vec<String> = raw.lines().filter_map(parse_list_item).collect();

    if items.is_empty() {
        warn!("Completion contained no list items; using fallback");
        Enriched::fallback(fallback())
    } else {
        Enriched::parsed(items)
    }
}

fn parse_list_item(line: &str) -> Option<String> {
    let line = line.trim();

    let rest = if let Some(rest) = line
        .strip_prefix("- ")
        .or_else(|| line.strip_prefix("* "))
        .or_else(|| line.strip_prefix("• "))
    {
        rest
    } else {
        let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
        if digits == 0 {
            return None;
        }
        line[digits..]
            .strip_prefix('.')
            .or_else(|| line[digits..].strip_prefix(')'))?
    };

    let item = rest.trim();
    (!item.is_empty()).then(|| item.to_string())
}

async fn complete_json<T, F>(
    llm: &dyn CompletionClient,
    prompt: &str,
    max_tokens: u32,
    fallback: F,
) -> Enriched<T>
where
    T: DeserializeOwned,
    F: FnOnce() -> T,
{
    match llm.complete(prompt, JSON_ONLY_SYSTEM, max_tokens).await {
        Ok(raw) => parse_json_or_fallback(&raw, fallback),
        Err(e) => {
            warn!("Completion call failed: {e}; using fallback");
            Enriched::fallback(fallback())
        }
    }
}

pub async fn opportunity_insights(
    llm: &dyn CompletionClient,
    opp: &OpportunityRow,
) -> Enriched<OpportunityInsights> {
    let prompt = prompts::opportunity_insights_prompt(opp);
    complete_json(llm, &prompt, DEFAULT_MAX_TOKENS, OpportunityInsights::fallback)
        .await
        .map(OpportunityInsights::clamped)
}

pub async fn lead_score(llm: &dyn CompletionClient, lead: &LeadRow) -> Enriched<LeadScore> {
    let prompt = prompts::lead_score_prompt(lead);
    complete_json(llm, &prompt, DEFAULT_MAX_TOKENS, LeadScore::fallback)
        .await
        .map(LeadScore::clamped)
}

pub async fn candidate_summary(
    llm: &dyn CompletionClient,
    candidate: &CandidateRow,
) -> Enriched<CandidateSummary> {
    let prompt = prompts::candidate_summary_prompt(candidate);
    complete_json(llm, &prompt, DEFAULT_MAX_TOKENS, CandidateSummary::fallback).await
}

pub async fn parse_resume(llm: &dyn CompletionClient, resume_text: &str) -> Enriched<ParsedResume> {
    let prompt = prompts::resume_parse_prompt(resume_text);
    complete_json(llm, &prompt, RESUME_MAX_TOKENS, ParsedResume::default).await
}

pub async fn interview_questions(
    llm: &dyn CompletionClient,
    req: &RequisitionRow,
    candidate: &CandidateRow,
) -> Enriched<Vec<String>> {
    let prompt = prompts::interview_questions_prompt(req, candidate);
    let fallback = || fallback_interview_questions(&req.title);
    match llm
        .complete(&prompt, NUMBERED_LIST_SYSTEM, DEFAULT_MAX_TOKENS)
        .await
    {
        Ok(raw) => parse_lines_or_fallback(&raw, fallback),
        Err(e) => {
            warn!("Completion call failed: {e}; using fallback questions");
            Enriched::fallback(fallback())
        }
    }
}
