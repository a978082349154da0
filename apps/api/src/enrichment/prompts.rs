// Prompt builders for every enrichment kind.
// Prompts are plain interpolation of entity fields; nothing is escaped.

use crate::crm::models::{LeadRow, OpportunityRow};
use crate::talent::models::{CandidateRow, RequisitionRow};

fn or_unknown(value: Option<&str>) -> &str {
    value.filter(|v| !v.trim().is_empty()).unwrap_or("Unknown")
}

pub fn opportunity_insights_prompt(opp: &OpportunityRow) -> String {
    let close_date = opp
        .expected_close_date
        .map(|d| d.to_string())
        .unwrap_or_else(|| "Not set".to_string());
    format!(
        r#"Analyze this sales opportunity and predict its outcome.

Opportunity: {name}
Company: {company}
Amount: {amount:.2}
Stage: {stage}
Current probability: {probability}%
Expected close date: {close_date}

Return a JSON object with this EXACT schema:
{{
  "win_probability": <integer 0-100>,
  "risk_score": <integer 0-100, higher means riskier>,
  "insights": "<two or three sentences of actionable advice>"
}}"#,
        name = opp.name,
        company = or_unknown(opp.company.as_deref()),
        amount = opp.amount,
        stage = opp.stage,
        probability = opp.probability,
    )
}

pub fn lead_score_prompt(lead: &LeadRow) -> String {
    format!(
        r#"Score this sales lead from 0 to 100 based on how likely it is to convert.

Name: {first} {last}
Email: {email}
Company: {company}
Job title: {title}
Source: {source}
Status: {status}

Return a JSON object with this EXACT schema:
{{
  "score": <integer 0-100>,
  "insights": "<one or two sentences explaining the score>"
}}"#,
        first = lead.first_name,
        last = lead.last_name.as_deref().unwrap_or_default(),
        email = lead.email,
        company = or_unknown(lead.company.as_deref()),
        title = or_unknown(lead.job_title.as_deref()),
        source = or_unknown(lead.source.as_deref()),
        status = lead.status,
    )
}

pub fn candidate_summary_prompt(candidate: &CandidateRow) -> String {
    let experience = candidate
        .experience_years
        .map(|y| format!("{y} years"))
        .unwrap_or_else(|| "Unknown".to_string());
    format!(
        r#"Summarize this job candidate for a hiring manager.

Name: {name}
Current title: {title}
Experience: {experience}
Skills: {skills}

Return a JSON object with this EXACT schema:
{{
  "summary": "<two sentence summary>",
  "strengths": ["<strength>", "..."],
  "concerns": ["<concern>", "..."]
}}"#,
        name = candidate.full_name,
        title = or_unknown(candidate.current_title.as_deref()),
        skills = candidate.skills.join(", "),
    )
}

pub fn resume_parse_prompt(resume_text: &str) -> String {
    format!(
        r#"Extract structured candidate information from the resume below.

Return a JSON object with this EXACT schema (use null when a field is absent):
{{
  "full_name": "<string or null>",
  "email": "<string or null>",
  "phone": "<string or null>",
  "skills": ["<skill>", "..."],
  "experience_years": <number or null>,
  "current_title": "<string or null>"
}}

Resume:
{resume_text}"#
    )
}

pub fn interview_questions_prompt(req: &RequisitionRow, candidate: &CandidateRow) -> String {
    format!(
        r#"Write 5 interview questions for {name}, who is applying for the {title} position.

Required skills: {required}
Candidate skills: {skills}
Candidate current title: {current}

Focus on gaps between the required skills and the candidate's skills."#,
        name = candidate.full_name,
        title = req.title,
        required = req.required_skills.join(", "),
        skills = candidate.skills.join(", "),
        current = or_unknown(candidate.current_title.as_deref()),
    )
}
