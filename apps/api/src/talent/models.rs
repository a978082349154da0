use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::errors::AppError;
use crate::scoring::{Explanation, MatchResult};
use crate::validation::{clean_list, non_blank, null_as_empty, require_non_blank, validate_input};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequisitionStatus {
    #[default]
    Open,
    OnHold,
    Closed,
    Filled,
}

impl RequisitionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequisitionStatus::Open => "open",
            RequisitionStatus::OnHold => "on_hold",
            RequisitionStatus::Closed => "closed",
            RequisitionStatus::Filled => "filled",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RequisitionRow {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub title: String,
    pub department: Option<String>,
    pub location: Option<String>,
    pub employment_type: Option<String>,
    pub required_skills: Vec<String>,
    pub min_experience_years: Option<f64>,
    pub status: String,
    pub description: Option<String>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct NewRequisition {
    #[validate(
        required(message = "title is required"),
        length(min = 1, max = 200, message = "title must be 1-200 characters")
    )]
    pub title: Option<String>,
    pub department: Option<String>,
    pub location: Option<String>,
    pub employment_type: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub required_skills: Vec<String>,
    #[validate(range(min = 0.0, message = "min_experience_years must not be negative"))]
    pub min_experience_years: Option<f64>,
    pub status: Option<RequisitionStatus>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RequisitionDraft {
    pub title: String,
    pub department: Option<String>,
    pub location: Option<String>,
    pub employment_type: Option<String>,
    pub required_skills: Vec<String>,
    pub min_experience_years: Option<f64>,
    pub status: RequisitionStatus,
    pub description: Option<String>,
}

impl NewRequisition {
    pub fn validated(self) -> Result<RequisitionDraft, AppError> {
        validate_input(&self)?;
        let title = self.title.unwrap_or_default();
        require_non_blank(&title, "title")?;

        Ok(RequisitionDraft {
            title: title.trim().to_string(),
            department: non_blank(self.department),
            location: non_blank(self.location),
            employment_type: non_blank(self.employment_type),
            required_skills: clean_list(self.required_skills),
            min_experience_years: self.min_experience_years,
            status: self.status.unwrap_or_default(),
            description: non_blank(self.description),
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateStatus {
    #[default]
    Applied,
    Screening,
    Interviewing,
    Offered,
    Hired,
    Rejected,
}

impl CandidateStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CandidateStatus::Applied => "applied",
            CandidateStatus::Screening => "screening",
            CandidateStatus::Interviewing => "interviewing",
            CandidateStatus::Offered => "offered",
            CandidateStatus::Hired => "hired",
            CandidateStatus::Rejected => "rejected",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CandidateRow {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub skills: Vec<String>,
    pub experience_years: Option<f64>,
    pub current_title: Option<String>,
    pub status: String,
    pub ai_summary: Option<String>,
    pub ai_strengths: Vec<String>,
    pub ai_concerns: Vec<String>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct NewCandidate {
    #[validate(
        required(message = "full_name is required"),
        length(min = 1, max = 200, message = "full_name must be 1-200 characters")
    )]
    pub full_name: Option<String>,
    #[validate(
        required(message = "email is required"),
        email(message = "email must be a valid email address")
    )]
    pub email: Option<String>,
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub skills: Vec<String>,
    #[validate(range(min = 0.0, message = "experience_years must not be negative"))]
    pub experience_years: Option<f64>,
    pub current_title: Option<String>,
    pub status: Option<CandidateStatus>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CandidateDraft {
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub skills: Vec<String>,
    pub experience_years: Option<f64>,
    pub current_title: Option<String>,
    pub status: CandidateStatus,
}

impl NewCandidate {
    pub fn validated(self) -> Result<CandidateDraft, AppError> {
        validate_input(&self)?;
        let full_name = self.full_name.unwrap_or_default();
        require_non_blank(&full_name, "full_name")?;

        Ok(CandidateDraft {
            full_name: full_name.trim().to_string(),
            email: self.email.unwrap_or_default().trim().to_string(),
            phone: non_blank(self.phone),
            skills: clean_list(self.skills),
            experience_years: self.experience_years,
            current_title: non_blank(self.current_title),
            status: self.status.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CandidateStatusUpdate {
    #[validate(required(message = "status is required"))]
    pub status: Option<CandidateStatus>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ResumeText {
    #[validate(
        required(message = "resume_text is required"),
        length(min = 1, max = 50000, message = "resume_text must be 1-50000 characters")
    )]
    pub resume_text: Option<String>,
}

/// Persisted result of scoring one candidate against one requisition.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct MatchScoreRow {
    pub tenant_id: Uuid,
    pub candidate_id: Uuid,
    pub requisition_id: Uuid,
    pub score: i32,
    pub explain: Json<Vec<Explanation>>,
    pub computed_at: DateTime<Utc>,
}

/// The write side of `MatchScoreRow`; the store stamps `computed_at`.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchUpsert {
    pub candidate_id: Uuid,
    pub requisition_id: Uuid,
    pub result: MatchResult,
}

/// One entry of a requisition ranking.
#[derive(Debug, Clone, Serialize)]
pub struct RankedCandidate {
    pub candidate_id: Uuid,
    pub full_name: String,
    pub score: u8,
    pub explain: Vec<Explanation>,
}
