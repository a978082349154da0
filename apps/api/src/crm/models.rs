use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::errors::AppError;
use crate::validation::{non_blank, require_non_blank, validate_input};

// ────────────────────────────────────────────────────────────────────────────
// Leads
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadStatus {
    #[default]
    New,
    Contacted,
    Qualified,
    Unqualified,
    Converted,
}

impl LeadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeadStatus::New => "new",
            LeadStatus::Contacted => "contacted",
            LeadStatus::Qualified => "qualified",
            LeadStatus::Unqualified => "unqualified",
            LeadStatus::Converted => "converted",
        }
    }
}

impl FromStr for LeadStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "new" => Ok(LeadStatus::New),
            "contacted" => Ok(LeadStatus::Contacted),
            "qualified" => Ok(LeadStatus::Qualified),
            "unqualified" => Ok(LeadStatus::Unqualified),
            "converted" => Ok(LeadStatus::Converted),
            other => Err(AppError::Validation(format!(
                "status must be one of new, contacted, qualified, unqualified, converted (got '{other}')"
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LeadRow {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub first_name: String,
    pub last_name: Option<String>,
    pub email: String,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub job_title: Option<String>,
    pub source: Option<String>,
    pub status: String,
    pub score: Option<i32>,
    pub ai_insights: Option<String>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Lead payload as received from a client or a CSV row.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct NewLead {
    #[validate(
        required(message = "first_name is required"),
        length(min = 1, max = 100, message = "first_name must be 1-100 characters")
    )]
    pub first_name: Option<String>,
    #[validate(length(max = 100, message = "last_name must be at most 100 characters"))]
    pub last_name: Option<String>,
    #[validate(
        required(message = "email is required"),
        email(message = "email must be a valid email address")
    )]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub job_title: Option<String>,
    pub source: Option<String>,
    pub status: Option<LeadStatus>,
}

/// A lead that passed validation, with defaults applied.
#[derive(Debug, Clone, PartialEq)]
pub struct LeadDraft {
    pub first_name: String,
    pub last_name: Option<String>,
    pub email: String,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub job_title: Option<String>,
    pub source: Option<String>,
    pub status: LeadStatus,
}

impl NewLead {
    pub fn validated(self) -> Result<LeadDraft, AppError> {
        validate_input(&self)?;
        let first_name = self.first_name.unwrap_or_default();
        require_non_blank(&first_name, "first_name")?;

        Ok(LeadDraft {
            first_name: first_name.trim().to_string(),
            last_name: non_blank(self.last_name),
            email: self.email.unwrap_or_default().trim().to_string(),
            phone: non_blank(self.phone),
            company: non_blank(self.company),
            job_title: non_blank(self.job_title),
            source: non_blank(self.source),
            status: self.status.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LeadStatusUpdate {
    #[validate(required(message = "status is required"))]
    pub status: Option<LeadStatus>,
}

// ────────────────────────────────────────────────────────────────────────────
// Opportunities
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpportunityStage {
    #[default]
    Prospecting,
    Qualification,
    Proposal,
    Negotiation,
    ClosedWon,
    ClosedLost,
}

impl OpportunityStage {
    pub const ALL: [OpportunityStage; 6] = [
        OpportunityStage::Prospecting,
        OpportunityStage::Qualification,
        OpportunityStage::Proposal,
        OpportunityStage::Negotiation,
        OpportunityStage::ClosedWon,
        OpportunityStage::ClosedLost,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OpportunityStage::Prospecting => "prospecting",
            OpportunityStage::Qualification => "qualification",
            OpportunityStage::Proposal => "proposal",
            OpportunityStage::Negotiation => "negotiation",
            OpportunityStage::ClosedWon => "closed_won",
            OpportunityStage::ClosedLost => "closed_lost",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpportunityStatus {
    #[default]
    Open,
    Won,
    Lost,
}

impl OpportunityStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OpportunityStatus::Open => "open",
            OpportunityStatus::Won => "won",
            OpportunityStatus::Lost => "lost",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct OpportunityRow {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub lead_id: Option<Uuid>,
    pub name: String,
    pub company: Option<String>,
    pub amount: f64,
    pub stage: String,
    pub probability: i32,
    pub status: String,
    pub expected_close_date: Option<NaiveDate>,
    pub win_probability: Option<i32>,
    pub risk_score: Option<i32>,
    pub ai_insights: Option<String>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct NewOpportunity {
    #[validate(
        required(message = "name is required"),
        length(min = 1, max = 200, message = "name must be 1-200 characters")
    )]
    pub name: Option<String>,
    pub company: Option<String>,
    pub lead_id: Option<Uuid>,
    #[validate(range(min = 0.0, message = "amount must not be negative"))]
    pub amount: Option<f64>,
    pub stage: Option<OpportunityStage>,
    #[validate(range(min = 0, max = 100, message = "probability must be between 0 and 100"))]
    pub probability: Option<i32>,
    pub status: Option<OpportunityStatus>,
    pub expected_close_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OpportunityDraft {
    pub name: String,
    pub company: Option<String>,
    pub lead_id: Option<Uuid>,
    pub amount: f64,
    pub stage: OpportunityStage,
    pub probability: i32,
    pub status: OpportunityStatus,
    pub expected_close_date: Option<NaiveDate>,
}

impl NewOpportunity {
    pub fn validated(self) -> Result<OpportunityDraft, AppError> {
        validate_input(&self)?;
        let name = self.name.unwrap_or_default();
        require_non_blank(&name, "name")?;

        Ok(OpportunityDraft {
            name: name.trim().to_string(),
            company: non_blank(self.company),
            lead_id: self.lead_id,
            amount: self.amount.unwrap_or(0.0),
            stage: self.stage.unwrap_or_default(),
            probability: self.probability.unwrap_or(0),
            status: self.status.unwrap_or_default(),
            expected_close_date: self.expected_close_date,
        })
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct StageUpdate {
    #[validate(required(message = "stage is required"))]
    pub stage: Option<OpportunityStage>,
    #[validate(range(min = 0, max = 100, message = "probability must be between 0 and 100"))]
    pub probability: Option<i32>,
}

/// The stage/status/probability triple written by a stage move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageChange {
    pub stage: OpportunityStage,
    pub status: OpportunityStatus,
    pub probability: Option<i32>,
}

impl StageChange {
    /// Closing stages pin status and probability; open stages keep the
    /// current probability unless one is supplied.
    pub fn for_stage(stage: OpportunityStage, probability: Option<i32>) -> Self {
        match stage {
            OpportunityStage::ClosedWon => Self {
                stage,
                status: OpportunityStatus::Won,
                probability: Some(100),
            },
            OpportunityStage::ClosedLost => Self {
                stage,
                status: OpportunityStatus::Lost,
                probability: Some(0),
            },
            _ => Self {
                stage,
                status: OpportunityStatus::Open,
                probability,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct StageSummary {
    pub stage: String,
    pub count: i64,
    pub total_amount: f64,
}
