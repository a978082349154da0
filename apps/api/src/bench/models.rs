use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::errors::AppError;
use crate::scoring::Explanation;
use crate::validation::{clean_list, null_as_empty, require_non_blank, validate_input};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    #[default]
    Available,
    PartiallyAllocated,
    Allocated,
}

impl Availability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Availability::Available => "available",
            Availability::PartiallyAllocated => "partially_allocated",
            Availability::Allocated => "allocated",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct BenchResourceRow {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub employee_id: Option<Uuid>,
    pub full_name: String,
    pub skills: Vec<String>,
    pub experience_years: Option<f64>,
    pub availability: String,
    pub available_from: Option<NaiveDate>,
    pub hourly_rate: Option<f64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct NewBenchResource {
    pub employee_id: Option<Uuid>,
    #[validate(
        required(message = "full_name is required"),
        length(min = 1, max = 200, message = "full_name must be 1-200 characters")
    )]
    pub full_name: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub skills: Vec<String>,
    #[validate(range(min = 0.0, message = "experience_years must not be negative"))]
    pub experience_years: Option<f64>,
    pub availability: Option<Availability>,
    pub available_from: Option<NaiveDate>,
    #[validate(range(min = 0.0, message = "hourly_rate must not be negative"))]
    pub hourly_rate: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BenchResourceDraft {
    pub employee_id: Option<Uuid>,
    pub full_name: String,
    pub skills: Vec<String>,
    pub experience_years: Option<f64>,
    pub availability: Availability,
    pub available_from: Option<NaiveDate>,
    pub hourly_rate: Option<f64>,
}

impl NewBenchResource {
    pub fn validated(self) -> Result<BenchResourceDraft, AppError> {
        validate_input(&self)?;
        let full_name = self.full_name.unwrap_or_default();
        require_non_blank(&full_name, "full_name")?;

        Ok(BenchResourceDraft {
            employee_id: self.employee_id,
            full_name: full_name.trim().to_string(),
            skills: clean_list(self.skills),
            experience_years: self.experience_years,
            availability: self.availability.unwrap_or_default(),
            available_from: self.available_from,
            hourly_rate: self.hourly_rate,
        })
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AvailabilityUpdate {
    #[validate(required(message = "availability is required"))]
    pub availability: Option<Availability>,
    pub available_from: Option<NaiveDate>,
}

/// A bench resource scored against a requisition. Never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct BenchMatch {
    pub resource_id: Uuid,
    pub full_name: String,
    pub availability: String,
    pub score: u8,
    pub explain: Vec<Explanation>,
}
