use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::errors::AppError;
use crate::validation::{non_blank, require_non_blank, validate_input};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmployeeStatus {
    #[default]
    Active,
    OnLeave,
    Terminated,
}

impl EmployeeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmployeeStatus::Active => "active",
            EmployeeStatus::OnLeave => "on_leave",
            EmployeeStatus::Terminated => "terminated",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct EmployeeRow {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub department: Option<String>,
    pub designation: Option<String>,
    pub employment_type: Option<String>,
    pub status: String,
    pub date_of_joining: Option<NaiveDate>,
    pub manager_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct NewEmployee {
    #[validate(
        required(message = "first_name is required"),
        length(min = 1, max = 100, message = "first_name must be 1-100 characters")
    )]
    pub first_name: Option<String>,
    #[validate(
        required(message = "last_name is required"),
        length(min = 1, max = 100, message = "last_name must be 1-100 characters")
    )]
    pub last_name: Option<String>,
    #[validate(
        required(message = "email is required"),
        email(message = "email must be a valid email address")
    )]
    pub email: Option<String>,
    pub department: Option<String>,
    pub designation: Option<String>,
    pub employment_type: Option<String>,
    pub status: Option<EmployeeStatus>,
    pub date_of_joining: Option<NaiveDate>,
    pub manager_id: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmployeeDraft {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub department: Option<String>,
    pub designation: Option<String>,
    pub employment_type: Option<String>,
    pub status: EmployeeStatus,
    pub date_of_joining: Option<NaiveDate>,
    pub manager_id: Option<Uuid>,
}

impl NewEmployee {
    pub fn validated(self) -> Result<EmployeeDraft, AppError> {
        validate_input(&self)?;
        let first_name = self.first_name.unwrap_or_default();
        let last_name = self.last_name.unwrap_or_default();
        require_non_blank(&first_name, "first_name")?;
        require_non_blank(&last_name, "last_name")?;

        Ok(EmployeeDraft {
            first_name: first_name.trim().to_string(),
            last_name: last_name.trim().to_string(),
            email: self.email.unwrap_or_default().trim().to_string(),
            department: non_blank(self.department),
            designation: non_blank(self.designation),
            employment_type: non_blank(self.employment_type),
            status: self.status.unwrap_or_default(),
            date_of_joining: self.date_of_joining,
            manager_id: self.manager_id,
        })
    }
}

/// Partial update. Absent fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
pub struct EmployeeUpdate {
    #[validate(length(min = 1, max = 100, message = "first_name must be 1-100 characters"))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 100, message = "last_name must be 1-100 characters"))]
    pub last_name: Option<String>,
    #[validate(email(message = "email must be a valid email address"))]
    pub email: Option<String>,
    pub department: Option<String>,
    pub designation: Option<String>,
    pub employment_type: Option<String>,
    pub status: Option<EmployeeStatus>,
    pub date_of_joining: Option<NaiveDate>,
    pub manager_id: Option<Uuid>,
}

impl EmployeeUpdate {
    pub fn validated(self) -> Result<Self, AppError> {
        validate_input(&self)?;
        if let Some(first_name) = &self.first_name {
            require_non_blank(first_name, "first_name")?;
        }
        if let Some(last_name) = &self.last_name {
            require_non_blank(last_name, "last_name")?;
        }

        Ok(Self {
            first_name: self.first_name.map(|v| v.trim().to_string()),
            last_name: self.last_name.map(|v| v.trim().to_string()),
            email: self.email.map(|v| v.trim().to_string()),
            department: non_blank(self.department),
            designation: non_blank(self.designation),
            employment_type: non_blank(self.employment_type),
            ..self
        })
    }

    pub fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.email.is_none()
            && self.department.is_none()
            && self.designation.is_none()
            && self.employment_type.is_none()
            && self.status.is_none()
            && self.date_of_joining.is_none()
            && self.manager_id.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct HeadcountBucket {
    pub key: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Headcount {
    pub total: i64,
    pub by_department: Vec<HeadcountBucket>,
    pub by_status: Vec<HeadcountBucket>,
}
