//! Naive CSV reader/writer for lead import and export.
//!
//! Lines are split on `\n` and fields on `,` with surrounding quotes stripped.
//! Quoted commas and escaped quotes are NOT supported, on either side: a value
//! containing a comma is split on import and emitted unquoted on export.

use serde::Serialize;

use crate::crm::models::{LeadRow, LeadStatus, NewLead};
use crate::errors::AppError;

pub const EXPORT_HEADER: &str =
    "id,first_name,last_name,email,phone,company,job_title,source,status,score,created_at";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeadField {
    FirstName,
    LastName,
    Email,
    Phone,
    Company,
    JobTitle,
    Source,
    Status,
}

impl LeadField {
    /// Headers match case-insensitively, ignoring spaces, underscores and dashes.
    pub fn from_header(header: &str) -> Option<Self> {
        let key: String = header
            .trim()
            .trim_matches('"')
            .chars()
            .filter(|c| !matches!(c, ' ' | '_' | '-'))
            .collect::<String>()
            .to_lowercase();

        match key.as_str() {
            "firstname" => Some(LeadField::FirstName),
            "lastname" => Some(LeadField::LastName),
            "email" => Some(LeadField::Email),
            "phone" => Some(LeadField::Phone),
            "company" => Some(LeadField::Company),
            "jobtitle" | "title" => Some(LeadField::JobTitle),
            "source" => Some(LeadField::Source),
            "status" => Some(LeadField::Status),
            _ => None,
        }
    }
}

/// One data line, already mapped through the header. Unknown columns are gone.
#[derive(Debug, Clone, PartialEq)]
pub struct CsvRow {
    /// 1-based line number in the uploaded text (the header is line 1).
    pub line: usize,
    pub fields: Vec<(LeadField, String)>,
}

impl CsvRow {
    #[cfg(test)]
    pub fn get(&self, field: LeadField) -> Option<&str> {
        self.fields
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, v)| v.as_str())
    }

    pub fn into_new_lead(self) -> Result<NewLead, AppError> {
        let mut lead = NewLead::default();
        for (field, value) in self.fields {
            if value.is_empty() {
                continue;
            }
            match field {
                LeadField::FirstName => lead.first_name = Some(value),
                LeadField::LastName => lead.last_name = Some(value),
                LeadField::Email => lead.email = Some(value),
                LeadField::Phone => lead.phone = Some(value),
                LeadField::Company => lead.company = Some(value),
                LeadField::JobTitle => lead.job_title = Some(value),
                LeadField::Source => lead.source = Some(value),
                LeadField::Status => lead.status = Some(value.parse::<LeadStatus>()?),
            }
        }
        Ok(lead)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportFailure {
    pub line: usize,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub imported: usize,
    pub duplicates: usize,
    pub failed: Vec<ImportFailure>,
}

fn clean_value(raw: &str) -> String {
    raw.trim().trim_matches('"').trim().to_string()
}

/// Splits the upload into mapped rows. Fails only when there is no header.
pub fn parse_lead_csv(text: &str) -> Result<Vec<CsvRow>, AppError> {
    let mut lines = text
        .split('\n')
        .map(|l| l.trim_end_matches('\r'))
        .enumerate()
        .filter(|(_, l)| !l.trim().is_empty());

    let (_, header) = lines
        .next()
        .ok_or_else(|| AppError::Validation("CSV file is empty".to_string()))?;
    let columns: Vec<Option<LeadField>> = header.split(',').map(LeadField::from_header).collect();

    if columns.iter().all(Option::is_none) {
        return Err(AppError::Validation(
            "CSV header contains no recognised lead columns".to_string(),
        ));
    }

    Ok(lines
        .map(|(idx, line)| {
            let fields = line
                .split(',')
                .zip(columns.iter())
                .filter_map(|(raw, column)| column.map(|field| (field, clean_value(raw))))
                .collect();
            CsvRow {
                line: idx + 1,
                fields,
            }
        })
        .collect())
}

/// Renders leads in the fixed export column order, without quoting.
pub fn export_leads_csv(leads: &[LeadRow]) -> String {
    let mut out = String::from(EXPORT_HEADER);
    out.push('\n');
    for lead in leads {
        let id = lead.id.to_string();
        let score = lead.score.map(|s| s.to_string()).unwrap_or_default();
        let created_at = lead.created_at.to_rfc3339();
        let values: [&str; 11] = [
            &id,
            &lead.first_name,
            lead.last_name.as_deref().unwrap_or_default(),
            &lead.email,
            lead.phone.as_deref().unwrap_or_default(),
            lead.company.as_deref().unwrap_or_default(),
            lead.job_title.as_deref().unwrap_or_default(),
            lead.source.as_deref().unwrap_or_default(),
            &lead.status,
            &score,
            &created_at,
        ];
        out.push_str(&values.join(","));
        out.push('\n');
    }
    out
}
