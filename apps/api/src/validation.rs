//! Payload validation helpers shared by all actions.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query};
use axum::Json;
use serde::{Deserialize, Deserializer};
use validator::{Validate, ValidationErrors};

use crate::errors::AppError;

/// Unwraps a JSON body, mapping malformed payloads (bad JSON, wrong types,
/// unknown enum values) to a validation error instead of an axum rejection.
pub fn payload<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    body.map(|Json(value)| value)
        .map_err(|rejection| AppError::Validation(rejection.body_text()))
}

/// Unwraps list parameters. A query string that does not deserialize
/// (e.g. `page=abc`) is a validation error like any other bad input.
pub fn query_params<T>(params: Result<Query<T>, QueryRejection>) -> Result<T, AppError> {
    params
        .map(|Query(value)| value)
        .map_err(|rejection| AppError::Validation(rejection.body_text()))
}

/// Unwraps path segments, mapping unparsable ids to a validation error.
pub fn path_params<T>(segments: Result<Path<T>, PathRejection>) -> Result<T, AppError> {
    segments
        .map(|Path(value)| value)
        .map_err(|rejection| AppError::Validation(rejection.body_text()))
}

/// Runs the derived `validator` rules and reports the first failing constraint.
pub fn validate_input<T: Validate>(input: &T) -> Result<(), AppError> {
    input
        .validate()
        .map_err(|errors| AppError::Validation(first_error_message(&errors)))
}

/// Field errors come back as a map; sorting by field name keeps the reported
/// message stable across runs.
pub fn first_error_message(errors: &ValidationErrors) -> String {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));

    fields
        .into_iter()
        .find_map(|(field, errs)| {
            errs.first().map(|err| {
                err.message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("{field} is invalid"))
            })
        })
        .unwrap_or_else(|| "Invalid input".to_string())
}

/// Rejects blank strings that `length(min = 1)` would accept (e.g. "   ").
pub fn require_non_blank(value: &str, field: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{field} is required")));
    }
    Ok(())
}

/// Trims an optional string, mapping blank values to `None`.
pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Serde hook for list fields: an explicit `null` reads as an empty list,
/// the same as an absent field.
pub fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<Vec<T>>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Trims list entries and drops blanks. Order and duplicates are kept.
pub fn clean_list(values: Vec<String>) -> Vec<String> {
    values
        .into_iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect()
}
