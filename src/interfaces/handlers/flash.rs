use std::collections::BTreeMap;

use actix_web::{http::header, HttpResponse, ResponseError};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::warn;

use crate::errors::{AppError, FieldError};

/// `303 See Other` to `location` carrying a flash message.
pub fn redirect_with_message(location: &str, message: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, location))
        .json(json!({ "message": message }))
}

/// Field errors grouped by field, messages in the order they were raised.
pub fn grouped_errors(fields: &[FieldError]) -> BTreeMap<&str, Vec<&str>> {
    let mut grouped: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for error in fields {
        grouped.entry(error.field.as_str()).or_default().push(error.message.as_str());
    }
    grouped
}

/// Error response echoing the submitted input.
///
/// Validation failures list their field errors. Persistence and storage
/// failures are reported with `failure_message` only; not found and
/// conflict errors keep their own message.
pub fn back_with_errors<I: Serialize>(err: &AppError, failure_message: &str, input: &I) -> HttpResponse {
    let input = serde_json::to_value(input).unwrap_or(Value::Null);

    let body = match err {
        AppError::ValidationError(fields) => json!({
            "error": "The given data was invalid.",
            "errors": grouped_errors(fields),
            "input": input,
        }),
        AppError::InternalError(_) | AppError::StorageError(_) => json!({
            "error": failure_message,
            "errors": {},
            "input": input,
        }),
        other => json!({
            "error": other.to_string(),
            "errors": {},
            "input": input,
        }),
    };

    if !err.is_validation() {
        warn!(error = %err, "{}", failure_message);
    }
    HttpResponse::build(err.status_code()).json(body)
}

/// Like [`back_with_errors`] for requests without a form body.
pub fn failed(err: &AppError, failure_message: &str) -> HttpResponse {
    back_with_errors(err, failure_message, &Value::Null)
}
