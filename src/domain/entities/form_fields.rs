use actix_multipart::form::text::Text;
use chrono::NaiveDate;
use validator::{ValidationError, ValidationErrors};

use crate::errors::validation_error;

/// Multipart text field, empty when absent.
pub fn text(field: Option<Text<String>>) -> String {
    field.map(|t| t.into_inner()).unwrap_or_default()
}

/// Multipart text field, `None` when absent or blank.
pub fn optional_text(field: Option<Text<String>>) -> Option<String> {
    field
        .map(|t| t.into_inner())
        .filter(|s| !s.trim().is_empty())
}

/// Blank strings read as `None`.
pub fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

/// `validator` custom rule: the value must not be blank.
pub fn required(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(validation_error("required", "This field is required."));
    }
    Ok(())
}

/// `validator` custom rule: blank, or an absolute http(s) URL.
pub fn optional_url(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Ok(());
    }
    match url::Url::parse(value.trim()) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => Ok(()),
        _ => Err(validation_error("url", "The value must be a valid URL.")),
    }
}

/// Parses a `YYYY-MM-DD` field, recording a field error on failure.
pub fn parse_date_field(
    errors: &mut ValidationErrors,
    field: &'static str,
    raw: Option<&str>,
    required: bool,
) -> Option<NaiveDate> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => {
            if required {
                errors.add(field, validation_error("required", format!("The {} field is required.", field.replace('_', " "))));
            }
            None
        }
        Some(value) => match NaiveDate::parse_from_str(value, "%Y-%m-%d") {
            Ok(date) => Some(date),
            Err(_) => {
                errors.add(field, validation_error("date", format!("The {} field must be a valid date.", field.replace('_', " "))));
                None
            }
        },
    }
}

/// The derive-generated errors, or an empty set to add manual ones to.
pub fn derived_errors(result: Result<(), ValidationErrors>) -> ValidationErrors {
    result.err().unwrap_or_else(ValidationErrors::new)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dates_are_parsed_or_reported() {
        let mut errors = ValidationErrors::new();

        assert_eq!(
            parse_date_field(&mut errors, "start_date", Some("2024-02-29"), true),
            NaiveDate::from_ymd_opt(2024, 2, 29)
        );
        assert!(parse_date_field(&mut errors, "end_date", Some("29/02/2024"), true).is_none());
        assert!(parse_date_field(&mut errors, "expiration_date", None, false).is_none());
        assert!(parse_date_field(&mut errors, "issue_date", Some(" "), true).is_none());

        let fields = errors.field_errors();
        assert!(fields.contains_key("end_date"));
        assert!(fields.contains_key("issue_date"));
        assert!(!fields.contains_key("expiration_date"));
    }

    #[test]
    fn optional_urls_allow_blank() {
        assert!(optional_url("").is_ok());
        assert!(optional_url("https://github.com/someone").is_ok());
        assert!(optional_url("ftp://files.example.com").is_err());
        assert!(optional_url("github.com/someone").is_err());
    }

    #[test]
    fn blank_required_values_fail() {
        assert!(required("  ").is_err());
        assert!(required("Rust").is_ok());
    }
}
