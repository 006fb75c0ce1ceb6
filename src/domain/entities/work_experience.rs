use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{
    entities::form_fields::{derived_errors, optional_url, parse_date_field, required},
    errors::{validation_error, AppError},
};

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct WorkExperience {
    pub id: i64,
    pub job_title: String,
    pub company_name: String,
    pub company_website: Option<String>,
    pub description: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Work experience with its display-ready dates.
#[derive(Debug, Serialize)]
pub struct WorkExperienceView {
    #[serde(flatten)]
    pub experience: WorkExperience,
    pub formatted_start_date: String,
    pub formatted_end_date: String,
    pub duration: String,
}

impl From<WorkExperience> for WorkExperienceView {
    fn from(experience: WorkExperience) -> Self {
        WorkExperienceView {
            formatted_start_date: experience.start_date.format("%d/%m/%Y").to_string(),
            formatted_end_date: experience.end_date.format("%d/%m/%Y").to_string(),
            duration: format!(
                "{} - {}",
                experience.start_date.format("%b %Y"),
                experience.end_date.format("%b %Y")
            ),
            experience,
        }
    }
}

#[derive(Debug, Clone)]
pub struct WorkExperienceData {
    pub job_title: String,
    pub company_name: String,
    pub company_website: Option<String>,
    pub description: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct WorkExperienceInput {
    #[validate(
        custom(function = "required", message = "The job title field is required."),
        length(max = 255, message = "The job title may not be greater than 255 characters.")
    )]
    pub job_title: String,

    #[validate(
        custom(function = "required", message = "The company name field is required."),
        length(max = 255, message = "The company name may not be greater than 255 characters.")
    )]
    pub company_name: String,

    #[validate(
        custom(function = "optional_url", message = "The company website must be a valid URL."),
        length(max = 255, message = "The company website may not be greater than 255 characters.")
    )]
    pub company_website: Option<String>,

    #[validate(custom(function = "required", message = "The description field is required."))]
    pub description: String,

    pub start_date: Option<String>,

    pub end_date: Option<String>,
}

impl TryFrom<&WorkExperienceInput> for WorkExperienceData {
    type Error = AppError;

    fn try_from(input: &WorkExperienceInput) -> Result<Self, Self::Error> {
        let mut errors = derived_errors(input.validate());

        let start_date = parse_date_field(&mut errors, "start_date", input.start_date.as_deref(), true);
        let end_date = parse_date_field(&mut errors, "end_date", input.end_date.as_deref(), true);

        if let (Some(start), Some(end)) = (start_date, end_date) {
            if end < start {
                errors.add(
                    "end_date",
                    validation_error("after_or_equal", "The end date must be a date after or equal to start date."),
                );
            }
        }

        match (start_date, end_date) {
            (Some(start_date), Some(end_date)) if errors.is_empty() => Ok(WorkExperienceData {
                job_title: input.job_title.trim().to_string(),
                company_name: input.company_name.trim().to_string(),
                company_website: input.company_website.clone().filter(|s| !s.trim().is_empty()),
                description: input.description.clone(),
                start_date,
                end_date,
            }),
            _ => Err(errors.into()),
        }
    }
}
