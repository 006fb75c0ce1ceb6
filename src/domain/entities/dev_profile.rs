use actix_multipart::form::{tempfile::TempFile, MultipartForm};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{
    entities::{
        file::{Attachable, FileRecord},
        form_fields::{derived_errors, non_blank, optional_url, parse_date_field, required},
    },
    errors::{validation_error, AppError},
};

/// Id of the single profile row.
pub const PROFILE_ID: i64 = 1;

pub const DEFAULT_JOB_TITLE: &str = "Software Engineer";
pub const DEFAULT_SHORT_BIO: &str = "Short bio here";
pub const DEFAULT_LONG_DESCRIPTION: &str = "Your story here";
pub const DEFAULT_EMAIL: &str = "hello@example.com";

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct DevProfile {
    pub id: i64,
    pub job_title: String,
    pub short_bio: String,
    pub long_description: String,
    pub professional_summary: String,
    pub avatar_file_id: Option<i64>,
    pub resume_file_id: Option<i64>,
    pub email: String,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub github_url: Option<String>,
    pub linkedin_url: Option<String>,
    pub website_url: Option<String>,
    pub years_experience: Option<i16>,
    pub languages: Option<Vec<String>>,
    pub university: Option<String>,
    pub degree: Option<String>,
    pub start_date_uni: Option<NaiveDate>,
    pub end_date_uni: Option<NaiveDate>,
    pub degree_url: Option<String>,
    pub diploma_thesis_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Attachable for DevProfile {
    const TABLE: &'static str = "dev_profile";

    fn owner_id(&self) -> i64 {
        self.id
    }
}

#[derive(Debug, Serialize)]
pub struct DevProfileView {
    #[serde(flatten)]
    pub profile: DevProfile,
    pub avatar: Option<FileRecord>,
    pub resume: Option<FileRecord>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct DevProfileInput {
    #[validate(
        custom(function = "required", message = "The job title field is required."),
        length(max = 255, message = "The job title may not be greater than 255 characters.")
    )]
    pub job_title: String,

    #[validate(
        custom(function = "required", message = "The short bio field is required."),
        length(max = 500, message = "The short bio may not be greater than 500 characters.")
    )]
    pub short_bio: String,

    #[validate(custom(function = "required", message = "The long description field is required."))]
    pub long_description: String,

    pub professional_summary: Option<String>,

    #[validate(
        email(message = "The email must be a valid email address."),
        length(min = 1, max = 255, message = "The email field is required and may not exceed 255 characters.")
    )]
    pub email: String,

    #[validate(length(max = 50, message = "The phone may not be greater than 50 characters."))]
    pub phone: Option<String>,

    #[validate(length(max = 255, message = "The location may not be greater than 255 characters."))]
    pub location: Option<String>,

    #[validate(custom(function = "optional_url", message = "The github url must be a valid URL."), length(max = 255))]
    pub github_url: Option<String>,

    #[validate(custom(function = "optional_url", message = "The linkedin url must be a valid URL."), length(max = 255))]
    pub linkedin_url: Option<String>,

    #[validate(custom(function = "optional_url", message = "The website url must be a valid URL."), length(max = 255))]
    pub website_url: Option<String>,

    #[validate(range(min = 0, max = 100, message = "The years experience must be between 0 and 100."))]
    pub years_experience: Option<i16>,

    pub languages: Option<Vec<String>>,

    #[validate(length(max = 255, message = "The university may not be greater than 255 characters."))]
    pub university: Option<String>,

    #[validate(length(max = 255, message = "The degree may not be greater than 255 characters."))]
    pub degree: Option<String>,

    pub start_date_uni: Option<String>,

    pub end_date_uni: Option<String>,

    #[validate(custom(function = "optional_url", message = "The degree url must be a valid URL."), length(max = 255))]
    pub degree_url: Option<String>,

    #[validate(custom(function = "optional_url", message = "The diploma thesis url must be a valid URL."), length(max = 255))]
    pub diploma_thesis_url: Option<String>,
}

/// Validated profile values ready for persistence.
#[derive(Debug, Clone)]
pub struct DevProfileData {
    pub job_title: String,
    pub short_bio: String,
    pub long_description: String,
    pub professional_summary: Option<String>,
    pub email: String,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub github_url: Option<String>,
    pub linkedin_url: Option<String>,
    pub website_url: Option<String>,
    pub years_experience: Option<i16>,
    pub languages: Option<Vec<String>>,
    pub university: Option<String>,
    pub degree: Option<String>,
    pub start_date_uni: Option<NaiveDate>,
    pub end_date_uni: Option<NaiveDate>,
    pub degree_url: Option<String>,
    pub diploma_thesis_url: Option<String>,
}

impl TryFrom<&DevProfileInput> for DevProfileData {
    type Error = AppError;

    fn try_from(input: &DevProfileInput) -> Result<Self, Self::Error> {
        let mut errors = derived_errors(input.validate());

        if input
            .languages
            .as_ref()
            .is_some_and(|langs| langs.iter().any(|l| l.chars().count() > 100))
        {
            errors.add(
                "languages",
                validation_error("max", "Each language may not be greater than 100 characters."),
            );
        }

        let start_date_uni = parse_date_field(&mut errors, "start_date_uni", input.start_date_uni.as_deref(), false);
        let end_date_uni = parse_date_field(&mut errors, "end_date_uni", input.end_date_uni.as_deref(), false);

        if !errors.is_empty() {
            return Err(errors.into());
        }

        let languages = input.languages.as_ref().map(|langs| {
            langs
                .iter()
                .map(|l| l.trim().to_string())
                .filter(|l| !l.is_empty())
                .collect::<Vec<_>>()
        });

        Ok(DevProfileData {
            job_title: input.job_title.trim().to_string(),
            short_bio: input.short_bio.trim().to_string(),
            long_description: input.long_description.clone(),
            professional_summary: non_blank(input.professional_summary.clone()),
            email: input.email.trim().to_string(),
            phone: non_blank(input.phone.clone()),
            location: non_blank(input.location.clone()),
            github_url: non_blank(input.github_url.clone()),
            linkedin_url: non_blank(input.linkedin_url.clone()),
            website_url: non_blank(input.website_url.clone()),
            years_experience: input.years_experience,
            languages,
            university: non_blank(input.university.clone()),
            degree: non_blank(input.degree.clone()),
            start_date_uni,
            end_date_uni,
            degree_url: non_blank(input.degree_url.clone()),
            diploma_thesis_url: non_blank(input.diploma_thesis_url.clone()),
        })
    }
}

#[derive(Debug, MultipartForm)]
pub struct AvatarForm {
    pub avatar: Option<TempFile>,
}

#[derive(Debug, MultipartForm)]
pub struct ResumeForm {
    pub resume: Option<TempFile>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> DevProfileInput {
        DevProfileInput {
            job_title: "Software Engineer".into(),
            short_bio: "Builds things.".into(),
            long_description: "A long story.".into(),
            email: "dev@example.com".into(),
            languages: Some(vec!["English".into(), " ".into(), "German".into()]),
            start_date_uni: Some("2015-10-01".into()),
            ..Default::default()
        }
    }

    #[test]
    fn valid_input_trims_languages() {
        let data = DevProfileData::try_from(&input()).unwrap();

        assert_eq!(data.languages, Some(vec!["English".to_string(), "German".to_string()]));
        assert_eq!(data.start_date_uni, NaiveDate::from_ymd_opt(2015, 10, 1));
    }

    #[test]
    fn long_language_names_are_rejected() {
        let bad = DevProfileInput { languages: Some(vec!["x".repeat(101)]), ..input() };
        let err = DevProfileData::try_from(&bad).unwrap_err();

        assert_eq!(err.field_errors()[0].field, "languages");
    }

    #[test]
    fn email_and_bio_limits_apply() {
        let bad = DevProfileInput {
            email: "not-an-email".into(),
            short_bio: "b".repeat(501),
            ..input()
        };
        let err = DevProfileData::try_from(&bad).unwrap_err();
        let fields: Vec<_> = err.field_errors().iter().map(|e| e.field.as_str()).collect();

        assert_eq!(fields, vec!["email", "short_bio"]);
    }
}
