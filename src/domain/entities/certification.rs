use actix_multipart::form::{tempfile::TempFile, text::Text, MultipartForm};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationErrors};

use crate::{
    entities::{
        file::{Attachable, FileRecord},
        form_fields::{derived_errors, optional_text, parse_date_field, required, text},
        technology::{LinkedTechnology, Technology, TechnologyOption},
    },
    errors::AppError,
};

// ───── Database Models ───────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Certification {
    pub id: i64,
    pub name: String,
    pub issuing_organization: String,
    pub issue_date: NaiveDate,
    pub expiration_date: Option<NaiveDate>,
    pub credential_id: Option<String>,
    pub credential_url: Option<String>,
    pub certification_image_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Attachable for Certification {
    const TABLE: &'static str = "certifications";

    fn owner_id(&self) -> i64 {
        self.id
    }
}

/// Validated values ready for persistence.
#[derive(Debug, Clone)]
pub struct CertificationData {
    pub name: String,
    pub issuing_organization: String,
    pub issue_date: NaiveDate,
    pub expiration_date: Option<NaiveDate>,
    pub credential_id: Option<String>,
    pub credential_url: Option<String>,
    pub technology_ids: Vec<i64>,
}

// ───── API Response Models ──────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct CertificationWithRelations {
    #[serde(flatten)]
    pub certification: Certification,
    pub certification_image: Option<FileRecord>,
    pub technologies: Vec<LinkedTechnology>,
}

#[derive(Debug, Serialize)]
pub struct CertificationIndex<P: Serialize> {
    pub certifications: P,
    pub technologies: Vec<TechnologyOption>,
}

#[derive(Debug, Serialize)]
pub struct CertificationEditData {
    pub certification: CertificationWithRelations,
    pub technologies_all: Vec<Technology>,
    pub technology_selected_ids: Vec<i64>,
}

// ───── Input & Validation ───────────────────────────────────────────

/// Submitted fields as received; dates stay raw until validated.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct CertificationInput {
    #[validate(
        custom(function = "required", message = "The name field is required."),
        length(max = 255, message = "The name may not be greater than 255 characters.")
    )]
    pub name: String,

    #[validate(
        custom(function = "required", message = "The issuing organization field is required."),
        length(max = 255, message = "The issuing organization may not be greater than 255 characters.")
    )]
    pub issuing_organization: String,

    pub issue_date: String,

    pub expiration_date: Option<String>,

    #[validate(length(max = 255, message = "The credential id may not be greater than 255 characters."))]
    pub credential_id: Option<String>,

    #[validate(url(message = "The credential url must be a valid URL."))]
    pub credential_url: Option<String>,

    #[serde(default)]
    pub technology_ids: Vec<i64>,
}

impl TryFrom<&CertificationInput> for CertificationData {
    type Error = AppError;

    fn try_from(input: &CertificationInput) -> Result<Self, Self::Error> {
        let mut errors: ValidationErrors = derived_errors(input.validate());

        let issue_date = parse_date_field(&mut errors, "issue_date", Some(&input.issue_date), true);
        let expiration_date = parse_date_field(&mut errors, "expiration_date", input.expiration_date.as_deref(), false);

        let Some(issue_date) = issue_date.filter(|_| errors.is_empty()) else {
            return Err(errors.into());
        };

        Ok(CertificationData {
            name: input.name.trim().to_string(),
            issuing_organization: input.issuing_organization.trim().to_string(),
            issue_date,
            expiration_date,
            credential_id: input.credential_id.clone(),
            credential_url: input.credential_url.clone(),
            technology_ids: input.technology_ids.clone(),
        })
    }
}

#[derive(Debug, MultipartForm)]
pub struct CertificationForm {
    pub name: Option<Text<String>>,
    pub issuing_organization: Option<Text<String>>,
    pub issue_date: Option<Text<String>>,
    pub expiration_date: Option<Text<String>>,
    pub credential_id: Option<Text<String>>,
    pub credential_url: Option<Text<String>>,
    #[multipart(rename = "technology_ids[]")]
    pub technology_ids: Vec<Text<i64>>,
    #[multipart(rename = "certificationImage[]")]
    pub certification_image: Vec<TempFile>,
}

impl CertificationForm {
    pub fn into_parts(self) -> (CertificationInput, Vec<TempFile>) {
        let input = CertificationInput {
            name: text(self.name),
            issuing_organization: text(self.issuing_organization),
            issue_date: text(self.issue_date),
            expiration_date: optional_text(self.expiration_date),
            credential_id: optional_text(self.credential_id),
            credential_url: optional_text(self.credential_url),
            technology_ids: self.technology_ids.into_iter().map(|t| t.into_inner()).collect(),
        };
        (input, self.certification_image)
    }
}
