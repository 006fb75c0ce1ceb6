use actix_multipart::form::{tempfile::TempFile, text::Text, MultipartForm};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{
    entities::{
        file::{featured_or_first, Attachable, AttachedFile},
        form_fields::{optional_text, required, text},
        technology::{LinkedTechnology, Technology},
    },
    utils::markdown::safe_markdown_to_html,
};

// ───── Database Models ───────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Project {
    pub id: i64,
    pub name: String,
    pub short_description: String,
    pub long_description: String,
    pub link: Option<String>,
    pub github: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Attachable for Project {
    const TABLE: &'static str = "projects";

    fn owner_id(&self) -> i64 {
        self.id
    }
}

// ───── API Response Models ──────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct ProjectWithRelations {
    #[serde(flatten)]
    pub project: Project,
    pub long_description_html: String,
    pub technologies: Vec<LinkedTechnology>,
    pub files: Vec<AttachedFile>,
    pub featured_image: Option<AttachedFile>,
}

impl ProjectWithRelations {
    pub fn new(project: Project, technologies: Vec<LinkedTechnology>, files: Vec<AttachedFile>) -> Self {
        let featured_image = featured_or_first(&files).cloned();
        ProjectWithRelations {
            long_description_html: safe_markdown_to_html(&project.long_description),
            project,
            technologies,
            files,
            featured_image,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProjectEditData {
    pub project: ProjectWithRelations,
    pub technologies_all: Vec<Technology>,
    pub technology_selected_ids: Vec<i64>,
}

// ───── Input & Validation ───────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct ProjectInput {
    #[validate(
        custom(function = "required", message = "The name field is required."),
        length(max = 255, message = "The name may not be greater than 255 characters.")
    )]
    pub name: String,

    #[validate(
        custom(function = "required", message = "The short description field is required."),
        length(max = 255, message = "The short description may not be greater than 255 characters.")
    )]
    pub short_description: String,

    #[validate(custom(function = "required", message = "The long description field is required."))]
    pub long_description: String,

    #[validate(url(message = "The link must be a valid URL."))]
    pub link: Option<String>,

    #[validate(url(message = "The github must be a valid URL."))]
    pub github: Option<String>,

    #[serde(default)]
    pub technology_ids: Vec<i64>,
}

#[derive(Debug, MultipartForm)]
pub struct ProjectForm {
    pub name: Option<Text<String>>,
    pub short_description: Option<Text<String>>,
    pub long_description: Option<Text<String>>,
    pub link: Option<Text<String>>,
    pub github: Option<Text<String>>,
    #[multipart(rename = "technology_ids[]")]
    pub technology_ids: Vec<Text<i64>>,
    #[multipart(rename = "images[]")]
    pub images: Vec<TempFile>,
}

impl ProjectForm {
    pub fn into_parts(self) -> (ProjectInput, Vec<TempFile>) {
        let input = ProjectInput {
            name: text(self.name),
            short_description: text(self.short_description),
            long_description: text(self.long_description),
            link: optional_text(self.link),
            github: optional_text(self.github),
            technology_ids: self.technology_ids.into_iter().map(|t| t.into_inner()).collect(),
        };
        (input, self.images)
    }
}

/// Every image id of the project, in the wanted order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReorderImagesRequest {
    #[serde(default)]
    pub file_ids: Vec<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_input() -> ProjectInput {
        ProjectInput {
            name: "Storefront".into(),
            short_description: "Headless shop".into(),
            long_description: "Built with **Rust**.".into(),
            link: Some("https://shop.example.com".into()),
            github: None,
            technology_ids: vec![1, 2],
        }
    }

    #[test]
    fn valid_input_passes() {
        assert!(valid_input().validate().is_ok());
    }

    #[test]
    fn blank_required_fields_and_bad_urls_fail() {
        let input = ProjectInput {
            name: " ".into(),
            long_description: String::new(),
            github: Some("not a url".into()),
            ..valid_input()
        };
        let errors = input.validate().unwrap_err();
        let fields = errors.field_errors();

        assert!(fields.contains_key("name"));
        assert!(fields.contains_key("long_description"));
        assert!(fields.contains_key("github"));
        assert!(!fields.contains_key("short_description"));
    }

    #[test]
    fn overlong_name_fails() {
        let input = ProjectInput { name: "x".repeat(256), ..valid_input() };
        assert!(input.validate().is_err());
    }
}
