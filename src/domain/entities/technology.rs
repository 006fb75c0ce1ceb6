use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::entities::form_fields::required;

// ───── Database Models ───────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "technology_category")]
pub enum TechnologyCategory {
    Frontend,
    Backend,
    Tools,
}

impl TechnologyCategory {
    pub const ALL: [TechnologyCategory; 3] = [
        TechnologyCategory::Frontend,
        TechnologyCategory::Backend,
        TechnologyCategory::Tools,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TechnologyCategory::Frontend => "Frontend",
            TechnologyCategory::Backend => "Backend",
            TechnologyCategory::Tools => "Tools",
        }
    }
}

impl fmt::Display for TechnologyCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TechnologyCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TechnologyCategory::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Unknown technology category: {}", s))
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Technology {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub category: TechnologyCategory,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A technology seen through an owner's ordered pivot.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct LinkedTechnology {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub category: TechnologyCategory,
    pub sort_order: i32,
    #[serde(skip)]
    pub owner_id: i64,
}

/// `{id, name}` pair used by filter dropdowns.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct TechnologyOption {
    pub id: i64,
    pub name: String,
}

/// Pivot tables linking owners to technologies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagPivot {
    Project,
    Certification,
}

impl TagPivot {
    pub fn table(self) -> &'static str {
        match self {
            TagPivot::Project => "project_technology",
            TagPivot::Certification => "certification_technology",
        }
    }

    pub fn owner_column(self) -> &'static str {
        match self {
            TagPivot::Project => "project_id",
            TagPivot::Certification => "certification_id",
        }
    }
}

// ───── Input & Validation ───────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TechnologyInput {
    #[validate(
        custom(function = "required", message = "The name field is required."),
        length(max = 255, message = "The name may not exceed 255 characters.")
    )]
    pub name: String,

    #[validate(length(max = 255, message = "The slug may not exceed 255 characters."))]
    #[serde(default)]
    pub slug: Option<String>,

    pub category: TechnologyCategory,
}

impl TechnologyInput {
    /// The submitted slug normalised, else one derived from the name.
    pub fn resolved_slug(&self) -> String {
        match self.slug.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(given) => slug::slugify(given),
            None => slug::slugify(&self.name),
        }
    }
}

/// Drops repeated ids, keeping each id at its first position.
pub fn dedupe_ids(ids: &[i64]) -> Vec<i64> {
    let mut seen = std::collections::HashSet::new();
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}

/// Pivot rows for a wholesale sync: sort orders `1..N` in input order.
pub fn pivot_rows(ids: &[i64]) -> Vec<(i64, i32)> {
    dedupe_ids(ids)
        .into_iter()
        .enumerate()
        .map(|(index, id)| (id, index as i32 + 1))
        .collect()
}
