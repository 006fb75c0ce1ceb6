use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ───── Database Models ───────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "file_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Image,
    Document,
}

/// Metadata row of a stored blob. `url` is derived, never persisted.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct FileRecord {
    pub id: i64,
    pub original_name: String,
    pub filename: String,
    pub path: String,
    pub mime_type: String,
    pub size: i64,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub kind: FileKind,
    pub alt_text: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[sqlx(skip)]
    pub url: String,
}

impl FileRecord {
    pub fn with_url(mut self, public_prefix: &str) -> Self {
        self.url = public_url(public_prefix, &self.path);
        self
    }
}

/// Joins the configured public prefix and a blob path.
pub fn public_url(prefix: &str, path: &str) -> String {
    format!("{}/{}", prefix.trim_end_matches('/'), path.trim_start_matches('/'))
}

#[derive(Debug)]
pub struct NewFile {
    pub original_name: String,
    pub filename: String,
    pub path: String,
    pub mime_type: String,
    pub size: i64,
    pub kind: FileKind,
}

/// A file as seen through an ordered pivot, e.g. a project's gallery.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct AttachedFile {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub file: FileRecord,
    #[serde(skip)]
    pub owner_id: i64,
    pub sort_order: i32,
    pub is_featured: bool,
}

impl AttachedFile {
    pub fn with_url(mut self, public_prefix: &str) -> Self {
        self.file = self.file.with_url(public_prefix);
        self
    }
}

/// The featured file, else the first by sort order.
pub fn featured_or_first(files: &[AttachedFile]) -> Option<&AttachedFile> {
    files
        .iter()
        .find(|f| f.is_featured)
        .or_else(|| files.iter().min_by_key(|f| f.sort_order))
}

// ───── Associations ─────────────────────────────────────────────────

/// Pivot tables linking owners to many files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileRelation {
    ProjectFiles,
}

impl FileRelation {
    pub const ALL: &'static [FileRelation] = &[FileRelation::ProjectFiles];

    pub fn table(self) -> &'static str {
        match self {
            FileRelation::ProjectFiles => "project_files",
        }
    }

    pub fn owner_column(self) -> &'static str {
        match self {
            FileRelation::ProjectFiles => "project_id",
        }
    }
}

/// Owner columns pointing at a single file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileForeignKey {
    CertificationImage,
    ProfileAvatar,
    ProfileResume,
}

impl FileForeignKey {
    pub const ALL: &'static [FileForeignKey] = &[
        FileForeignKey::CertificationImage,
        FileForeignKey::ProfileAvatar,
        FileForeignKey::ProfileResume,
    ];

    pub fn table(self) -> &'static str {
        match self {
            FileForeignKey::CertificationImage => "certifications",
            FileForeignKey::ProfileAvatar | FileForeignKey::ProfileResume => "dev_profile",
        }
    }

    pub fn column(self) -> &'static str {
        match self {
            FileForeignKey::CertificationImage => "certification_image_id",
            FileForeignKey::ProfileAvatar => "avatar_file_id",
            FileForeignKey::ProfileResume => "resume_file_id",
        }
    }
}

/// How uploads are linked to their owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentMode {
    OneToOne {
        foreign_key: FileForeignKey,
    },
    ManyToMany {
        relation: FileRelation,
        track_order: bool,
        track_featured: bool,
    },
}

/// An entity that owns files. Blobs live under `<TABLE>/<id>/`.
pub trait Attachable {
    const TABLE: &'static str;

    fn owner_id(&self) -> i64;

    fn storage_directory(&self) -> String {
        format!("{}/{}", Self::TABLE, self.owner_id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attached(id: i64, sort_order: i32, is_featured: bool) -> AttachedFile {
        let now = Utc::now();
        AttachedFile {
            file: FileRecord {
                id,
                original_name: format!("{id}.png"),
                filename: format!("{id}.png"),
                path: format!("projects/1/{id}.png"),
                mime_type: "image/png".into(),
                size: 10,
                kind: FileKind::Image,
                alt_text: None,
                created_at: now,
                updated_at: now,
                url: String::new(),
            },
            owner_id: 1,
            sort_order,
            is_featured,
        }
    }

    #[test]
    fn featured_file_wins_over_sort_order() {
        let files = vec![attached(1, 1, false), attached(2, 2, true)];
        assert_eq!(featured_or_first(&files).map(|f| f.file.id), Some(2));
    }

    #[test]
    fn first_by_sort_order_when_nothing_is_featured() {
        let files = vec![attached(5, 3, false), attached(6, 1, false)];
        assert_eq!(featured_or_first(&files).map(|f| f.file.id), Some(6));
        assert!(featured_or_first(&[]).is_none());
    }

    #[test]
    fn urls_join_prefix_and_path() {
        assert_eq!(public_url("/storage/", "projects/1/a.png"), "/storage/projects/1/a.png");
        assert_eq!(
            attached(3, 1, false).with_url("https://cdn.example.com").file.url,
            "https://cdn.example.com/projects/1/3.png"
        );
    }
}
