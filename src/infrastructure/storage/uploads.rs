use std::path::Path;

use actix_multipart::form::tempfile::TempFile;
use futures_util::future::try_join_all;
use tokio::fs;

use crate::{entities::file::FileKind, errors::{AppError, FieldError}};

pub const PROJECT_IMAGE_TYPES: &[&str] = &["image/jpeg", "image/png", "image/gif", "image/webp"];
pub const PROFILE_IMAGE_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp"];
pub const RESUME_TYPES: &[&str] = &["application/pdf"];

/// An uploaded payload read into memory, with its content-sniffed MIME type.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub original_name: String,
    pub mime_type: String,
    pub content: Vec<u8>,
}

impl UploadedFile {
    pub fn new(original_name: impl Into<String>, content: Vec<u8>, declared_mime: Option<&str>) -> Self {
        let mime_type = infer::get(&content)
            .map(|kind| kind.mime_type().to_string())
            .or_else(|| declared_mime.map(str::to_string))
            .unwrap_or_else(|| "application/octet-stream".to_string());

        UploadedFile {
            original_name: original_name.into(),
            mime_type,
            content,
        }
    }

    /// Reads a multipart temp file. Returns `None` for an empty file input.
    pub async fn from_temp_file(temp: TempFile) -> Result<Option<Self>, AppError> {
        let original_name = temp.file_name.clone().unwrap_or_default();
        if temp.size == 0 && original_name.is_empty() {
            return Ok(None);
        }

        let content = fs::read(temp.file.path()).await?;
        let declared = temp.content_type.as_ref().map(|m| m.essence_str().to_string());

        Ok(Some(Self::new(original_name, content, declared.as_deref())))
    }

    pub fn size(&self) -> i64 {
        self.content.len() as i64
    }

    /// Lowercase extension from the client name, else one implied by the content.
    pub fn extension(&self) -> String {
        let from_name = Path::new(&self.original_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .filter(|e| !e.is_empty() && e.len() <= 8 && e.chars().all(|c| c.is_ascii_alphanumeric()));

        from_name
            .or_else(|| infer::get(&self.content).map(|k| k.extension().to_string()))
            .unwrap_or_else(|| "bin".to_string())
    }
}

/// Reads every non-empty temp file of a multipart field.
pub async fn collect_uploads(files: Vec<TempFile>) -> Result<Vec<UploadedFile>, AppError> {
    let uploads = try_join_all(files.into_iter().map(UploadedFile::from_temp_file)).await?;
    Ok(uploads.into_iter().flatten().collect())
}

/// Accepted MIME types, size cap and count cap for one upload field.
#[derive(Debug, Clone, Copy)]
pub struct UploadRules {
    pub kind: FileKind,
    pub allowed_types: &'static [&'static str],
    pub max_kb: u64,
    pub max_files: Option<usize>,
}

impl UploadRules {
    pub fn images(allowed_types: &'static [&'static str], max_kb: u64) -> Self {
        UploadRules { kind: FileKind::Image, allowed_types, max_kb, max_files: None }
    }

    pub fn documents(allowed_types: &'static [&'static str], max_kb: u64) -> Self {
        UploadRules { kind: FileKind::Document, allowed_types, max_kb, max_files: None }
    }

    pub fn at_most(mut self, max_files: usize) -> Self {
        self.max_files = Some(max_files);
        self
    }

    /// Checks every file of `field`; errors are keyed `field` or `field.N`.
    pub fn check(&self, field: &str, files: &[UploadedFile]) -> Result<(), AppError> {
        let mut errors = Vec::new();

        if let Some(max) = self.max_files {
            if files.len() > max {
                errors.push(FieldError {
                    field: field.to_string(),
                    message: format!("The {} field must not have more than {} file(s).", field, max),
                });
            }
        }

        for (index, file) in files.iter().enumerate() {
            let key = if self.max_files == Some(1) {
                field.to_string()
            } else {
                format!("{}.{}", field, index)
            };

            if !self.allowed_types.contains(&file.mime_type.as_str()) {
                errors.push(FieldError {
                    field: key.clone(),
                    message: format!("The file must be of type: {}.", self.describe_types()),
                });
            }
            if file.size() as u64 > self.max_kb * 1024 {
                errors.push(FieldError {
                    field: key,
                    message: format!("The file must not be greater than {} kilobytes.", self.max_kb),
                });
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(AppError::ValidationError(errors))
        }
    }

    fn describe_types(&self) -> String {
        self.allowed_types
            .iter()
            .map(|m| m.rsplit('/').next().unwrap_or(m))
            .collect::<Vec<_>>()
            .join(", ")
    }
}
