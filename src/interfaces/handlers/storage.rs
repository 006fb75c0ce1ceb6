use actix_web::{
    http::header::{CacheControl, CacheDirective},
    web, HttpResponse,
};
use tracing::instrument;

use crate::{constants::STORAGE_CACHE_MAX_AGE, errors::AppError, AppState};

/// Serves a stored blob by its relative path.
#[instrument(skip(state))]
pub async fn serve_file(state: web::Data<AppState>, path: web::Path<String>) -> Result<HttpResponse, AppError> {
    let content = state.storage.backend().read(&path).await?;
    let content_type = infer::get(&content)
        .map(|kind| kind.mime_type())
        .unwrap_or("application/octet-stream");

    Ok(HttpResponse::Ok()
        .content_type(content_type)
        .insert_header(CacheControl(vec![CacheDirective::Public, CacheDirective::MaxAge(STORAGE_CACHE_MAX_AGE)]))
        .body(content))
}
