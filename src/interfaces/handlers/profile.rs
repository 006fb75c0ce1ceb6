use actix_multipart::form::{tempfile::TempFile, MultipartForm};
use actix_web::{web, HttpResponse, Responder};
use serde_json::json;
use tracing::instrument;

use crate::{
    entities::dev_profile::{AvatarForm, DevProfileInput, ResumeForm},
    errors::AppError,
    handlers::flash::{back_with_errors, failed, redirect_with_message},
    storage::uploads::UploadedFile,
    use_cases::profile::ProfileAsset,
    AppState,
};

const EDIT: &str = "/admin/dev-profile/edit";

#[instrument(skip(state))]
pub async fn edit(state: web::Data<AppState>) -> Result<impl Responder, AppError> {
    let profile = state.profile_handler.edit_data().await?;
    Ok(HttpResponse::Ok().json(json!({ "profile": profile })))
}

#[instrument(skip(state, body))]
pub async fn update(state: web::Data<AppState>, body: web::Json<DevProfileInput>) -> HttpResponse {
    let input = body.into_inner();

    match state.profile_handler.update(&input).await {
        Ok(_) => redirect_with_message(EDIT, "Profile updated successfully!"),
        Err(e) => back_with_errors(&e, "Failed to update profile.", &input),
    }
}

async fn store_asset(state: &AppState, asset: ProfileAsset, file: Option<TempFile>, success: &str, failure: &str) -> HttpResponse {
    let upload = match file {
        Some(temp) => UploadedFile::from_temp_file(temp).await,
        None => Ok(None),
    };

    let result = match upload {
        Ok(upload) => state.profile_handler.upload(asset, upload).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(_) => redirect_with_message(EDIT, success),
        Err(e) => failed(&e, failure),
    }
}

async fn remove_asset(state: &AppState, asset: ProfileAsset, success: &str, failure: &str) -> HttpResponse {
    match state.profile_handler.remove(asset).await {
        Ok(_) => redirect_with_message(EDIT, success),
        Err(e) => failed(&e, failure),
    }
}

#[instrument(skip(state, form))]
pub async fn upload_avatar(state: web::Data<AppState>, form: MultipartForm<AvatarForm>) -> HttpResponse {
    let form = form.into_inner();
    store_asset(&state, ProfileAsset::Avatar, form.avatar, "Avatar uploaded successfully!", "Failed to upload avatar.").await
}

#[instrument(skip(state))]
pub async fn delete_avatar(state: web::Data<AppState>) -> HttpResponse {
    remove_asset(&state, ProfileAsset::Avatar, "Avatar deleted successfully!", "Failed to delete avatar.").await
}

#[instrument(skip(state, form))]
pub async fn upload_resume(state: web::Data<AppState>, form: MultipartForm<ResumeForm>) -> HttpResponse {
    let form = form.into_inner();
    store_asset(&state, ProfileAsset::Resume, form.resume, "Resume uploaded successfully!", "Failed to upload resume.").await
}

#[instrument(skip(state))]
pub async fn delete_resume(state: web::Data<AppState>) -> HttpResponse {
    remove_asset(&state, ProfileAsset::Resume, "Resume deleted successfully!", "Failed to delete resume.").await
}
