use actix_multipart::form::MultipartForm;
use actix_web::{web, HttpResponse, Responder};
use serde_json::json;
use tracing::instrument;

use crate::{
    entities::{certification::CertificationForm, pagination::PageRequest},
    errors::AppError,
    filters::FilterParams,
    handlers::flash::{back_with_errors, failed, redirect_with_message},
    storage::uploads::collect_uploads,
    AppState,
};

const INDEX: &str = "/admin/certifications";

#[instrument(skip(state, query))]
pub async fn index(
    state: web::Data<AppState>,
    query: web::Query<Vec<(String, String)>>,
) -> Result<impl Responder, AppError> {
    let params = FilterParams::from_pairs(query.into_inner());
    let page = PageRequest::from_params(&params, &state.config);

    let index = state.certification_handler.index(&params, page).await?;

    Ok(HttpResponse::Ok().json(json!({
        "certifications": index.certifications,
        "technologies": index.technologies,
        "filters": params.to_json(),
    })))
}

#[instrument(skip(state))]
pub async fn create(state: web::Data<AppState>) -> Result<impl Responder, AppError> {
    let technologies = state.certification_handler.create_form().await?;
    Ok(HttpResponse::Ok().json(json!({ "technologies": technologies })))
}

#[instrument(skip(state, form))]
pub async fn store(state: web::Data<AppState>, form: MultipartForm<CertificationForm>) -> HttpResponse {
    let (input, files) = form.into_inner().into_parts();

    let images = match collect_uploads(files).await {
        Ok(images) => images,
        Err(e) => return back_with_errors(&e, "Failed to create Certification.", &input),
    };

    match state.certification_handler.create(input.clone(), images).await {
        Ok(_) => redirect_with_message(INDEX, "Certification created successfully!"),
        Err(e) => back_with_errors(&e, "Failed to create Certification.", &input),
    }
}

#[instrument(skip(state))]
pub async fn edit(state: web::Data<AppState>, id: web::Path<i64>) -> Result<impl Responder, AppError> {
    let data = state.certification_handler.edit_data(id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(data))
}

#[instrument(skip(state, form))]
pub async fn update(
    state: web::Data<AppState>,
    id: web::Path<i64>,
    form: MultipartForm<CertificationForm>,
) -> HttpResponse {
    let (input, files) = form.into_inner().into_parts();

    let images = match collect_uploads(files).await {
        Ok(images) => images,
        Err(e) => return back_with_errors(&e, "Failed to update Certification. Please try again.", &input),
    };

    match state.certification_handler.update(id.into_inner(), input.clone(), images).await {
        Ok(_) => redirect_with_message(INDEX, "Certification updated successfully!"),
        Err(e) => back_with_errors(&e, "Failed to update Certification. Please try again.", &input),
    }
}

#[instrument(skip(state))]
pub async fn destroy(state: web::Data<AppState>, id: web::Path<i64>) -> HttpResponse {
    match state.certification_handler.delete(id.into_inner()).await {
        Ok(()) => redirect_with_message(INDEX, "Certification deleted successfully!"),
        Err(e) => failed(&e, "Failed to delete Certification."),
    }
}
