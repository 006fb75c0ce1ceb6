use actix_web::{web, HttpResponse, Responder};
use serde_json::json;
use tracing::instrument;

use crate::{
    entities::{pagination::PageRequest, work_experience::WorkExperienceInput},
    errors::AppError,
    filters::FilterParams,
    handlers::flash::{back_with_errors, failed, redirect_with_message},
    AppState,
};

const INDEX: &str = "/admin/work-experiences";

#[instrument(skip(state, query))]
pub async fn index(
    state: web::Data<AppState>,
    query: web::Query<Vec<(String, String)>>,
) -> Result<impl Responder, AppError> {
    let params = FilterParams::from_pairs(query.into_inner());
    let page = PageRequest::from_params(&params, &state.config);

    let experiences = state.work_experience_handler.index(&params, page).await?;

    Ok(HttpResponse::Ok().json(json!({
        "workExperiences": experiences,
        "filters": params.to_json(),
    })))
}

pub async fn create() -> impl Responder {
    HttpResponse::Ok().json(json!({ "workExperience": WorkExperienceInput::default() }))
}

#[instrument(skip(state, body))]
pub async fn store(state: web::Data<AppState>, body: web::Json<WorkExperienceInput>) -> HttpResponse {
    let input = body.into_inner();

    match state.work_experience_handler.create(&input).await {
        Ok(_) => redirect_with_message(INDEX, "Work experience created successfully!"),
        Err(e) => back_with_errors(&e, "Failed to create work experience.", &input),
    }
}

#[instrument(skip(state))]
pub async fn edit(state: web::Data<AppState>, id: web::Path<i64>) -> Result<impl Responder, AppError> {
    let experience = state.work_experience_handler.get_work_experience(id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "workExperience": experience })))
}

#[instrument(skip(state, body))]
pub async fn update(
    state: web::Data<AppState>,
    id: web::Path<i64>,
    body: web::Json<WorkExperienceInput>,
) -> HttpResponse {
    let input = body.into_inner();

    match state.work_experience_handler.update(id.into_inner(), &input).await {
        Ok(_) => redirect_with_message(INDEX, "Work experience updated successfully!"),
        Err(e) => back_with_errors(&e, "Failed to update work experience.", &input),
    }
}

#[instrument(skip(state))]
pub async fn destroy(state: web::Data<AppState>, id: web::Path<i64>) -> HttpResponse {
    match state.work_experience_handler.delete(id.into_inner()).await {
        Ok(()) => redirect_with_message(INDEX, "Work experience deleted successfully!"),
        Err(e) => failed(&e, "Failed to delete work experience."),
    }
}
