use actix_web::{web, HttpResponse, Responder};
use serde_json::json;
use tracing::instrument;

use crate::{
    entities::{pagination::PageRequest, technology::TechnologyInput},
    errors::AppError,
    filters::FilterParams,
    handlers::flash::{back_with_errors, failed, redirect_with_message},
    AppState,
};

const INDEX: &str = "/admin/technologies";

#[instrument(skip(state, query))]
pub async fn index(
    state: web::Data<AppState>,
    query: web::Query<Vec<(String, String)>>,
) -> Result<impl Responder, AppError> {
    let params = FilterParams::from_pairs(query.into_inner());
    let page = PageRequest::from_params(&params, &state.config);

    let technologies = state.technology_handler.index(&params, page).await?;

    Ok(HttpResponse::Ok().json(json!({
        "technologies": technologies,
        "filters": params.to_json(),
    })))
}

#[instrument(skip(state))]
pub async fn create(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(json!({ "categories": state.technology_handler.categories() }))
}

#[instrument(skip(state, body))]
pub async fn store(state: web::Data<AppState>, body: web::Json<TechnologyInput>) -> HttpResponse {
    let input = body.into_inner();

    match state.technology_handler.create(&input).await {
        Ok(_) => redirect_with_message(INDEX, "Skill created successfully!"),
        Err(e) => back_with_errors(&e, "Failed to create skill.", &input),
    }
}

#[instrument(skip(state))]
pub async fn edit(state: web::Data<AppState>, id: web::Path<i64>) -> Result<impl Responder, AppError> {
    let technology = state.technology_handler.get_technology(id.into_inner()).await?;

    Ok(HttpResponse::Ok().json(json!({
        "technology": technology,
        "categories": state.technology_handler.categories(),
    })))
}

#[instrument(skip(state, body))]
pub async fn update(
    state: web::Data<AppState>,
    id: web::Path<i64>,
    body: web::Json<TechnologyInput>,
) -> HttpResponse {
    let input = body.into_inner();

    match state.technology_handler.update(id.into_inner(), &input).await {
        Ok(_) => redirect_with_message(INDEX, "Skill updated successfully!"),
        Err(e) => back_with_errors(&e, "Failed to update skill.", &input),
    }
}

#[instrument(skip(state))]
pub async fn destroy(state: web::Data<AppState>, id: web::Path<i64>) -> HttpResponse {
    match state.technology_handler.delete(id.into_inner()).await {
        Ok(()) => redirect_with_message(INDEX, "Skill deleted successfully!"),
        Err(e) => failed(&e, "Failed to delete skill."),
    }
}
