use actix_multipart::form::MultipartForm;
use actix_web::{web, HttpResponse, Responder};
use serde_json::json;
use tracing::instrument;

use crate::{
    entities::{
        pagination::PageRequest,
        project::{ProjectForm, ReorderImagesRequest},
    },
    errors::AppError,
    filters::FilterParams,
    handlers::flash::{back_with_errors, failed, redirect_with_message},
    storage::uploads::collect_uploads,
    AppState,
};

const INDEX: &str = "/admin/projects";

fn edit_location(id: i64) -> String {
    format!("/admin/projects/{}/edit", id)
}

#[instrument(skip(state, query))]
pub async fn index(
    state: web::Data<AppState>,
    query: web::Query<Vec<(String, String)>>,
) -> Result<impl Responder, AppError> {
    let params = FilterParams::from_pairs(query.into_inner());
    let page = PageRequest::from_params(&params, &state.config);

    let projects = state.project_handler.index(&params, page).await?;

    Ok(HttpResponse::Ok().json(json!({
        "projects": projects,
        "filters": params.to_json(),
    })))
}

#[instrument(skip(state))]
pub async fn create(state: web::Data<AppState>) -> Result<impl Responder, AppError> {
    let technologies = state.project_handler.create_form().await?;
    Ok(HttpResponse::Ok().json(json!({ "technologies": technologies })))
}

#[instrument(skip(state, form))]
pub async fn store(state: web::Data<AppState>, form: MultipartForm<ProjectForm>) -> HttpResponse {
    let (input, files) = form.into_inner().into_parts();

    let images = match collect_uploads(files).await {
        Ok(images) => images,
        Err(e) => return back_with_errors(&e, "Failed to create project.", &input),
    };

    match state.project_handler.create(input.clone(), images).await {
        Ok(_) => redirect_with_message(INDEX, "Project created successfully!"),
        Err(e) => back_with_errors(&e, "Failed to create project.", &input),
    }
}

#[instrument(skip(state))]
pub async fn edit(state: web::Data<AppState>, id: web::Path<i64>) -> Result<impl Responder, AppError> {
    let data = state.project_handler.edit_data(id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(data))
}

#[instrument(skip(state, form))]
pub async fn update(
    state: web::Data<AppState>,
    id: web::Path<i64>,
    form: MultipartForm<ProjectForm>,
) -> HttpResponse {
    let id = id.into_inner();
    let (input, files) = form.into_inner().into_parts();

    let images = match collect_uploads(files).await {
        Ok(images) => images,
        Err(e) => return back_with_errors(&e, "Failed to update project. Please try again.", &input),
    };

    match state.project_handler.update(id, input.clone(), images).await {
        Ok(_) => redirect_with_message(INDEX, "Project updated successfully!"),
        Err(e) => back_with_errors(&e, "Failed to update project. Please try again.", &input),
    }
}

#[instrument(skip(state))]
pub async fn destroy(state: web::Data<AppState>, id: web::Path<i64>) -> HttpResponse {
    match state.project_handler.delete(id.into_inner()).await {
        Ok(()) => redirect_with_message(INDEX, "Project deleted successfully!"),
        Err(e) => failed(&e, "Failed to delete project."),
    }
}

#[instrument(skip(state))]
pub async fn detach_image(state: web::Data<AppState>, path: web::Path<(i64, i64)>) -> HttpResponse {
    let (id, file_id) = path.into_inner();

    match state.project_handler.detach_image(id, file_id).await {
        Ok(()) => redirect_with_message(&edit_location(id), "Image removed successfully!"),
        Err(e) => failed(&e, "Failed to remove image."),
    }
}

#[instrument(skip(state))]
pub async fn set_featured_image(state: web::Data<AppState>, path: web::Path<(i64, i64)>) -> HttpResponse {
    let (id, file_id) = path.into_inner();

    match state.project_handler.set_featured_image(id, file_id).await {
        Ok(()) => redirect_with_message(&edit_location(id), "Featured image updated successfully!"),
        Err(e) => failed(&e, "Failed to update featured image."),
    }
}

#[instrument(skip(state, body))]
pub async fn reorder_images(
    state: web::Data<AppState>,
    id: web::Path<i64>,
    body: web::Json<ReorderImagesRequest>,
) -> HttpResponse {
    let id = id.into_inner();
    let request = body.into_inner();

    match state.project_handler.reorder_images(id, &request.file_ids).await {
        Ok(()) => redirect_with_message(&edit_location(id), "Images reordered successfully!"),
        Err(e) => back_with_errors(&e, "Failed to reorder images.", &request),
    }
}
