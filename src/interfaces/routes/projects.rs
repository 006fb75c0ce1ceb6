use actix_web::web;

use crate::handlers::projects;

pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/projects")
            .service(
                web::resource("")
                    .route(web::get().to(projects::index))
                    .route(web::post().to(projects::store))
            )
            .service(
                web::resource("/create")
                    .route(web::get().to(projects::create))
            )
            .service(
                web::resource("/{id}/edit")
                    .route(web::get().to(projects::edit))
            )
            .service(
                web::resource("/{id}/images/reorder")
                    .route(web::post().to(projects::reorder_images))
            )
            .service(
                web::resource("/{id}/images/{file_id}/featured")
                    .route(web::post().to(projects::set_featured_image))
            )
            .service(
                web::resource("/{id}/images/{file_id}")
                    .route(web::delete().to(projects::detach_image))
            )
            .service(
                web::resource("/{id}")
                    .route(web::put().to(projects::update))
                    .route(web::delete().to(projects::destroy))
            )
    );
}
