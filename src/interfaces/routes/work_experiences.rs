use actix_web::web;

use crate::handlers::work_experiences;

pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/work-experiences")
            .service(
                web::resource("")
                    .route(web::get().to(work_experiences::index))
                    .route(web::post().to(work_experiences::store))
            )
            .service(
                web::resource("/create")
                    .route(web::get().to(work_experiences::create))
            )
            .service(
                web::resource("/{id}/edit")
                    .route(web::get().to(work_experiences::edit))
            )
            .service(
                web::resource("/{id}")
                    .route(web::put().to(work_experiences::update))
                    .route(web::delete().to(work_experiences::destroy))
            )
    );
}
