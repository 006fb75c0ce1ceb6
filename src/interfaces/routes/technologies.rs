use actix_web::web;

use crate::handlers::technologies;

pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/technologies")
            .service(
                web::resource("")
                    .route(web::get().to(technologies::index))
                    .route(web::post().to(technologies::store))
            )
            .service(
                web::resource("/create")
                    .route(web::get().to(technologies::create))
            )
            .service(
                web::resource("/{id}/edit")
                    .route(web::get().to(technologies::edit))
            )
            .service(
                web::resource("/{id}")
                    .route(web::put().to(technologies::update))
                    .route(web::delete().to(technologies::destroy))
            )
    );
}
