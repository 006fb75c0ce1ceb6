use actix_web::web;

use crate::handlers::certifications;

pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/certifications")
            .service(
                web::resource("")
                    .route(web::get().to(certifications::index))
                    .route(web::post().to(certifications::store))
            )
            .service(
                web::resource("/create")
                    .route(web::get().to(certifications::create))
            )
            .service(
                web::resource("/{id}/edit")
                    .route(web::get().to(certifications::edit))
            )
            .service(
                web::resource("/{id}")
                    .route(web::put().to(certifications::update))
                    .route(web::delete().to(certifications::destroy))
            )
    );
}
