use actix_web::web;

use crate::handlers::profile;

pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/dev-profile")
            .service(
                web::resource("")
                    .route(web::post().to(profile::update))
            )
            .service(
                web::resource("/edit")
                    .route(web::get().to(profile::edit))
            )
            .service(
                web::resource("/avatar")
                    .route(web::post().to(profile::upload_avatar))
                    .route(web::delete().to(profile::delete_avatar))
            )
            .service(
                web::resource("/resume")
                    .route(web::post().to(profile::upload_resume))
                    .route(web::delete().to(profile::delete_resume))
            )
    );
}
