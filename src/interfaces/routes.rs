use actix_web::web;

use crate::handlers::{home::home, storage, system::health_check};

mod certifications;
mod json_error;
mod profile;
mod projects;
mod technologies;
mod work_experiences;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(home);
    cfg.service(health_check);

    cfg.service(
        web::resource("/storage/{tail:.*}")
            .route(web::get().to(storage::serve_file))
    );

    cfg.service(
        web::scope("/admin")
            .configure(projects::config_routes)
            .configure(certifications::config_routes)
            .configure(technologies::config_routes)
            .configure(work_experiences::config_routes)
            .configure(profile::config_routes)
    );

    cfg.configure(json_error::config_routes);
}
