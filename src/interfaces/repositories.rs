pub mod certification;
pub mod file;
pub mod profile;
pub mod project;
pub mod sqlx_repo;
pub mod technology;
pub mod work_experience;
