pub mod certification;
pub mod dev_profile;
pub mod file;
pub mod form_fields;
pub mod pagination;
pub mod project;
pub mod technology;
pub mod work_experience;
