pub mod attachments;
pub mod certification;
pub mod profile;
pub mod project;
pub mod technology;
pub mod work_experience;
