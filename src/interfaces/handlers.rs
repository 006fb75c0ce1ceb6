pub mod certifications;
pub mod flash;
pub mod home;
pub mod profile;
pub mod projects;
pub mod storage;
pub mod system;
pub mod technologies;
pub mod work_experiences;
