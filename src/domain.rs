pub mod entities;
pub mod filters;
pub mod use_cases;
