pub mod postgres;
pub mod unit_of_work;
