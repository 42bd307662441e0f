pub mod availability;
pub mod titles;
