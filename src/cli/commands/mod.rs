pub mod check_math;
pub mod config;
pub mod generate;
pub mod validate_plan;
