pub mod analytics;
pub mod journals;
