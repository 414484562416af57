pub mod analytics;
pub mod journal;
