pub mod batch;
pub mod bucket;
pub mod score;
pub mod validate_rules;
