pub mod analyze;
pub mod export;
