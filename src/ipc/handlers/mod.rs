pub mod core;
pub mod dataset;
pub mod grading;
pub mod reports;
pub mod setup;
