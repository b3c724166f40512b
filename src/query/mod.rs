pub mod types;
pub mod matcher;
pub mod executor;
pub mod cache;
