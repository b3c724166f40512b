pub mod segment;
pub mod record_store;
pub mod error_log;
