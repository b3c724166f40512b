pub mod types;
pub mod config;
pub mod error;
pub mod session;
pub mod stats;
pub mod explorer;
