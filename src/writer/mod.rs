pub mod ingest_writer;
pub mod observer;
pub mod export;
