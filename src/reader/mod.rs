pub mod line_source;
pub mod decoder;
