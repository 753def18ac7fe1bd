pub mod classifier;
pub mod config;
pub mod document;
pub mod error;
pub mod grouper;
pub mod io;
pub mod manifest;
pub mod parser;
pub mod paths;
pub mod pipeline;
pub mod render;
pub mod types;
pub mod vocabulary;

pub use error::{Result, SegmentError};
