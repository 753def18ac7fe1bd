use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SegmentError {
    #[error("input file not found: {}", .0.display())]
    InputNotFound(PathBuf),

    #[error("failed to read input {}: {source}", path.display())]
    ReadInput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to create output directory {}: {source}", path.display())]
    CreateOutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    WriteArtifact {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to scan output directory {}: {source}", path.display())]
    ScanOutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),

    #[error("failed to read config {}: {source}", path.display())]
    ReadConfig {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {}: {source}", path.display())]
    ParseConfig {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("duplicate section number {number} (first at line {first_line}, again at line {line})")]
    DuplicateSection {
        number: u32,
        first_line: usize,
        line: usize,
    },

    #[error("duplicate feature requirement FR-{id} at line {line}")]
    DuplicateRequirement { id: String, line: usize },

    #[error("invalid work category: {0}")]
    InvalidCategory(String),

    #[error("invalid vocabulary pattern for {category}: {source}")]
    InvalidVocabulary {
        category: String,
        #[source]
        source: regex::Error,
    },
}

pub type Result<T> = std::result::Result<T, SegmentError>;
