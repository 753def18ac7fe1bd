use crate::error::{Result, SegmentError};
use crate::types::Span;
use std::path::{Path, PathBuf};

/// The raw specification text and where it came from. Immutable once read.
#[derive(Debug, Clone)]
pub struct SpecificationDocument {
    path: PathBuf,
    text: String,
}

impl SpecificationDocument {
    /// Read the document at `path`. A missing path is reported as
    /// [`SegmentError::InputNotFound`] before any read is attempted.
    pub fn read(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(SegmentError::InputNotFound(path.to_path_buf()));
        }
        let text = std::fs::read_to_string(path).map_err(|source| SegmentError::ReadInput {
            path: path.to_path_buf(),
            source,
        })?;
        let path = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        Ok(Self { path, text })
    }

    pub fn from_text(path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            text: text.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn slice(&self, span: Span) -> &str {
        &self.text[span.start..span.end]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn read_missing_file_is_input_not_found() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nope.md");
        let err = SpecificationDocument::read(&path).unwrap_err();
        assert!(matches!(err, SegmentError::InputNotFound(p) if p == path));
    }

    #[test]
    fn read_directory_is_input_not_found() {
        let dir = TempDir::new().unwrap();
        let err = SpecificationDocument::read(dir.path()).unwrap_err();
        assert!(matches!(err, SegmentError::InputNotFound(_)));
    }

    #[test]
    fn read_returns_text() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("spec.md");
        std::fs::write(&path, "## SECTION 1: Foundation\n").unwrap();
        let doc = SpecificationDocument::read(&path).unwrap();
        assert_eq!(doc.text(), "## SECTION 1: Foundation\n");
    }
}
