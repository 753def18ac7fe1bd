use crate::error::{Result, SegmentError};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Atomically write `data` to `path` using a tempfile in the same directory,
/// so an interrupted run never leaves a half-written artifact behind.
pub fn atomic_write(path: &Path, data: &[u8]) -> Result<()> {
    let write_err = |source: std::io::Error| SegmentError::WriteArtifact {
        path: path.to_path_buf(),
        source,
    };
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir).map_err(write_err)?;
    tmp.write_all(data).map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;
    Ok(())
}

/// Create a directory and all parents, idempotent.
pub fn ensure_dir(path: &Path) -> Result<()> {
    std::fs::create_dir_all(path).map_err(|source| SegmentError::CreateOutputDir {
        path: path.to_path_buf(),
        source,
    })
}

/// Delete each of `paths`, ignoring ones that are already gone.
pub fn remove_files(paths: &[std::path::PathBuf]) -> Result<usize> {
    let mut removed = 0;
    for path in paths {
        match std::fs::remove_file(path) {
            Ok(()) => removed += 1,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(source) => {
                return Err(SegmentError::WriteArtifact {
                    path: path.clone(),
                    source,
                })
            }
        }
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn atomic_write_creates_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("04f-execution-E01-P01.md");
        atomic_write(&path, b"# Execution Prompt").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "# Execution Prompt");
    }

    #[test]
    fn atomic_write_overwrites() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("index.md");
        atomic_write(&path, b"old").unwrap();
        atomic_write(&path, b"new").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "new");
    }

    #[test]
    fn atomic_write_into_missing_dir_reports_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent/file.md");
        let err = atomic_write(&path, b"x").unwrap_err();
        assert!(matches!(err, SegmentError::WriteArtifact { path: p, .. } if p == path));
    }

    #[test]
    fn ensure_dir_creates_parents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a/b/c");
        ensure_dir(&path).unwrap();
        ensure_dir(&path).unwrap();
        assert!(path.is_dir());
    }

    #[test]
    fn ensure_dir_over_a_file_fails() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("occupied");
        std::fs::write(&file, "x").unwrap();
        let err = ensure_dir(&file.join("sub")).unwrap_err();
        assert!(matches!(err, SegmentError::CreateOutputDir { .. }));
    }

    #[test]
    fn remove_files_skips_missing() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.md");
        std::fs::write(&a, "x").unwrap();
        let removed = remove_files(&[a.clone(), dir.path().join("b.md")]).unwrap();
        assert_eq!(removed, 1);
        assert!(!a.exists());
    }
}
