use crate::error::{Result, SegmentError};
use crate::types::UnitId;
use regex::Regex;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const DEFAULT_PREFIX: &str = "04f";
pub const DEFAULT_MANIFEST_FILE: &str = "EXECUTION-INDEX.md";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

/// `<prefix>-execution-E<NN>-P<NN>.md`
pub fn prompt_filename(prefix: &str, id: UnitId) -> String {
    format!("{prefix}-execution-{id}.md")
}

pub fn prompt_path(output_dir: &Path, prefix: &str, id: UnitId) -> PathBuf {
    output_dir.join(prompt_filename(prefix, id))
}

pub fn manifest_path(output_dir: &Path, manifest_file: &str) -> PathBuf {
    output_dir.join(manifest_file)
}

/// Matches filenames previously produced by [`prompt_filename`] for `prefix`.
pub fn prompt_filename_pattern(prefix: &str) -> Regex {
    Regex::new(&format!(
        r"^{}-execution-E\d{{2,}}-P\d{{2,}}\.md$",
        regex::escape(prefix)
    ))
    .expect("escaped prefix yields a valid pattern")
}

/// Generated prompt files currently in `output_dir`, sorted by name.
pub fn existing_prompts(output_dir: &Path, prefix: &str) -> Result<Vec<PathBuf>> {
    if !output_dir.is_dir() {
        return Ok(Vec::new());
    }
    let scan_err = |source: std::io::Error| SegmentError::ScanOutputDir {
        path: output_dir.to_path_buf(),
        source,
    };
    let pattern = prompt_filename_pattern(prefix);
    let mut found = Vec::new();
    for entry in std::fs::read_dir(output_dir).map_err(scan_err)? {
        let entry = entry.map_err(scan_err)?;
        if !entry.file_type().map_err(scan_err)?.is_file() {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            if pattern.is_match(name) {
                found.push(entry.path());
            }
        }
    }
    found.sort();
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn prompt_filename_is_zero_padded() {
        assert_eq!(
            prompt_filename("04f", UnitId::new(1, 2)),
            "04f-execution-E01-P02.md"
        );
        assert_eq!(
            prompt_filename("bmo", UnitId::new(10, 4)),
            "bmo-execution-E10-P04.md"
        );
    }

    #[test]
    fn pattern_matches_only_generated_names() {
        let re = prompt_filename_pattern("04f");
        assert!(re.is_match("04f-execution-E01-P01.md"));
        assert!(re.is_match("04f-execution-E123-P04.md"));
        assert!(!re.is_match("04f-execution-E1-P01.md"));
        assert!(!re.is_match("other-execution-E01-P01.md"));
        assert!(!re.is_match(DEFAULT_MANIFEST_FILE));
    }

    #[test]
    fn pattern_escapes_prefix() {
        let re = prompt_filename_pattern("a.b");
        assert!(re.is_match("a.b-execution-E01-P01.md"));
        assert!(!re.is_match("axb-execution-E01-P01.md"));
    }

    #[test]
    fn existing_prompts_lists_generated_files() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("04f-execution-E02-P01.md"), "x").unwrap();
        std::fs::write(dir.path().join("04f-execution-E01-P01.md"), "x").unwrap();
        std::fs::write(dir.path().join("notes.md"), "x").unwrap();
        let found = existing_prompts(dir.path(), "04f").unwrap();
        let names: Vec<_> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["04f-execution-E01-P01.md", "04f-execution-E02-P01.md"]);
    }

    #[cfg(unix)]
    #[test]
    fn existing_prompts_unreadable_dir_names_the_path() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let out = dir.path().join("out");
        std::fs::create_dir(&out).unwrap();
        std::fs::set_permissions(&out, std::fs::Permissions::from_mode(0o000)).unwrap();
        // Privileged users read through the mode bits; nothing to observe then.
        if std::fs::read_dir(&out).is_ok() {
            std::fs::set_permissions(&out, std::fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }
        let err = existing_prompts(&out, "04f").unwrap_err();
        std::fs::set_permissions(&out, std::fs::Permissions::from_mode(0o755)).unwrap();
        assert!(matches!(err, SegmentError::ScanOutputDir { ref path, .. } if *path == out));
        assert!(err.to_string().contains(&out.display().to_string()));
    }

    #[test]
    fn existing_prompts_in_missing_dir_is_empty() {
        let dir = TempDir::new().unwrap();
        assert!(existing_prompts(&dir.path().join("absent"), "04f")
            .unwrap()
            .is_empty());
    }
}
