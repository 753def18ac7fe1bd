use crate::classifier::Classifier;
use crate::error::{Result, SegmentError};
use crate::paths::{DEFAULT_MANIFEST_FILE, DEFAULT_PREFIX};
use crate::types::WorkCategory;
use crate::vocabulary::{default_vocabulary, extend_vocabulary};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// SegmentConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentConfig {
    /// Filename prefix for generated prompts.
    #[serde(default = "default_prefix")]
    pub prefix: String,
    #[serde(default = "default_manifest_file")]
    pub manifest_file: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,
    /// Rendered verbatim under "Environment Context" in every prompt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    /// Extra whole-word terms per category, appended to the built-in table.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub vocabulary: BTreeMap<WorkCategory, Vec<String>>,
}

fn default_prefix() -> String {
    DEFAULT_PREFIX.to_string()
}

fn default_manifest_file() -> String {
    DEFAULT_MANIFEST_FILE.to_string()
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            manifest_file: default_manifest_file(),
            project_name: None,
            context: None,
            vocabulary: BTreeMap::new(),
        }
    }
}

impl SegmentConfig {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(SegmentError::ConfigNotFound(path.to_path_buf()));
        }
        let data = std::fs::read_to_string(path).map_err(|source| SegmentError::ReadConfig {
            path: path.to_path_buf(),
            source,
        })?;
        if data.trim().is_empty() {
            return Ok(Self::default());
        }
        let cfg: SegmentConfig =
            serde_yaml::from_str(&data).map_err(|source| SegmentError::ParseConfig {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(cfg)
    }

    /// Build the classifier this config describes.
    pub fn classifier(&self) -> Result<Classifier> {
        let table = extend_vocabulary(default_vocabulary(), &self.vocabulary);
        Classifier::new(&table)
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if self.prefix.trim().is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "prefix must not be empty".to_string(),
            });
        }
        for (field, value) in [("prefix", &self.prefix), ("manifest_file", &self.manifest_file)] {
            if value.contains(['/', '\\']) {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Error,
                    message: format!("{field} '{value}' must not contain path separators"),
                });
            }
        }
        if self.manifest_file.trim().is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "manifest_file must not be empty".to_string(),
            });
        } else if crate::paths::prompt_filename_pattern(&self.prefix).is_match(&self.manifest_file)
        {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: format!(
                    "manifest_file '{}' collides with generated prompt names",
                    self.manifest_file
                ),
            });
        }

        if let Some(terms) = self.vocabulary.get(&WorkCategory::General) {
            if !terms.is_empty() {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: "vocabulary for 'general' is ignored; it is the fallback category"
                        .to_string(),
                });
            }
        }
        for (category, terms) in &self.vocabulary {
            if terms.iter().any(|t| t.trim().is_empty()) {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!("vocabulary for '{category}' contains an empty term"),
                });
            }
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
