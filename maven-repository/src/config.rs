//! Repository configuration.
//!
//! Configuration is stored as JSON. Every field has a default, so a file only
//! needs to name what differs.

use crate::index::EvictionPolicy;
use crate::metadata::MetadataModel;
use crate::template::{FileNameTemplate, DEFAULT_FILE_NAME_FORMAT};
use crate::{RepositoryError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Settings for a file-backed repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepositoryConfig {
    /// Root directory holding the artifacts.
    pub root: PathBuf,
    /// Group id prefixes that count as internal.
    pub domains: Vec<String>,
    /// Template for the storage path of deployed artifacts.
    pub file_name_format: String,
    /// Optional pattern applied to rendered names, replaced by its first group.
    pub file_name_regex: Option<String>,
    /// Model used for snapshot descriptors.
    pub model_version: MetadataModel,
    /// Handling of index entries whose file disappeared.
    pub eviction: EvictionPolicy,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("repository"),
            domains: Vec::new(),
            file_name_format: DEFAULT_FILE_NAME_FORMAT.to_string(),
            file_name_regex: None,
            model_version: MetadataModel::default(),
            eviction: EvictionPolicy::default(),
        }
    }
}

impl RepositoryConfig {
    /// Create a configuration for `root` with all other settings defaulted.
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self {
            root: root.into(),
            ..Default::default()
        }
    }

    /// Load configuration from a file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            RepositoryError::invalid_config(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        let config: RepositoryConfig = serde_json::from_str(&content).map_err(|e| {
            RepositoryError::invalid_config(format!("Failed to parse config: {}", e))
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a file.
    pub fn to_file(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            RepositoryError::invalid_config(format!("Failed to serialize config: {}", e))
        })?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.root.as_os_str().is_empty() {
            return Err(RepositoryError::invalid_config(
                "Repository root cannot be empty",
            ));
        }

        if self.file_name_format.is_empty() {
            return Err(RepositoryError::invalid_config(
                "File name format cannot be empty",
            ));
        }

        if let Some(domain) = self.domains.iter().find(|domain| domain.is_empty()) {
            return Err(RepositoryError::invalid_config(format!(
                "Invalid domain '{}'",
                domain
            )));
        }

        self.template()?;
        Ok(())
    }

    /// The file name template described by this configuration.
    pub fn template(&self) -> Result<FileNameTemplate> {
        let template = FileNameTemplate::new(self.file_name_format.clone());
        match &self.file_name_regex {
            Some(pattern) => template.with_rewrite(pattern),
            None => Ok(template),
        }
    }
}
