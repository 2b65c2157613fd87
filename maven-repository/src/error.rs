//! Error types for the Maven repository library.

use std::path::PathBuf;

/// Result type for repository operations.
pub type Result<T> = std::result::Result<T, RepositoryError>;

/// Errors that can occur when working with a Maven repository.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// I/O error occurred during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The artifact looked like an archive but could not be read.
    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// Coordinates could not be resolved for a file.
    #[error("Failed to resolve {}: {message}", path.display())]
    Resolution {
        /// Path (or file name) of the artifact being resolved.
        path: PathBuf,
        /// What went wrong.
        message: String,
    },

    /// An archive entry is too large to be read into memory.
    #[error("Archive entry {name} is too large ({size} bytes)")]
    EntryTooLarge {
        /// Name of the entry.
        name: String,
        /// Declared or actual uncompressed size.
        size: u64,
    },

    /// Missing required field in embedded metadata.
    #[error("Missing required field: {0}")]
    MissingField(String),

    /// Invalid repository configuration.
    #[error("Invalid repository configuration: {0}")]
    InvalidConfiguration(String),

    /// The file name rewrite pattern does not compile.
    #[error("Invalid file name pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// A rendered storage path escapes the repository root.
    #[error("Invalid storage path: {0}")]
    InvalidPath(String),
}

impl RepositoryError {
    /// Create a new resolution error.
    pub fn resolution<P: Into<PathBuf>, S: Into<String>>(path: P, message: S) -> Self {
        Self::Resolution {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a new missing field error.
    pub fn missing_field<S: Into<String>>(field: S) -> Self {
        Self::MissingField(field.into())
    }

    /// Create a new oversized entry error.
    pub fn entry_too_large<S: Into<String>>(name: S, size: u64) -> Self {
        Self::EntryTooLarge {
            name: name.into(),
            size,
        }
    }

    /// Create a new invalid configuration error.
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        Self::InvalidConfiguration(msg.into())
    }

    /// Attach the file name to an error raised while resolving it.
    ///
    /// Errors that already carry a path are returned unchanged.
    pub fn for_path<P: Into<PathBuf>>(self, path: P) -> Self {
        match self {
            Self::Resolution { .. } => self,
            Self::MissingField(field) => {
                Self::resolution(path, format!("missing required field {}", field))
            }
            other => Self::resolution(path, other.to_string()),
        }
    }
}
