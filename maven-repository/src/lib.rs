//! # Maven Repository Library
//!
//! Serves a directory tree of build artifacts as a Maven repository. Each
//! file is resolved to Maven coordinates from the `pom.properties` or POM it
//! embeds, or from its file name when it embeds neither.
//!
//! ## Features
//!
//! - Incremental directory scanning keyed on modification times
//! - Group, artifact and version listings with lexicographic ordering
//! - `maven-metadata.xml` generation (model 1.0.0 and 1.1.0)
//! - Template-driven storage of deployed artifacts
//! - POM lookup and synthesis, MD5/SHA checksums
//!
//! ## Example
//!
//! ```rust
//! use maven_repository::{MetadataModel, RepositoryBuilder};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let repo = RepositoryBuilder::new("/srv/maven")
//!     .domains(["com.example"])
//!     .file_name_format("$domain/$type/$exploded/$artifactId-$version.$extension")
//!     .model_version(MetadataModel::Extended)
//!     .build()?;
//!
//! assert!(repo.groups().is_empty());
//! // repo.scan()?;
//! # Ok(())
//! # }
//! ```

pub mod archive;
pub mod artifact;
pub mod config;
pub mod coordinates;
pub mod error;
pub mod hash;
pub mod index;
pub mod metadata;
pub mod properties;
pub mod query;
pub mod repository;
pub mod template;
pub mod xml;

pub use artifact::Artifact;
pub use config::RepositoryConfig;
pub use coordinates::Coordinates;
pub use error::{RepositoryError, Result};
pub use hash::HashAlgorithm;
pub use index::{ArtifactIndex, EvictionPolicy, ScanReport};
pub use metadata::{MetadataModel, SnapshotMetadata, VersionMetadata};
pub use query::{Domains, Query};
pub use repository::{Repository, RepositoryBuilder};
pub use template::{FileNameTemplate, DEFAULT_FILE_NAME_FORMAT};
