//! File-backed Maven repository.

use crate::config::RepositoryConfig;
use crate::index::{ArtifactIndex, EvictionPolicy, ScanReport};
use crate::metadata::{MetadataModel, SnapshotMetadata, VersionMetadata};
use crate::query::{Domains, Query};
use crate::template::FileNameTemplate;
use crate::{Artifact, Coordinates, RepositoryError, Result};
use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info, warn};

/// A Maven repository stored in a directory tree.
///
/// Reads work on the state of the most recent [`Repository::scan`] plus any
/// artifacts stored through [`Repository::create`] since. Scanning and
/// storing need `&mut self`; callers sharing a repository between threads
/// wrap it in their own lock.
#[derive(Debug, Clone)]
pub struct Repository {
    root: PathBuf,
    index: ArtifactIndex,
    domains: Domains,
    template: FileNameTemplate,
    model: MetadataModel,
}

impl Repository {
    /// Open a repository as described by a configuration.
    pub fn from_config(config: &RepositoryConfig) -> Result<Self> {
        config.validate()?;
        let mut builder = RepositoryBuilder::new(&config.root)
            .domains(config.domains.clone())
            .file_name_format(config.file_name_format.clone())
            .model_version(config.model_version)
            .eviction(config.eviction);
        if let Some(pattern) = &config.file_name_regex {
            builder = builder.file_name_regex(pattern.clone());
        }
        builder.build()
    }

    /// Root directory of the repository.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The configured internal domains.
    pub fn domains(&self) -> &Domains {
        &self.domains
    }

    /// The template used to place deployed artifacts.
    pub fn template(&self) -> &FileNameTemplate {
        &self.template
    }

    /// Model used for snapshot descriptors.
    pub fn model(&self) -> MetadataModel {
        self.model
    }

    /// The underlying index.
    pub fn index(&self) -> &ArtifactIndex {
        &self.index
    }

    /// Bring the index up to date with the directory tree.
    pub fn scan(&mut self) -> Result<ScanReport> {
        self.index.scan(&self.root)
    }

    /// Owned copy of every known artifact.
    pub fn snapshot(&self) -> Vec<Artifact> {
        self.index.snapshot()
    }

    /// All group ids, in lexicographic order.
    pub fn groups(&self) -> BTreeSet<String> {
        let artifacts = self.snapshot();
        Query::new(&artifacts, &self.domains).groups()
    }

    /// All artifact ids of a group, in lexicographic order.
    pub fn artifacts(&self, group_id: &str) -> BTreeSet<String> {
        let artifacts = self.snapshot();
        Query::new(&artifacts, &self.domains).artifacts(group_id)
    }

    /// All versions of an artifact, in lexicographic order.
    pub fn versions(&self, group_id: &str, artifact_id: &str) -> BTreeSet<String> {
        let artifacts = self.snapshot();
        Query::new(&artifacts, &self.domains).versions(group_id, artifact_id)
    }

    /// Look up one artifact. The most recently resolved match wins.
    pub fn artifact(
        &self,
        group_id: &str,
        artifact_id: &str,
        version: &str,
        is_test: bool,
    ) -> Option<Artifact> {
        let artifacts = self.snapshot();
        Query::new(&artifacts, &self.domains)
            .get(group_id, artifact_id, version, is_test)
            .cloned()
    }

    /// Whether an artifact belongs to one of the internal domains.
    pub fn is_internal(&self, artifact: &Artifact) -> bool {
        self.domains.is_internal(artifact.group_id())
    }

    /// Latest non-test version of every internal artifact.
    pub fn internal_artifacts(&self) -> Vec<Artifact> {
        let artifacts = self.snapshot();
        Query::new(&artifacts, &self.domains)
            .internal_artifacts()
            .into_iter()
            .cloned()
            .collect()
    }

    /// Version listing for an artifact, if it has any versions.
    pub fn version_metadata(&self, group_id: &str, artifact_id: &str) -> Option<VersionMetadata> {
        let artifacts = self.snapshot();
        let query = Query::new(&artifacts, &self.domains);
        VersionMetadata::from_artifacts(group_id, artifact_id, query.matching(group_id, artifact_id))
    }

    /// `maven-metadata.xml` listing the versions of an artifact.
    pub fn metadata(&self, group_id: &str, artifact_id: &str) -> Option<Vec<u8>> {
        self.version_metadata(group_id, artifact_id)
            .map(|metadata| metadata.to_bytes())
    }

    /// `maven-metadata.xml` describing one specific artifact version.
    pub fn snapshot_metadata(&self, artifact: &Artifact) -> Vec<u8> {
        SnapshotMetadata::new(artifact, self.model).to_bytes()
    }

    /// Relative storage path for an artifact with the given coordinates.
    pub fn storage_path(
        &self,
        group_id: &str,
        artifact_id: &str,
        version: &str,
        packaging: &str,
        is_test: bool,
    ) -> Result<PathBuf> {
        let name = self.template.file_name(
            group_id,
            artifact_id,
            version,
            packaging,
            self.domains.is_internal(group_id),
            is_test,
        );
        relative_path(&name)
    }

    /// Store a new artifact and make it visible to lookups right away.
    ///
    /// The location comes from the file name template. Existing files are
    /// overwritten. The returned artifact is resolved from the stored file,
    /// so its coordinates are the ones later scans will see.
    pub fn create<R: Read>(
        &mut self,
        group_id: &str,
        artifact_id: &str,
        version: &str,
        packaging: &str,
        mut content: R,
        is_test: bool,
    ) -> Result<Artifact> {
        let relative = self.storage_path(group_id, artifact_id, version, packaging, is_test)?;
        let target = self.root.join(relative);

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut file = File::create(&target)?;
        let written = io::copy(&mut content, &mut file)?;
        file.flush()?;
        drop(file);
        debug!("Wrote {} bytes to {}", written, target.display());

        let artifact = Artifact::from_path(&target)?;
        let requested = Coordinates::new(group_id, artifact_id, version, packaging);
        if artifact.coordinates() != &requested {
            warn!(
                "Stored {} resolves as {}",
                requested,
                artifact.coordinates()
            );
        }
        info!("Stored {} at {}", artifact.coordinates(), target.display());

        self.index.insert(artifact.clone());
        Ok(artifact)
    }
}

/// Turn a rendered name into a path below the repository root.
fn relative_path(name: &str) -> Result<PathBuf> {
    let mut relative = PathBuf::new();
    for component in Path::new(name).components() {
        match component {
            Component::Normal(part) => relative.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(RepositoryError::InvalidPath(name.to_string()));
            }
        }
    }

    if relative.as_os_str().is_empty() {
        return Err(RepositoryError::InvalidPath(name.to_string()));
    }
    Ok(relative)
}

/// Builder for [`Repository`].
#[derive(Debug, Clone)]
pub struct RepositoryBuilder {
    root: PathBuf,
    domains: Vec<String>,
    file_name_format: String,
    file_name_regex: Option<String>,
    model: MetadataModel,
    eviction: EvictionPolicy,
}

impl RepositoryBuilder {
    /// Create a builder for a repository rooted at `root`.
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        let defaults = RepositoryConfig::default();
        Self {
            root: root.into(),
            domains: defaults.domains,
            file_name_format: defaults.file_name_format,
            file_name_regex: defaults.file_name_regex,
            model: defaults.model_version,
            eviction: defaults.eviction,
        }
    }

    /// Set the internal domains.
    pub fn domains<I, S>(mut self, domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.domains = domains.into_iter().map(Into::into).collect();
        self
    }

    /// Set the file name template.
    pub fn file_name_format<S: Into<String>>(mut self, format: S) -> Self {
        self.file_name_format = format.into();
        self
    }

    /// Set the rewrite pattern applied to rendered file names.
    pub fn file_name_regex<S: Into<String>>(mut self, pattern: S) -> Self {
        self.file_name_regex = Some(pattern.into());
        self
    }

    /// Set the snapshot descriptor model.
    pub fn model_version(mut self, model: MetadataModel) -> Self {
        self.model = model;
        self
    }

    /// Set the eviction policy.
    pub fn eviction(mut self, eviction: EvictionPolicy) -> Self {
        self.eviction = eviction;
        self
    }

    /// Build the repository. Nothing is indexed until the first scan.
    pub fn build(self) -> Result<Repository> {
        if self.root.as_os_str().is_empty() {
            return Err(RepositoryError::invalid_config("Repository root cannot be empty"));
        }
        if self.file_name_format.is_empty() {
            return Err(RepositoryError::invalid_config("File name format cannot be empty"));
        }

        let mut template = FileNameTemplate::new(self.file_name_format);
        if let Some(pattern) = &self.file_name_regex {
            template = template.with_rewrite(pattern)?;
        }

        Ok(Repository {
            root: self.root,
            index: ArtifactIndex::new(self.eviction),
            domains: Domains::new(self.domains),
            template,
            model: self.model,
        })
    }
}
