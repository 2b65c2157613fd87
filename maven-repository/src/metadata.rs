//! `maven-metadata.xml` generation.
//!
//! Two documents are produced: the version listing for a group/artifact pair
//! and the descriptor for one specific (possibly snapshot) version.

use crate::coordinates::{Coordinates, SNAPSHOT_SUFFIX};
use crate::xml::escape;
use crate::Artifact;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Format of `lastUpdated` and `updated` values.
pub const LAST_UPDATED_FORMAT: &str = "%Y%m%d%H%M%S";

/// Format of snapshot timestamps.
pub const SNAPSHOT_TIMESTAMP_FORMAT: &str = "%Y%m%d.%H%M%S";

/// Repository metadata model to emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MetadataModel {
    /// Model 1.0.0, understood by every client.
    #[default]
    #[serde(rename = "1.0.0")]
    Legacy,
    /// Model 1.1.0, which additionally lists `snapshotVersions`.
    #[serde(rename = "1.1.0")]
    Extended,
}

impl MetadataModel {
    /// The `modelVersion` attribute value.
    pub fn as_str(&self) -> &'static str {
        match self {
            MetadataModel::Legacy => "1.0.0",
            MetadataModel::Extended => "1.1.0",
        }
    }
}

impl fmt::Display for MetadataModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetadataModel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1.0.0" | "legacy" => Ok(MetadataModel::Legacy),
            "1.1.0" | "extended" => Ok(MetadataModel::Extended),
            other => Err(format!("unknown metadata model: {}", other)),
        }
    }
}

/// Version listing for one group/artifact pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionMetadata {
    /// Group id.
    pub group_id: String,
    /// Artifact id.
    pub artifact_id: String,
    /// Known versions, lexicographically ascending and without duplicates.
    pub versions: Vec<String>,
    /// Lexicographically greatest version.
    pub latest: String,
    /// Modification time of the latest artifact.
    pub last_updated: DateTime<Utc>,
}

impl VersionMetadata {
    /// Build the listing from the artifacts of one group/artifact pair.
    ///
    /// Returns `None` when there are no artifacts. On equal versions the
    /// first artifact supplies `last_updated`.
    pub fn from_artifacts<'a, I>(group_id: &str, artifact_id: &str, artifacts: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Artifact>,
    {
        let mut versions = Vec::new();
        let mut latest: Option<&Artifact> = None;

        for artifact in artifacts {
            versions.push(artifact.version().to_string());
            if latest.map_or(true, |current| artifact.version() > current.version()) {
                latest = Some(artifact);
            }
        }

        let latest = latest?;
        versions.sort();
        versions.dedup();

        Some(Self {
            group_id: group_id.to_string(),
            artifact_id: artifact_id.to_string(),
            versions,
            latest: latest.version().to_string(),
            last_updated: latest.last_modified(),
        })
    }

    /// The document as UTF-8 bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.to_string().into_bytes()
    }
}

impl fmt::Display for VersionMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "<metadata>")?;
        writeln!(f, "\t<groupId>{}</groupId>", escape(&self.group_id))?;
        writeln!(f, "\t<artifactId>{}</artifactId>", escape(&self.artifact_id))?;
        writeln!(f, "\t<version>{}</version>", escape(&self.latest))?;
        writeln!(f, "\t<versioning>")?;
        writeln!(f, "\t\t<latest>{}</latest>", escape(&self.latest))?;
        writeln!(f, "\t\t<versions>")?;
        for version in &self.versions {
            writeln!(f, "\t\t\t<version>{}</version>", escape(version))?;
        }
        writeln!(f, "\t\t</versions>")?;
        writeln!(
            f,
            "\t\t<lastUpdated>{}</lastUpdated>",
            self.last_updated.format(LAST_UPDATED_FORMAT)
        )?;
        writeln!(f, "\t</versioning>")?;
        write!(f, "</metadata>")
    }
}

/// Descriptor for one specific version of an artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotMetadata {
    /// The artifact's coordinates.
    pub coordinates: Coordinates,
    /// Modification time of the artifact.
    pub last_modified: DateTime<Utc>,
    /// Model to emit.
    pub model: MetadataModel,
}

impl SnapshotMetadata {
    /// Describe an artifact.
    pub fn new(artifact: &Artifact, model: MetadataModel) -> Self {
        Self {
            coordinates: artifact.coordinates().clone(),
            last_modified: artifact.last_modified(),
            model,
        }
    }

    /// Build number of a snapshot: its modification time in epoch seconds.
    pub fn build_number(&self) -> i64 {
        self.last_modified.timestamp()
    }

    /// Snapshot timestamp, `yyyyMMdd.HHmmss`.
    pub fn timestamp(&self) -> String {
        self.last_modified.format(SNAPSHOT_TIMESTAMP_FORMAT).to_string()
    }

    /// The version as it appears in a deployed snapshot's file name,
    /// e.g. `1.0-20240101.120000-1704110400` for `1.0-SNAPSHOT`.
    ///
    /// Versions that are not snapshots are returned unchanged.
    pub fn snapshot_value(&self) -> String {
        match self.coordinates.version.strip_suffix(SNAPSHOT_SUFFIX) {
            Some(base) => format!("{}-{}-{}", base, self.timestamp(), self.build_number()),
            None => self.coordinates.version.clone(),
        }
    }

    /// The document as UTF-8 bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.to_string().into_bytes()
    }
}

impl fmt::Display for SnapshotMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "<metadata modelVersion=\"{}\">", self.model)?;
        writeln!(f, "\t<groupId>{}</groupId>", escape(&self.coordinates.group_id))?;
        writeln!(f, "\t<artifactId>{}</artifactId>", escape(&self.coordinates.artifact_id))?;
        writeln!(f, "\t<version>{}</version>", escape(&self.coordinates.version))?;

        if self.coordinates.is_snapshot() {
            let last_updated = self.last_modified.format(LAST_UPDATED_FORMAT);
            writeln!(f, "\t<versioning>")?;
            writeln!(f, "\t\t<snapshot>")?;
            writeln!(f, "\t\t\t<timestamp>{}</timestamp>", self.timestamp())?;
            writeln!(f, "\t\t\t<buildNumber>{}</buildNumber>", self.build_number())?;
            writeln!(f, "\t\t</snapshot>")?;
            writeln!(f, "\t\t<lastUpdated>{}</lastUpdated>", last_updated)?;

            if self.model == MetadataModel::Extended {
                writeln!(f, "\t\t<snapshotVersions>")?;
                writeln!(f, "\t\t\t<snapshotVersion>")?;
                writeln!(
                    f,
                    "\t\t\t\t<extension>{}</extension>",
                    escape(&self.coordinates.packaging)
                )?;
                writeln!(f, "\t\t\t\t<value>{}</value>", escape(&self.snapshot_value()))?;
                writeln!(f, "\t\t\t\t<updated>{}</updated>", last_updated)?;
                writeln!(f, "\t\t\t</snapshotVersion>")?;
                writeln!(f, "\t\t</snapshotVersions>")?;
            }

            writeln!(f, "\t</versioning>")?;
        }

        write!(f, "</metadata>")
    }
}
