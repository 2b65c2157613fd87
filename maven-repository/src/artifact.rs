//! Artifacts backed by files in the repository tree.

use crate::archive::{Archive, POM_XML_SUFFIX};
use crate::coordinates::{self, Coordinates, POM_PACKAGING};
use crate::hash::{self, HashAlgorithm};
use crate::xml::escape;
use crate::{RepositoryError, Result};
use chrono::{DateTime, Utc};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

const POM_NAMESPACE: &str = "http://maven.apache.org/POM/4.0.0";
const POM_SCHEMA_LOCATION: &str =
    "http://maven.apache.org/POM/4.0.0 http://maven.apache.org/maven-v4_0_0.xsd";

/// A resolved artifact.
///
/// All identifying fields are fixed at resolution time; the payload itself is
/// only read on demand through [`Artifact::open`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    coordinates: Coordinates,
    is_test: bool,
    last_modified: DateTime<Utc>,
    path: PathBuf,
}

impl Artifact {
    /// Resolve the artifact stored at `path`.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| RepositoryError::resolution(path, "file name is not valid UTF-8"))?;

        let file = File::open(path)?;
        let modified = file.metadata()?.modified()?;
        let coordinates = coordinates::resolve(BufReader::new(file), file_name)?;

        Ok(Self {
            is_test: coordinates::is_test_file_name(file_name),
            coordinates,
            last_modified: DateTime::<Utc>::from(modified),
            path: path.to_path_buf(),
        })
    }

    /// Create an artifact from already known parts.
    pub fn new(
        coordinates: Coordinates,
        is_test: bool,
        last_modified: DateTime<Utc>,
        path: PathBuf,
    ) -> Self {
        Self {
            coordinates,
            is_test,
            last_modified,
            path,
        }
    }

    /// The artifact's coordinates.
    pub fn coordinates(&self) -> &Coordinates {
        &self.coordinates
    }

    /// Group id.
    pub fn group_id(&self) -> &str {
        &self.coordinates.group_id
    }

    /// Artifact id.
    pub fn artifact_id(&self) -> &str {
        &self.coordinates.artifact_id
    }

    /// Version.
    pub fn version(&self) -> &str {
        &self.coordinates.version
    }

    /// Packaging, e.g. jar, war, ear, pom.
    pub fn packaging(&self) -> &str {
        &self.coordinates.packaging
    }

    /// Whether this is a test artifact.
    pub fn is_test(&self) -> bool {
        self.is_test
    }

    /// Whether the version is a snapshot.
    pub fn is_snapshot(&self) -> bool {
        self.coordinates.is_snapshot()
    }

    /// Modification time of the backing file when the artifact was resolved.
    pub fn last_modified(&self) -> DateTime<Utc> {
        self.last_modified
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Open the artifact's payload.
    pub fn open(&self) -> Result<File> {
        Ok(File::open(&self.path)?)
    }

    /// Read the artifact's payload into memory.
    pub fn read_content(&self) -> Result<Vec<u8>> {
        let mut content = Vec::new();
        self.open()?.read_to_end(&mut content)?;
        Ok(content)
    }

    /// The project descriptor for this artifact.
    ///
    /// This is the file itself for `pom` packaging, the `pom.xml` embedded in
    /// an archive, or a generated minimal POM when neither exists.
    pub fn pom(&self) -> Result<Vec<u8>> {
        if self.packaging().eq_ignore_ascii_case(POM_PACKAGING) {
            return self.read_content();
        }

        if let Some(mut archive) = Archive::open(BufReader::new(self.open()?))? {
            if let Some(pom) = archive.read_entry_with_suffix(POM_XML_SUFFIX)? {
                return Ok(pom);
            }
        }

        Ok(self.generated_pom().into_bytes())
    }

    /// A minimal POM describing this artifact.
    pub fn generated_pom(&self) -> String {
        let mut pom = format!(
            "<project xmlns=\"{ns}\" xmlns:xsi=\"http://www.w3.org/2001/XMLSchema-instance\" xsi:schemaLocation=\"{loc}\">\n",
            ns = POM_NAMESPACE,
            loc = POM_SCHEMA_LOCATION
        );
        pom.push_str("\t<modelVersion>4.0.0</modelVersion>\n");
        let artifact_id = escape(self.artifact_id());
        pom.push_str(&format!("\t<groupId>{}</groupId>\n", escape(self.group_id())));
        pom.push_str(&format!("\t<artifactId>{}</artifactId>\n", artifact_id));
        pom.push_str(&format!("\t<packaging>{}</packaging>\n", escape(self.packaging())));
        pom.push_str(&format!("\t<version>{}</version>\n", escape(self.version())));
        pom.push_str(&format!("\t<name>{}</name>\n", artifact_id));
        pom.push_str("\t<url>http://maven.apache.org</url>\n");
        pom.push_str("</project>");
        pom
    }

    /// Checksum of the payload as lower-case hex.
    pub fn checksum(&self, algorithm: HashAlgorithm) -> Result<String> {
        hash::hash_reader(BufReader::new(self.open()?), algorithm)
    }
}
