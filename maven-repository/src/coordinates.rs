//! Coordinate inference for artifact files.
//!
//! Coordinates are looked up in this order:
//!
//! 1. `*.pom` files are scanned textually for their own `groupId`,
//!    `artifactId` and `version`, ignoring the `<parent>` and
//!    `<dependencies>` sections.
//! 2. Archives are searched for the `pom.properties` file Maven embeds under
//!    `META-INF/maven/<group>/<artifact>/`.
//! 3. Anything else is identified from its file name alone, see
//!    [`from_file_name`].

use crate::archive::{Archive, POM_PROPERTIES_SUFFIX};
use crate::properties::Properties;
use crate::xml;
use crate::{RepositoryError, Result};
use lazy_regex::{regex, regex_captures, regex_is_match};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::{Cursor, Read, Seek};
use tracing::trace;

/// Group used for files whose name carries no group.
pub const DEFAULT_GROUP: &str = "com.example";

/// Version used for files whose name carries no version.
pub const DEFAULT_VERSION: &str = "1.0";

/// Version suffix marking an in-development release.
pub const SNAPSHOT_SUFFIX: &str = "-SNAPSHOT";

/// Packaging of a bare project descriptor.
pub const POM_PACKAGING: &str = "pom";

/// The identifying coordinates of an artifact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coordinates {
    /// Group id, e.g. `org.apache.commons`.
    pub group_id: String,
    /// Artifact id, e.g. `commons-lang3`.
    pub artifact_id: String,
    /// Version string, compared lexicographically throughout the repository.
    pub version: String,
    /// Packaging, e.g. `jar`, `war` or `pom`.
    pub packaging: String,
}

impl Coordinates {
    /// Create new coordinates.
    pub fn new<S: Into<String>>(group_id: S, artifact_id: S, version: S, packaging: S) -> Self {
        Self {
            group_id: group_id.into(),
            artifact_id: artifact_id.into(),
            version: version.into(),
            packaging: packaging.into(),
        }
    }

    /// Whether the version denotes a snapshot.
    pub fn is_snapshot(&self) -> bool {
        is_snapshot_version(&self.version)
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}",
            self.group_id, self.artifact_id, self.packaging, self.version
        )
    }
}

/// Whether a version string denotes a snapshot.
pub fn is_snapshot_version(version: &str) -> bool {
    version.ends_with(SNAPSHOT_SUFFIX)
}

/// Whether a file name denotes a test artifact (`*-tests.<ext>`).
pub fn is_test_file_name(file_name: &str) -> bool {
    regex_is_match!(r"^.*-tests\.[^.]+$", file_name)
}

/// The extension of a file name, as written.
///
/// A name without a usable extension is returned whole.
pub fn extension(file_name: &str) -> &str {
    match file_name.rfind('.') {
        Some(idx) if idx + 1 < file_name.len() => &file_name[idx + 1..],
        _ => file_name,
    }
}

/// Resolve the coordinates of an artifact from its content and file name.
///
/// A missing `pom.properties`, or content that is not an archive at all, is
/// not an error: the file name heuristics take over. Read failures and
/// malformed embedded metadata are.
pub fn resolve<R: Read + Seek>(reader: R, file_name: &str) -> Result<Coordinates> {
    let embedded = read_embedded(reader, file_name).map_err(|e| e.for_path(file_name))?;

    Ok(match embedded {
        Some(coordinates) => coordinates,
        None => {
            trace!("No embedded metadata in {}, guessing from name", file_name);
            from_file_name(file_name)
        }
    })
}

fn read_embedded<R: Read + Seek>(mut reader: R, file_name: &str) -> Result<Option<Coordinates>> {
    let packaging = extension(file_name).to_lowercase();

    if packaging == POM_PACKAGING {
        let mut content = Vec::new();
        reader.read_to_end(&mut content)?;
        let text = String::from_utf8(content)
            .map_err(|_| RepositoryError::resolution(file_name, "POM is not valid UTF-8"))?;
        return from_pom_xml(&text).map(Some);
    }

    let Some(mut archive) = Archive::open(reader)? else {
        return Ok(None);
    };
    match archive.read_entry_with_suffix(POM_PROPERTIES_SUFFIX)? {
        Some(content) => {
            let properties = Properties::parse(&String::from_utf8_lossy(&content));
            from_pom_properties(&properties, &packaging).map(Some)
        }
        None => Ok(None),
    }
}

/// Resolve coordinates from an in-memory artifact.
pub fn resolve_bytes(content: &[u8], file_name: &str) -> Result<Coordinates> {
    resolve(Cursor::new(content), file_name)
}

/// Extract the project's own coordinates from POM text.
///
/// The first `<parent>` and `<dependencies>` blocks are removed first so
/// their coordinates are not mistaken for the project's. Blank tags count as
/// missing.
pub fn from_pom_xml(xml: &str) -> Result<Coordinates> {
    let without_parent = regex!(r"(?s)<parent>.*?</parent>").replace(xml, "");
    let content = regex!(r"(?s)<dependencies>.*?</dependencies>").replace(&without_parent, "");

    let tag_value = |captured: Option<(&str, &str)>, name: &str| {
        captured
            .map(|(_, value)| xml::unescape(value.trim()).into_owned())
            .filter(|value| !value.is_empty())
            .ok_or_else(|| RepositoryError::missing_field(name))
    };

    let group_id = tag_value(regex_captures!(r"<groupId>([^<]+)", &content), "groupId")?;
    let artifact_id = tag_value(regex_captures!(r"<artifactId>([^<]+)", &content), "artifactId")?;
    let version = tag_value(regex_captures!(r"<version>([^<]+)", &content), "version")?;

    Ok(Coordinates::new(group_id, artifact_id, version, POM_PACKAGING.to_string()))
}

/// Build coordinates from an embedded `pom.properties`.
///
/// `packaging` is optional in the file; `default_packaging` applies when it
/// is absent.
pub fn from_pom_properties(properties: &Properties, default_packaging: &str) -> Result<Coordinates> {
    let field = |name: &str| {
        properties
            .get_non_empty(name)
            .ok_or_else(|| RepositoryError::missing_field(name))
    };

    Ok(Coordinates::new(
        field("groupId")?,
        field("artifactId")?,
        field("version")?,
        properties.get_non_empty("packaging").unwrap_or(default_packaging),
    ))
}

/// Guess coordinates from a file name such as `com.acme-widget-1.2.jar`.
///
/// * The group is everything up to the first `-`, or [`DEFAULT_GROUP`]
///   when the name has no such prefix.
/// * The version is the dash-free run between a `-` and the extension, or
///   [`DEFAULT_VERSION`] when there is none or it is an unexpanded `${...}`
///   property.
/// * The artifact id is what remains once both are cut off.
///
/// `__` in the group or version stands for a literal `-`.
pub fn from_file_name(file_name: &str) -> Coordinates {
    let stem = regex_captures!(r"^(.+)\.[^.]+$", file_name)
        .map(|(_, stem)| stem)
        .unwrap_or(file_name);

    let raw_group = regex_captures!(r"^([^-]+)", file_name)
        .map(|(_, group)| group)
        .filter(|group| *group != file_name);
    let raw_version = regex_captures!(r"^.*?-([^-]+)\.[^.]+$", file_name).map(|(_, version)| version);

    let group_id = raw_group
        .map(|group| group.replace("__", "-"))
        .unwrap_or_else(|| DEFAULT_GROUP.to_string());
    let version = match raw_version {
        Some(version) if !version.starts_with("${") => version.replace("__", "-"),
        _ => DEFAULT_VERSION.to_string(),
    };

    let mut artifact_id = stem;
    if let Some(version) = raw_version {
        artifact_id = artifact_id
            .strip_suffix(version)
            .and_then(|rest| rest.strip_suffix('-'))
            .unwrap_or(artifact_id);
    }
    if let Some(group) = raw_group {
        artifact_id = artifact_id
            .strip_prefix(group)
            .and_then(|rest| rest.strip_prefix('-'))
            .unwrap_or(artifact_id);
    }
    if artifact_id.is_empty() {
        artifact_id = stem;
    }

    Coordinates {
        group_id,
        artifact_id: artifact_id.to_string(),
        version,
        packaging: extension(file_name).to_lowercase(),
    }
}
