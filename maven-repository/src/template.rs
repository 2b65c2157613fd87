//! Storage paths for newly deployed artifacts.
//!
//! A template such as `$domain/$type/$exploded/$artifactId-$version.$extension`
//! recognises these tokens:
//!
//! - `$groupId`, `$artifactId`, `$version`, `$extension`
//! - `$domain`: `internal` or `external`
//! - `$type`: `snapshots` or `releases`
//! - `$exploded`: the group id with every `.` turned into a `/`

use crate::coordinates::is_snapshot_version;
use crate::Result;
use lazy_regex::regex;
use regex::{Captures, Regex};

/// Template used when none is configured.
pub const DEFAULT_FILE_NAME_FORMAT: &str = "$artifactId-$version.$extension";

/// A file name template with an optional rewrite pass.
#[derive(Debug, Clone)]
pub struct FileNameTemplate {
    format: String,
    rewrite: Option<Regex>,
}

impl FileNameTemplate {
    /// Create a template without a rewrite pass.
    pub fn new<S: Into<String>>(format: S) -> Self {
        Self {
            format: format.into(),
            rewrite: None,
        }
    }

    /// Add a rewrite pattern, applied to every rendered name with `$1` as
    /// the replacement.
    pub fn with_rewrite(mut self, pattern: &str) -> Result<Self> {
        self.rewrite = Some(Regex::new(pattern)?);
        Ok(self)
    }

    /// The raw format string.
    pub fn format(&self) -> &str {
        &self.format
    }

    /// The rewrite pattern, if any.
    pub fn rewrite(&self) -> Option<&str> {
        self.rewrite.as_ref().map(|re| re.as_str())
    }

    /// Substitute every token in the template.
    ///
    /// Values are inserted literally and never re-scanned for tokens.
    pub fn render(
        &self,
        group_id: &str,
        artifact_id: &str,
        version: &str,
        packaging: &str,
        is_internal: bool,
    ) -> String {
        let is_snapshot = is_snapshot_version(version);
        regex!(r"\$(domain|type|groupId|exploded|artifactId|version|extension)")
            .replace_all(&self.format, |caps: &Captures| match &caps[1] {
                "domain" => if is_internal { "internal" } else { "external" }.to_string(),
                "type" => if is_snapshot { "snapshots" } else { "releases" }.to_string(),
                "groupId" => group_id.to_string(),
                "exploded" => group_id.replace('.', "/"),
                "artifactId" => artifact_id.to_string(),
                "version" => version.to_string(),
                _ => packaging.to_string(),
            })
            .into_owned()
    }

    /// The relative path an artifact is stored under.
    ///
    /// Renders the template, applies the rewrite pass, and marks test
    /// artifacts with `-tests` before the final extension.
    pub fn file_name(
        &self,
        group_id: &str,
        artifact_id: &str,
        version: &str,
        packaging: &str,
        is_internal: bool,
        is_test: bool,
    ) -> String {
        let mut name = self.render(group_id, artifact_id, version, packaging, is_internal);

        if let Some(rewrite) = &self.rewrite {
            name = rewrite.replace_all(&name, "$1").into_owned();
        }

        if is_test {
            name = with_test_suffix(&name);
        }
        name
    }
}

impl Default for FileNameTemplate {
    fn default() -> Self {
        Self::new(DEFAULT_FILE_NAME_FORMAT)
    }
}

/// Insert `-tests` before the final extension of a name.
pub fn with_test_suffix(name: &str) -> String {
    regex!(r"^(.*)(\.[^.]+)$")
        .replace(name, "${1}-tests${2}")
        .into_owned()
}
