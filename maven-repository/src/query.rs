//! Listing and lookup queries over a snapshot of the artifact index.
//!
//! All orderings are plain lexicographic string orderings, so `"10"` sorts
//! before `"2"`. Clients rely on this ordering, including for picking the
//! latest version.

use crate::Artifact;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Group id prefixes that are considered internally produced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Domains(Vec<String>);

impl Domains {
    /// Create a domain list.
    pub fn new<I, S>(domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(domains.into_iter().map(Into::into).collect())
    }

    /// Whether `group_id` is a configured domain or lies beneath one.
    pub fn is_internal(&self, group_id: &str) -> bool {
        self.0.iter().any(|domain| {
            group_id == domain
                || group_id
                    .strip_prefix(domain.as_str())
                    .is_some_and(|rest| rest.starts_with('.'))
        })
    }

    /// The configured domains, in order.
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// Whether no domains are configured.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Read-only queries over a set of artifacts.
pub struct Query<'a> {
    artifacts: &'a [Artifact],
    domains: &'a Domains,
}

impl<'a> Query<'a> {
    /// Query `artifacts`, with earlier entries taking precedence on lookups.
    pub fn new(artifacts: &'a [Artifact], domains: &'a Domains) -> Self {
        Self { artifacts, domains }
    }

    /// All distinct group ids.
    pub fn groups(&self) -> BTreeSet<String> {
        self.artifacts
            .iter()
            .map(|artifact| artifact.group_id().to_string())
            .collect()
    }

    /// All artifact ids within a group.
    pub fn artifacts(&self, group_id: &str) -> BTreeSet<String> {
        self.artifacts
            .iter()
            .filter(|artifact| artifact.group_id() == group_id)
            .map(|artifact| artifact.artifact_id().to_string())
            .collect()
    }

    /// All versions of an artifact.
    pub fn versions(&self, group_id: &str, artifact_id: &str) -> BTreeSet<String> {
        self.matching(group_id, artifact_id)
            .map(|artifact| artifact.version().to_string())
            .collect()
    }

    /// Every artifact with the given group and artifact id.
    pub fn matching<'q>(
        &'q self,
        group_id: &'q str,
        artifact_id: &'q str,
    ) -> impl Iterator<Item = &'a Artifact> + 'q {
        self.artifacts.iter().filter(move |artifact| {
            artifact.group_id() == group_id && artifact.artifact_id() == artifact_id
        })
    }

    /// Find a specific artifact.
    pub fn get(
        &self,
        group_id: &str,
        artifact_id: &str,
        version: &str,
        is_test: bool,
    ) -> Option<&'a Artifact> {
        self.artifacts.iter().find(|artifact| {
            artifact.group_id() == group_id
                && artifact.artifact_id() == artifact_id
                && artifact.version() == version
                && artifact.is_test() == is_test
        })
    }

    /// Whether a group id belongs to one of the configured domains.
    pub fn is_internal(&self, group_id: &str) -> bool {
        self.domains.is_internal(group_id)
    }

    /// The latest non-test release of every internal artifact.
    ///
    /// "Latest" is the lexicographically highest version; artifacts whose
    /// highest version only exists as a test artifact are left out.
    pub fn internal_artifacts(&self) -> Vec<&'a Artifact> {
        let mut internal = Vec::new();
        for group_id in self.groups() {
            if !self.is_internal(&group_id) {
                continue;
            }
            for artifact_id in self.artifacts(&group_id) {
                let Some(latest) = self.versions(&group_id, &artifact_id).pop_last() else {
                    continue;
                };
                if let Some(artifact) = self.get(&group_id, &artifact_id, &latest, false) {
                    internal.push(artifact);
                }
            }
        }
        internal
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Coordinates;
    use chrono::{TimeZone, Utc};
    use std::path::PathBuf;

    fn artifact(group: &str, name: &str, version: &str, is_test: bool) -> Artifact {
        Artifact::new(
            Coordinates::new(group, name, version, "jar"),
            is_test,
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            PathBuf::from(format!("{}-{}-{}.jar", group, name, version)),
        )
    }

    fn sample() -> Vec<Artifact> {
        vec![
            artifact("be.nabu.libs", "types", "2", false),
            artifact("be.nabu.libs", "types", "10", false),
            artifact("be.nabu.libs", "types", "9", false),
            artifact("be.nabu.libs", "types", "9", true),
            artifact("be.nabu", "core", "1.0", false),
            artifact("be.nabuco", "other", "1.0", false),
            artifact("org.apache", "commons", "3.1", false),
            artifact("be.nabu.libs", "testonly", "1.1", true),
            artifact("be.nabu.libs", "testonly", "1.0", false),
        ]
    }

    #[test]
    fn test_domains() {
        let domains = Domains::new(["be.nabu"]);
        assert!(domains.is_internal("be.nabu"));
        assert!(domains.is_internal("be.nabu.libs"));
        assert!(!domains.is_internal("be.nabuco"));
        assert!(!domains.is_internal("org.apache"));
        assert!(!Domains::default().is_internal("be.nabu"));
    }

    #[test]
    fn test_groups_and_artifacts_sorted() {
        let artifacts = sample();
        let domains = Domains::default();
        let query = Query::new(&artifacts, &domains);

        assert_eq!(
            query.groups().into_iter().collect::<Vec<_>>(),
            vec!["be.nabu", "be.nabu.libs", "be.nabuco", "org.apache"]
        );
        assert_eq!(
            query.artifacts("be.nabu.libs").into_iter().collect::<Vec<_>>(),
            vec!["testonly", "types"]
        );
        assert!(query.artifacts("missing").is_empty());
    }

    #[test]
    fn test_versions_are_lexicographic() {
        let artifacts = sample();
        let domains = Domains::default();
        let query = Query::new(&artifacts, &domains);

        assert_eq!(
            query.versions("be.nabu.libs", "types").into_iter().collect::<Vec<_>>(),
            vec!["10", "2", "9"]
        );
    }

    #[test]
    fn test_get() {
        let artifacts = sample();
        let domains = Domains::default();
        let query = Query::new(&artifacts, &domains);

        assert!(!query.get("be.nabu.libs", "types", "9", false).unwrap().is_test());
        assert!(query.get("be.nabu.libs", "types", "9", true).unwrap().is_test());
        assert!(query.get("be.nabu.libs", "types", "2", true).is_none());
        assert!(query.get("be.nabu.libs", "types", "11", false).is_none());
    }

    #[test]
    fn test_get_first_match_wins() {
        let mut artifacts = sample();
        let mut newer = artifact("be.nabu", "core", "1.0", false);
        newer = Artifact::new(
            newer.coordinates().clone(),
            false,
            newer.last_modified(),
            PathBuf::from("newer/core-1.0.jar"),
        );
        artifacts.insert(0, newer);
        let domains = Domains::default();
        let query = Query::new(&artifacts, &domains);

        let found = query.get("be.nabu", "core", "1.0", false).unwrap();
        assert_eq!(found.path(), PathBuf::from("newer/core-1.0.jar").as_path());
    }

    #[test]
    fn test_internal_artifacts() {
        let artifacts = sample();
        let domains = Domains::new(["be.nabu"]);
        let query = Query::new(&artifacts, &domains);

        let mut internal: Vec<String> = query
            .internal_artifacts()
            .into_iter()
            .map(|artifact| artifact.coordinates().to_string())
            .collect();
        internal.sort();

        assert_eq!(
            internal,
            vec!["be.nabu.libs:types:jar:9", "be.nabu:core:jar:1.0"]
        );
    }
}
