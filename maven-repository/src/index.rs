//! In-memory artifact index kept in sync with a directory tree.
//!
//! Each regular file is resolved once and then only again when its
//! modification time moves past the recorded watermark. The index performs no
//! locking of its own: [`ArtifactIndex::scan`] needs exclusive access, readers
//! work on the owned copy returned by [`ArtifactIndex::snapshot`].

use crate::{Artifact, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, info, warn};

/// What happens to index entries whose file disappeared from the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvictionPolicy {
    /// Keep serving entries for deleted files.
    #[default]
    Retain,
    /// Drop entries whose file was not seen during the latest scan.
    Prune,
}

#[derive(Debug, Clone)]
struct IndexEntry {
    artifact: Artifact,
    watermark: SystemTime,
    generation: u64,
}

/// Outcome of a single scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanReport {
    /// Files that were (re-)resolved.
    pub resolved: Vec<PathBuf>,
    /// Number of files skipped because they did not change.
    pub unchanged: usize,
    /// Files that could not be resolved, with the reason.
    pub failed: Vec<(PathBuf, String)>,
    /// Entries dropped because their file no longer exists.
    pub evicted: Vec<PathBuf>,
}

impl ScanReport {
    /// Whether every file in the tree was resolved or skipped cleanly.
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

#[derive(Default)]
struct Walk {
    seen: HashSet<PathBuf>,
    unlisted: Vec<PathBuf>,
}

/// Sorted entries of a directory.
fn list_dir(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut children: Vec<_> = fs::read_dir(dir)?
        .map(|entry| entry.map(|entry| entry.path()))
        .collect::<std::io::Result<_>>()?;
    children.sort();
    Ok(children)
}

/// Cache of resolved artifacts keyed by file path.
#[derive(Debug, Clone, Default)]
pub struct ArtifactIndex {
    entries: HashMap<PathBuf, IndexEntry>,
    eviction: EvictionPolicy,
    generation: u64,
}

impl ArtifactIndex {
    /// Create an empty index.
    pub fn new(eviction: EvictionPolicy) -> Self {
        Self {
            entries: HashMap::new(),
            eviction,
            generation: 0,
        }
    }

    /// Walk `root` depth-first and bring the index up to date.
    ///
    /// A file or subdirectory that cannot be read is reported and skipped;
    /// any entry it had keeps serving and its watermark does not move, so the
    /// next scan retries it. Only a failure to list `root` itself aborts the
    /// scan.
    pub fn scan<P: AsRef<Path>>(&mut self, root: P) -> Result<ScanReport> {
        let root = root.as_ref();
        let mut report = ScanReport::default();
        let mut walk = Walk::default();

        let children = list_dir(root)?;
        self.scan_children(children, &mut report, &mut walk);

        if self.eviction == EvictionPolicy::Prune {
            let gone: Vec<PathBuf> = self
                .entries
                .keys()
                .filter(|path| !walk.seen.contains(*path))
                .filter(|path| !walk.unlisted.iter().any(|dir| path.starts_with(dir)))
                .cloned()
                .collect();
            for path in gone {
                debug!("Evicting {}", path.display());
                self.entries.remove(&path);
                report.evicted.push(path);
            }
        }

        info!(
            "Scanned {}: {} resolved, {} unchanged, {} failed, {} evicted",
            root.display(),
            report.resolved.len(),
            report.unchanged,
            report.failed.len(),
            report.evicted.len()
        );
        Ok(report)
    }

    fn scan_children(&mut self, children: Vec<PathBuf>, report: &mut ScanReport, walk: &mut Walk) {
        for path in children {
            let metadata = match fs::metadata(&path) {
                Ok(metadata) => metadata,
                Err(e) => {
                    warn!("Unable to stat {}: {}", path.display(), e);
                    report.failed.push((path, e.to_string()));
                    continue;
                }
            };

            if metadata.is_dir() {
                match list_dir(&path) {
                    Ok(children) => self.scan_children(children, report, walk),
                    Err(e) => {
                        warn!("Unable to list {}: {}", path.display(), e);
                        walk.unlisted.push(path.clone());
                        report.failed.push((path, e.to_string()));
                    }
                }
            } else if metadata.is_file() {
                walk.seen.insert(path.clone());
                match metadata.modified() {
                    Ok(modified) => self.refresh(path, modified, report),
                    Err(e) => {
                        warn!("Unable to read mtime of {}: {}", path.display(), e);
                        report.failed.push((path, e.to_string()));
                    }
                }
            }
        }
    }

    fn refresh(&mut self, path: PathBuf, modified: SystemTime, report: &mut ScanReport) {
        let changed = match self.entries.get(&path) {
            Some(entry) => modified > entry.watermark,
            None => true,
        };
        if !changed {
            report.unchanged += 1;
            return;
        }

        match Artifact::from_path(&path) {
            Ok(artifact) => {
                debug!("Resolved {} as {}", path.display(), artifact.coordinates());
                self.generation += 1;
                self.entries.insert(
                    path.clone(),
                    IndexEntry {
                        artifact,
                        watermark: modified,
                        generation: self.generation,
                    },
                );
                report.resolved.push(path);
            }
            Err(e) => {
                warn!("Skipping {}: {}", path.display(), e);
                report.failed.push((path, e.to_string()));
            }
        }
    }

    /// Record an artifact that was just written, without waiting for a scan.
    pub fn insert(&mut self, artifact: Artifact) {
        let watermark = SystemTime::from(artifact.last_modified());
        self.generation += 1;
        self.entries.insert(
            artifact.path().to_path_buf(),
            IndexEntry {
                artifact,
                watermark,
                generation: self.generation,
            },
        );
    }

    /// Owned copy of all artifacts, most recently resolved first.
    pub fn snapshot(&self) -> Vec<Artifact> {
        let mut entries: Vec<&IndexEntry> = self.entries.values().collect();
        entries.sort_by(|a, b| b.generation.cmp(&a.generation));
        entries.into_iter().map(|entry| entry.artifact.clone()).collect()
    }

    /// Look up the artifact resolved for a path.
    pub fn get<P: AsRef<Path>>(&self, path: P) -> Option<&Artifact> {
        self.entries.get(path.as_ref()).map(|entry| &entry.artifact)
    }

    /// Number of indexed files.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been indexed.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The configured eviction policy.
    pub fn eviction(&self) -> EvictionPolicy {
        self.eviction
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use filetime::FileTime;
    use tempfile::TempDir;

    fn touch_forward(path: &Path, seconds: i64) {
        let modified = fs::metadata(path).unwrap().modified().unwrap();
        let mtime = FileTime::from_system_time(modified);
        let later = FileTime::from_unix_time(mtime.unix_seconds() + seconds, 0);
        filetime::set_file_mtime(path, later).unwrap();
    }

    fn populate(dir: &Path) {
        fs::create_dir_all(dir.join("internal/releases")).unwrap();
        fs::write(dir.join("common-1.0.jar"), b"a").unwrap();
        fs::write(dir.join("internal/releases/com.acme-widget-2.0.jar"), b"b").unwrap();
        fs::write(dir.join("internal/com.acme-widget-2.1.jar"), b"c").unwrap();
    }

    #[test]
    fn test_scan_discovers_nested_files() {
        let temp_dir = TempDir::new().unwrap();
        populate(temp_dir.path());

        let mut index = ArtifactIndex::default();
        let report = index.scan(temp_dir.path()).unwrap();

        assert_eq!(report.resolved.len(), 3);
        assert_eq!(report.unchanged, 0);
        assert!(report.is_clean());
        assert_eq!(index.len(), 3);
        assert_eq!(
            index
                .get(temp_dir.path().join("common-1.0.jar"))
                .unwrap()
                .group_id(),
            "common"
        );
    }

    #[test]
    fn test_rescan_without_changes_resolves_nothing() {
        let temp_dir = TempDir::new().unwrap();
        populate(temp_dir.path());

        let mut index = ArtifactIndex::default();
        index.scan(temp_dir.path()).unwrap();
        let report = index.scan(temp_dir.path()).unwrap();

        assert!(report.resolved.is_empty());
        assert_eq!(report.unchanged, 3);
    }

    #[test]
    fn test_rescan_after_touch_resolves_only_that_file() {
        let temp_dir = TempDir::new().unwrap();
        populate(temp_dir.path());
        let touched = temp_dir.path().join("internal/com.acme-widget-2.1.jar");

        let mut index = ArtifactIndex::default();
        index.scan(temp_dir.path()).unwrap();
        touch_forward(&touched, 10);
        let report = index.scan(temp_dir.path()).unwrap();

        assert_eq!(report.resolved, vec![touched]);
        assert_eq!(report.unchanged, 2);
    }

    #[test]
    fn test_failed_file_keeps_previous_entry() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("parent-1.pom");
        fs::write(
            &path,
            "<project><groupId>g</groupId><artifactId>parent</artifactId><version>1</version></project>",
        )
        .unwrap();

        let mut index = ArtifactIndex::default();
        index.scan(temp_dir.path()).unwrap();

        fs::write(&path, "<project>broken</project>").unwrap();
        touch_forward(&path, 10);
        let report = index.scan(temp_dir.path()).unwrap();

        assert_eq!(report.failed.len(), 1);
        assert_eq!(index.get(&path).unwrap().artifact_id(), "parent");

        // The watermark did not advance, so the file is retried.
        let report = index.scan(temp_dir.path()).unwrap();
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.unchanged, 0);
    }

    #[test]
    fn test_deleted_files_are_retained_by_default() {
        let temp_dir = TempDir::new().unwrap();
        populate(temp_dir.path());

        let mut index = ArtifactIndex::default();
        index.scan(temp_dir.path()).unwrap();
        fs::remove_file(temp_dir.path().join("common-1.0.jar")).unwrap();
        let report = index.scan(temp_dir.path()).unwrap();

        assert!(report.evicted.is_empty());
        assert_eq!(index.len(), 3);
    }

    #[test]
    fn test_deleted_files_are_pruned() {
        let temp_dir = TempDir::new().unwrap();
        populate(temp_dir.path());
        let deleted = temp_dir.path().join("common-1.0.jar");

        let mut index = ArtifactIndex::new(EvictionPolicy::Prune);
        index.scan(temp_dir.path()).unwrap();
        fs::remove_file(&deleted).unwrap();
        let report = index.scan(temp_dir.path()).unwrap();

        assert_eq!(report.evicted, vec![deleted.clone()]);
        assert_eq!(index.len(), 2);
        assert!(index.get(&deleted).is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_unlistable_directory_does_not_stop_scan() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        populate(temp_dir.path());
        let locked = temp_dir.path().join("internal/releases");

        let mut index = ArtifactIndex::new(EvictionPolicy::Prune);
        index.scan(temp_dir.path()).unwrap();

        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
        if fs::read_dir(&locked).is_ok() {
            // Permissions are not enforced for this user.
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }
        fs::write(temp_dir.path().join("zzz-9.jar"), b"e").unwrap();
        let report = index.scan(temp_dir.path());
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        let report = report.unwrap();

        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, locked);
        assert_eq!(report.resolved, vec![temp_dir.path().join("zzz-9.jar")]);
        assert!(report.evicted.is_empty());
        assert_eq!(index.len(), 4);
    }

    #[test]
    fn test_oversized_archive_entry_is_reported() {
        use crate::archive::test_support::{build_deflated_zip, inflate_declared_size};

        let temp_dir = TempDir::new().unwrap();
        populate(temp_dir.path());
        let mut jar = build_deflated_zip(
            "META-INF/maven/g/a/pom.properties",
            "groupId=g\nartifactId=a\nversion=1\n",
            true,
        );
        inflate_declared_size(&mut jar, 1 << 62);
        let bomb = temp_dir.path().join("a-1.jar");
        fs::write(&bomb, jar).unwrap();

        let mut index = ArtifactIndex::default();
        let report = index.scan(temp_dir.path()).unwrap();

        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, bomb);
        assert_eq!(report.resolved.len(), 3);
    }

    #[test]
    fn test_missing_root_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let mut index = ArtifactIndex::default();
        assert!(index.scan(temp_dir.path().join("missing")).is_err());
    }

    #[test]
    fn test_snapshot_is_detached_and_ordered() {
        let temp_dir = TempDir::new().unwrap();
        populate(temp_dir.path());

        let mut index = ArtifactIndex::default();
        index.scan(temp_dir.path()).unwrap();
        let touched = temp_dir.path().join("common-1.0.jar");
        touch_forward(&touched, 10);
        index.scan(temp_dir.path()).unwrap();

        let snapshot = index.snapshot();
        assert_eq!(snapshot.len(), 3);
        assert_eq!(snapshot[0].path(), touched.as_path());

        fs::write(temp_dir.path().join("extra-1.jar"), b"d").unwrap();
        index.scan(temp_dir.path()).unwrap();
        assert_eq!(snapshot.len(), 3);
        assert_eq!(index.snapshot().len(), 4);
    }
}
