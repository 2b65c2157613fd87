use filetime::FileTime;
use maven_repository::*;
use std::fs;
use std::io::{Cursor, Write};
use std::path::Path;
use tempfile::TempDir;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

fn jar(group: &str, artifact: &str, version: &str) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    writer
        .start_file(
            format!("META-INF/maven/{}/{}/pom.properties", group, artifact),
            SimpleFileOptions::default(),
        )
        .unwrap();
    write!(
        writer,
        "#Generated by Maven\ngroupId={}\nartifactId={}\nversion={}\n",
        group, artifact, version
    )
    .unwrap();
    writer
        .start_file("com/example/Main.class", SimpleFileOptions::default())
        .unwrap();
    writer.write_all(b"\xca\xfe\xba\xbe").unwrap();
    writer.finish().unwrap().into_inner()
}

fn set_mtime(path: &Path, seconds: i64) {
    filetime::set_file_mtime(path, FileTime::from_unix_time(seconds, 0)).unwrap();
}

#[test]
fn test_deploy_then_serve() {
    let temp_dir = TempDir::new().unwrap();
    let mut repo = RepositoryBuilder::new(temp_dir.path())
        .domains(["be.nabu"])
        .file_name_format("$domain/$type/$exploded/$artifactId-$version.$extension")
        .build()
        .unwrap();

    let content = jar("be.nabu.libs", "types", "1.0");
    let stored = repo
        .create("be.nabu.libs", "types", "1.0", "jar", content.as_slice(), false)
        .unwrap();
    assert_eq!(
        stored.path(),
        temp_dir.path().join("internal/releases/be/nabu/libs/types-1.0.jar")
    );

    // A fresh repository over the same tree finds the same artifact.
    let mut reopened = RepositoryBuilder::new(temp_dir.path())
        .domains(["be.nabu"])
        .build()
        .unwrap();
    let report = reopened.scan().unwrap();
    assert_eq!(report.resolved.len(), 1);

    let found = reopened.artifact("be.nabu.libs", "types", "1.0", false).unwrap();
    assert_eq!(found.coordinates(), stored.coordinates());
    assert_eq!(found.read_content().unwrap(), content);
    assert!(reopened.is_internal(&found));
    assert_eq!(
        found.checksum(HashAlgorithm::Sha1).unwrap(),
        hash::hash_data(&content, HashAlgorithm::Sha1)
    );
}

#[test]
fn test_mixed_tree_resolution() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    fs::create_dir_all(root.join("nested/deeper")).unwrap();
    fs::write(root.join("common-1.0.jar"), b"plain bytes").unwrap();
    fs::write(root.join("nested/plainname.jar"), b"plain bytes").unwrap();
    fs::write(
        root.join("nested/deeper/renamed.jar"),
        jar("org.apache.commons", "commons-lang3", "3.12.0"),
    )
    .unwrap();
    fs::write(
        root.join("nested/parent-2.pom"),
        "<project>\n\t<parent><groupId>org.parent</groupId><artifactId>p</artifactId><version>9</version></parent>\n\t<groupId>org.child</groupId>\n\t<artifactId>child</artifactId>\n\t<version>2</version>\n</project>",
    )
    .unwrap();

    let mut repo = RepositoryBuilder::new(root).build().unwrap();
    let report = repo.scan().unwrap();
    assert!(report.is_clean());
    assert_eq!(report.resolved.len(), 4);

    assert_eq!(
        repo.groups().into_iter().collect::<Vec<_>>(),
        vec!["com.example", "common", "org.apache.commons", "org.child"]
    );
    assert!(repo.artifact("common", "common", "1.0", false).is_some());
    assert!(repo.artifact("com.example", "plainname", "1.0", false).is_some());
    assert!(repo
        .artifact("org.apache.commons", "commons-lang3", "3.12.0", false)
        .is_some());

    let pom = repo.artifact("org.child", "child", "2", false).unwrap();
    assert_eq!(pom.packaging(), "pom");
}

#[test]
fn test_lexicographic_latest() {
    let temp_dir = TempDir::new().unwrap();
    let mut repo = RepositoryBuilder::new(temp_dir.path())
        .domains(["be.nabu"])
        .build()
        .unwrap();

    for version in ["2", "10", "9"] {
        let path = temp_dir.path().join(format!("types-{}.jar", version));
        fs::write(&path, jar("be.nabu.libs", "types", version)).unwrap();
    }
    set_mtime(&temp_dir.path().join("types-9.jar"), 1_704_110_400);
    repo.scan().unwrap();

    let metadata = String::from_utf8(repo.metadata("be.nabu.libs", "types").unwrap()).unwrap();
    assert!(metadata.contains("<version>9</version>\n\t<versioning>"));
    assert!(metadata.contains("<latest>9</latest>"));
    assert!(metadata.contains("<lastUpdated>20240101120000</lastUpdated>"));

    let internal = repo.internal_artifacts();
    assert_eq!(internal.len(), 1);
    assert_eq!(internal[0].version(), "9");
}

#[test]
fn test_snapshot_descriptor() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("widget-1.0-SNAPSHOT.jar");
    fs::write(&path, jar("com.acme", "widget", "1.0-SNAPSHOT")).unwrap();
    set_mtime(&path, 1_704_110_400);

    let mut repo = RepositoryBuilder::new(temp_dir.path())
        .model_version(MetadataModel::Extended)
        .build()
        .unwrap();
    repo.scan().unwrap();

    let artifact = repo
        .artifact("com.acme", "widget", "1.0-SNAPSHOT", false)
        .unwrap();
    assert!(artifact.is_snapshot());

    let descriptor = String::from_utf8(repo.snapshot_metadata(&artifact)).unwrap();
    assert!(descriptor.starts_with("<metadata modelVersion=\"1.1.0\">"));
    assert!(descriptor.contains("<timestamp>20240101.120000</timestamp>"));
    assert!(descriptor.contains("<buildNumber>1704110400</buildNumber>"));
    assert!(descriptor.contains("<value>1.0-20240101.120000-1704110400</value>"));
}

#[test]
fn test_incremental_rescan() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    for (name, version) in [("a-1.jar", "1"), ("b-1.jar", "1"), ("c-1.jar", "1")] {
        fs::write(root.join(name), jar("org.example", &name[..1], version)).unwrap();
        set_mtime(&root.join(name), 1_700_000_000);
    }

    let mut repo = RepositoryBuilder::new(root).build().unwrap();
    assert_eq!(repo.scan().unwrap().resolved.len(), 3);

    let report = repo.scan().unwrap();
    assert!(report.resolved.is_empty());
    assert_eq!(report.unchanged, 3);

    fs::write(root.join("b-1.jar"), jar("org.example", "b", "1.1")).unwrap();
    set_mtime(&root.join("b-1.jar"), 1_700_000_100);
    let report = repo.scan().unwrap();
    assert_eq!(report.resolved, vec![root.join("b-1.jar")]);
    assert!(repo.artifact("org.example", "b", "1.1", false).is_some());
}

#[test]
fn test_test_artifacts_are_separate() {
    let temp_dir = TempDir::new().unwrap();
    let mut repo = RepositoryBuilder::new(temp_dir.path()).build().unwrap();

    let main = repo
        .create("com.acme", "widget", "2.0", "jar", jar("com.acme", "widget", "2.0").as_slice(), false)
        .unwrap();
    let test = repo
        .create("com.acme", "widget", "2.0", "jar", jar("com.acme", "widget", "2.0").as_slice(), true)
        .unwrap();

    assert_eq!(test.path(), temp_dir.path().join("widget-2.0-tests.jar"));
    assert!(test.is_test());
    assert!(!main.is_test());
    assert_eq!(repo.artifact("com.acme", "widget", "2.0", true), Some(test));
    assert_eq!(repo.artifact("com.acme", "widget", "2.0", false), Some(main));
}

#[test]
fn test_configuration_drives_repository() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("repository.json");

    let mut config = RepositoryConfig::new(temp_dir.path().join("repo"));
    config.file_name_format = "$groupId/$artifactId-$version.$extension".to_string();
    config.file_name_regex = Some("^(.*)-SNAPSHOT".to_string());
    config.to_file(&config_path).unwrap();

    let config = RepositoryConfig::from_file(&config_path).unwrap();
    let mut repo = Repository::from_config(&config).unwrap();
    let stored = repo
        .create(
            "com.acme",
            "widget",
            "1.0-SNAPSHOT",
            "jar",
            jar("com.acme", "widget", "1.0-SNAPSHOT").as_slice(),
            false,
        )
        .unwrap();

    assert_eq!(
        stored.path(),
        temp_dir.path().join("repo/com.acme/widget-1.0.jar")
    );
    assert_eq!(stored.version(), "1.0-SNAPSHOT");
}
