//! Command line front end for a file-backed Maven repository.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use maven_repository::{
    coordinates, Artifact, EvictionPolicy, HashAlgorithm, MetadataModel, Repository,
    RepositoryConfig,
};
use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::PathBuf;
use tracing::{info, warn};

mod logging;

#[derive(Parser, Debug)]
#[command(name = "mvn-repo", version, about = "Serve a directory of build artifacts as a Maven repository")]
struct Args {
    /// Path to a JSON configuration file.
    #[arg(long, short = 'c', env = "MVN_REPO_CONFIG")]
    config: Option<PathBuf>,

    /// Repository root, overriding the configuration.
    #[arg(long, env = "MVN_REPO_ROOT")]
    root: Option<PathBuf>,

    /// Internal group id prefix. May be given more than once.
    #[arg(long = "domain")]
    domains: Vec<String>,

    /// Template for the storage path of deployed artifacts.
    #[arg(long)]
    file_name_format: Option<String>,

    /// Pattern applied to rendered file names, replaced by its first group.
    #[arg(long)]
    file_name_regex: Option<String>,

    /// Metadata model for snapshot descriptors (1.0.0 or 1.1.0).
    #[arg(long)]
    model_version: Option<MetadataModel>,

    /// Drop entries for files that disappeared from the tree.
    #[arg(long)]
    prune: bool,

    /// Print listings as JSON.
    #[arg(long)]
    json: bool,

    #[clap(flatten)]
    logging: logging::LoggingArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scan the repository and report what changed.
    Scan,
    /// List all group ids.
    Groups,
    /// List the artifact ids of a group.
    Artifacts { group: String },
    /// List the versions of an artifact.
    Versions { group: String, artifact: String },
    /// Print maven-metadata.xml for an artifact, or for one version of it.
    Metadata {
        group: String,
        artifact: String,
        version: Option<String>,
        /// Describe the test artifact.
        #[arg(long)]
        test: bool,
    },
    /// Print the POM of an artifact.
    Pom {
        group: String,
        artifact: String,
        version: String,
        #[arg(long)]
        test: bool,
    },
    /// Print the checksum of an artifact.
    Checksum {
        group: String,
        artifact: String,
        version: String,
        /// One of md5, sha1, sha256, sha512.
        #[arg(long, short = 'a', default_value = "sha1")]
        algorithm: HashAlgorithm,
        #[arg(long)]
        test: bool,
    },
    /// Store a file in the repository.
    Deploy {
        file: PathBuf,
        #[arg(long, short = 'g')]
        group: String,
        #[arg(long, short = 'a')]
        artifact: String,
        #[arg(long, short = 'v')]
        version: String,
        /// Packaging; defaults to the file's extension.
        #[arg(long, short = 'p')]
        packaging: Option<String>,
        #[arg(long)]
        test: bool,
    },
    /// List the latest release of every internal artifact.
    Internal,
    /// Write the effective configuration to a file.
    InitConfig { path: PathBuf },
}

impl Args {
    /// The configuration file, if any, with command line overrides applied.
    fn repository_config(&self) -> Result<RepositoryConfig> {
        let mut config = match &self.config {
            Some(path) => {
                info!("Loading configuration from {}", path.display());
                RepositoryConfig::from_file(path)?
            }
            None => RepositoryConfig::default(),
        };

        if let Some(root) = &self.root {
            config.root = root.clone();
        }
        if !self.domains.is_empty() {
            config.domains = self.domains.clone();
        }
        if let Some(format) = &self.file_name_format {
            config.file_name_format = format.clone();
        }
        if let Some(pattern) = &self.file_name_regex {
            config.file_name_regex = Some(pattern.clone());
        }
        if let Some(model) = self.model_version {
            config.model_version = model;
        }
        if self.prune {
            config.eviction = EvictionPolicy::Prune;
        }

        config.validate()?;
        Ok(config)
    }
}

fn print_names<'a, I>(names: I, json: bool) -> Result<()>
where
    I: IntoIterator<Item = &'a String>,
{
    let names: Vec<&String> = names.into_iter().collect();
    let mut out = io::stdout().lock();
    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(&names)?)?;
    } else {
        for name in names {
            writeln!(out, "{}", name)?;
        }
    }
    Ok(())
}

fn print_artifacts(artifacts: &[Artifact], json: bool) -> Result<()> {
    let mut out = io::stdout().lock();
    if json {
        let entries: Vec<serde_json::Value> = artifacts
            .iter()
            .map(|artifact| {
                serde_json::json!({
                    "coordinates": artifact.coordinates(),
                    "test": artifact.is_test(),
                    "last_modified": artifact.last_modified().to_rfc3339(),
                    "path": artifact.path(),
                })
            })
            .collect();
        writeln!(out, "{}", serde_json::to_string_pretty(&entries)?)?;
    } else {
        for artifact in artifacts {
            writeln!(out, "{}\t{}", artifact.coordinates(), artifact.path().display())?;
        }
    }
    Ok(())
}

fn find(
    repository: &Repository,
    group: &str,
    artifact: &str,
    version: &str,
    test: bool,
) -> Result<Artifact> {
    match repository.artifact(group, artifact, version, test) {
        Some(found) => Ok(found),
        None => bail!(
            "No {}artifact {}:{}:{}",
            if test { "test " } else { "" },
            group,
            artifact,
            version
        ),
    }
}

fn scanned(config: &RepositoryConfig) -> Result<Repository> {
    let mut repository = Repository::from_config(config)?;
    let report = repository
        .scan()
        .with_context(|| format!("Failed to scan {}", config.root.display()))?;
    for (path, reason) in &report.failed {
        warn!("Unresolvable: {}: {}", path.display(), reason);
    }
    Ok(repository)
}

fn run(args: Args) -> Result<()> {
    let config = args.repository_config()?;

    match &args.command {
        Command::Scan => {
            let mut repository = Repository::from_config(&config)?;
            let report = repository.scan()?;
            println!(
                "{} artifacts: {} resolved, {} unchanged, {} failed, {} evicted",
                repository.index().len(),
                report.resolved.len(),
                report.unchanged,
                report.failed.len(),
                report.evicted.len()
            );
            for (path, reason) in &report.failed {
                println!("failed\t{}\t{}", path.display(), reason);
            }
            if !report.is_clean() {
                bail!("{} files could not be resolved", report.failed.len());
            }
        }
        Command::Groups => {
            let repository = scanned(&config)?;
            print_names(&repository.groups(), args.json)?;
        }
        Command::Artifacts { group } => {
            let repository = scanned(&config)?;
            print_names(&repository.artifacts(group), args.json)?;
        }
        Command::Versions { group, artifact } => {
            let repository = scanned(&config)?;
            print_names(&repository.versions(group, artifact), args.json)?;
        }
        Command::Metadata {
            group,
            artifact,
            version,
            test,
        } => {
            let repository = scanned(&config)?;
            let document = match version {
                Some(version) => {
                    let found = find(&repository, group, artifact, version, *test)?;
                    repository.snapshot_metadata(&found)
                }
                None => match repository.metadata(group, artifact) {
                    Some(document) => document,
                    None => bail!("No versions of {}:{}", group, artifact),
                },
            };
            io::stdout().lock().write_all(&document)?;
            println!();
        }
        Command::Pom {
            group,
            artifact,
            version,
            test,
        } => {
            let repository = scanned(&config)?;
            let found = find(&repository, group, artifact, version, *test)?;
            io::stdout().lock().write_all(&found.pom()?)?;
            println!();
        }
        Command::Checksum {
            group,
            artifact,
            version,
            algorithm,
            test,
        } => {
            let repository = scanned(&config)?;
            let found = find(&repository, group, artifact, version, *test)?;
            println!("{}", found.checksum(*algorithm)?);
        }
        Command::Deploy {
            file,
            group,
            artifact,
            version,
            packaging,
            test,
        } => {
            let packaging = match packaging {
                Some(packaging) => packaging.clone(),
                None => {
                    let name = file
                        .file_name()
                        .and_then(|name| name.to_str())
                        .with_context(|| format!("Invalid file name {}", file.display()))?;
                    coordinates::extension(name).to_lowercase()
                }
            };
            let content = BufReader::new(
                File::open(file).with_context(|| format!("Failed to open {}", file.display()))?,
            );
            let mut repository = Repository::from_config(&config)?;
            let stored =
                repository.create(group, artifact, version, &packaging, content, *test)?;
            println!("{}\t{}", stored.coordinates(), stored.path().display());
        }
        Command::Internal => {
            let repository = scanned(&config)?;
            print_artifacts(&repository.internal_artifacts(), args.json)?;
        }
        Command::InitConfig { path } => {
            config.to_file(path)?;
            info!("Wrote configuration to {}", path.display());
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    args.logging.init()?;
    run(args)
}
