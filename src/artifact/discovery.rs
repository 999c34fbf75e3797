//! Artifact discovery
//!
//! The artifact root holds one metadata descriptor per release
//! (`metadata-<version>.json`) and one directory per completed build
//! (`<id>-*`). Each build directory must contain the tarball, a checksum
//! sidecar, and the build target record. A build is accepted only if its
//! tarball hashes to what the sidecar claims.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use depman_manifest::Dependency;
use globset::{Glob, GlobMatcher};

use super::build_record::BuildRecord;
use super::checksum::{matches_sidecar, sha256_file};
use crate::config::PipelineConfig;

/// Errors raised while discovering built artifacts
#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    #[error("directory {0} does not exist")]
    MissingRoot(PathBuf),

    #[error("directory {0} is empty")]
    EmptyRoot(PathBuf),

    #[error("no metadata files found: {0}")]
    NoMetadata(String),

    #[error("metadata file name {0} carries no version")]
    UnversionedMetadata(String),

    #[error("failed to parse metadata file {path}: {source}")]
    Metadata {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("no compiled artifact folders found: {0}")]
    NoArtifacts(String),

    #[error("{dir}: no {kind} found")]
    MissingFile { dir: PathBuf, kind: &'static str },

    #[error("{dir}: more than one {kind} found")]
    DuplicateFile { dir: PathBuf, kind: &'static str },

    #[error("failed to parse build record {path}: {source}")]
    BuildRecord {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{dir}: no metadata for version {version}")]
    UnknownVersion { dir: PathBuf, version: String },

    #[error("{dir}: SHA256 does not match (expected {expected}, calculated {calculated})")]
    ChecksumMismatch {
        dir: PathBuf,
        expected: String,
        calculated: String,
    },

    #[error("invalid glob pattern: {0}")]
    Pattern(#[from] globset::Error),

    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> DiscoveryError + '_ {
    move |source| DiscoveryError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Fail unless `root` exists and has at least one entry.
pub fn check_artifact_root(root: &Path) -> Result<(), DiscoveryError> {
    if !root.is_dir() {
        return Err(DiscoveryError::MissingRoot(root.to_path_buf()));
    }
    let mut entries = fs::read_dir(root).map_err(io_error(root))?;
    if entries.next().is_none() {
        return Err(DiscoveryError::EmptyRoot(root.to_path_buf()));
    }
    Ok(())
}

/// Load the per-release metadata descriptors, keyed by version.
///
/// A match may be the JSON file itself or a directory of the same name
/// holding it (the layout CI artifact downloads produce).
pub fn load_metadata(
    root: &Path,
    config: &PipelineConfig,
) -> Result<BTreeMap<String, Dependency>, DiscoveryError> {
    let matches = matching_entries(root, &config.metadata_pattern)?;
    if matches.is_empty() {
        return Err(DiscoveryError::NoMetadata(
            root.join(&config.metadata_pattern).display().to_string(),
        ));
    }

    let mut metadata = BTreeMap::new();
    for path in matches {
        let file_name = file_name(&path);
        let version = config
            .metadata_version(&file_name)
            .ok_or_else(|| DiscoveryError::UnversionedMetadata(file_name.clone()))?
            .to_string();

        let file = if path.is_dir() {
            path.join(&file_name)
        } else {
            path.clone()
        };
        let contents = fs::read_to_string(&file).map_err(io_error(&file))?;
        let dependency: Dependency = serde_json::from_str(&contents)
            .map_err(|source| DiscoveryError::Metadata { path: file.clone(), source })?;

        tracing::info!(file = %file_name, %version, "found metadata");
        metadata.insert(version, dependency);
    }

    Ok(metadata)
}

/// Verify every `<id>-*` build directory and produce its descriptor.
///
/// Directories are visited in name order. The first failure aborts discovery.
pub fn find_artifacts(
    root: &Path,
    id: &str,
    metadata: &BTreeMap<String, Dependency>,
    config: &PipelineConfig,
) -> Result<Vec<Dependency>, DiscoveryError> {
    let pattern = format!("{}-*", escape_glob(id));
    let dirs: Vec<PathBuf> = matching_entries(root, &pattern)?
        .into_iter()
        .filter(|p| p.is_dir())
        .collect();
    if dirs.is_empty() {
        return Err(DiscoveryError::NoArtifacts(
            root.join(&pattern).display().to_string(),
        ));
    }

    dirs.iter()
        .map(|dir| inspect_build_dir(dir, metadata, config))
        .collect()
}

/// Files of interest found in one build directory
#[derive(Default)]
struct BuildFiles {
    tarball: Option<PathBuf>,
    expected_sha256: Option<String>,
    record: Option<BuildRecord>,
}

fn inspect_build_dir(
    dir: &Path,
    metadata: &BTreeMap<String, Dependency>,
    config: &PipelineConfig,
) -> Result<Dependency, DiscoveryError> {
    tracing::debug!(dir = %dir.display(), "inspecting build directory");

    let mut files = BuildFiles::default();
    for path in sorted_entries(dir)? {
        if !path.is_file() {
            continue;
        }
        let name = file_name(&path);

        if name.ends_with(&config.tarball_suffix) {
            if files.tarball.replace(path).is_some() {
                return Err(duplicate(dir, "tarball"));
            }
            continue;
        }

        if BuildRecord::is_record(&path, &config.build_record_file) {
            let contents = fs::read_to_string(&path).map_err(io_error(&path))?;
            let record = BuildRecord::from_json(&contents)
                .map_err(|source| DiscoveryError::BuildRecord { path: path.clone(), source })?;
            if files.record.replace(record).is_some() {
                return Err(duplicate(dir, "build record"));
            }
        } else if name.ends_with(&config.checksum_suffix) {
            let contents = fs::read_to_string(&path).map_err(io_error(&path))?;
            if files.expected_sha256.replace(contents.trim().to_string()).is_some() {
                return Err(duplicate(dir, "checksum file"));
            }
        }
    }

    let tarball = files.tarball.ok_or_else(|| missing(dir, "tarball"))?;
    let record = files.record.ok_or_else(|| missing(dir, "build record"))?;
    let expected = files
        .expected_sha256
        .ok_or_else(|| missing(dir, "checksum file"))?;

    let mut artifact = metadata
        .get(&record.version)
        .cloned()
        .ok_or_else(|| DiscoveryError::UnknownVersion {
            dir: dir.to_path_buf(),
            version: record.version.clone(),
        })?;

    let calculated = sha256_file(&tarball).map_err(io_error(&tarball))?;
    if !matches_sidecar(&expected, &calculated) {
        tracing::error!(
            dir = %dir.display(),
            %expected,
            %calculated,
            "checksum mismatch"
        );
        return Err(DiscoveryError::ChecksumMismatch {
            dir: dir.to_path_buf(),
            expected,
            calculated,
        });
    }

    // TODO: recover the published download location once the build jobs record it.
    artifact.uri = Some(config.unresolved_uri.clone());
    artifact.stacks = record.stacks;
    artifact.sha256 = Some(calculated);

    tracing::info!(
        dir = %dir.display(),
        version = %artifact.version,
        stacks = artifact.stacks.len(),
        "verified artifact"
    );
    Ok(artifact)
}

fn missing(dir: &Path, kind: &'static str) -> DiscoveryError {
    DiscoveryError::MissingFile {
        dir: dir.to_path_buf(),
        kind,
    }
}

fn duplicate(dir: &Path, kind: &'static str) -> DiscoveryError {
    DiscoveryError::DuplicateFile {
        dir: dir.to_path_buf(),
        kind,
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>, DiscoveryError> {
    let mut paths = fs::read_dir(dir)
        .map_err(io_error(dir))?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<Vec<_>, _>>()
        .map_err(io_error(dir))?;
    paths.sort();
    Ok(paths)
}

/// Direct children of `root` whose names match `pattern`, sorted by name.
fn matching_entries(root: &Path, pattern: &str) -> Result<Vec<PathBuf>, DiscoveryError> {
    let matcher: GlobMatcher = Glob::new(pattern)?.compile_matcher();
    Ok(sorted_entries(root)?
        .into_iter()
        .filter(|p| p.file_name().map_or(false, |name| matcher.is_match(name)))
        .collect())
}

fn escape_glob(literal: &str) -> String {
    let mut escaped = String::with_capacity(literal.len());
    for c in literal.chars() {
        match c {
            '*' | '?' | '[' | ']' | '{' | '}' => {
                escaped.push('[');
                escaped.push(c);
                escaped.push(']');
            }
            _ => escaped.push(c),
        }
    }
    escaped
}
