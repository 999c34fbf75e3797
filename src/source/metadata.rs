//! Artifact metadata builder
//!
//! Turns a release version into a dependency descriptor: downloads the
//! upstream archive once, fingerprints it, derives the package URL and CPE,
//! and scans the unpacked sources for licenses. All scratch files are
//! removed when the build returns, successfully or not.

use std::fs::{self, File};
use std::io::{self, BufReader, Write};
use std::path::Path;

use depman_manifest::Dependency;
use tempfile::{NamedTempFile, TempDir};

use super::archive::{extract_tar_gz, ArchiveError};
use super::fetch::{FetchError, ReleaseSource};
use super::license::{scan_licenses, LicenseError};
use super::purl::generate_purl;
use crate::artifact::sha256_file;
use crate::config::PipelineConfig;

/// Errors raised while building release metadata
#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Archive(#[from] ArchiveError),

    #[error("failed to detect licenses: {0}")]
    License(#[from] LicenseError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("cannot marshal: {0}")]
    Json(#[from] serde_json::Error),
}

/// Builds dependency descriptors for upstream releases
pub struct MetadataBuilder<'a, S: ReleaseSource> {
    source: &'a S,
    config: &'a PipelineConfig,
}

impl<'a, S: ReleaseSource> MetadataBuilder<'a, S> {
    pub fn new(source: &'a S, config: &'a PipelineConfig) -> Self {
        Self { source, config }
    }

    /// Build the descriptor for `id` at `version`.
    pub fn build(&self, version: &str, id: &str, name: &str) -> Result<Dependency, MetadataError> {
        let source_url = self.config.source_url(version);

        let mut download = NamedTempFile::new()?;
        let bytes = self.source.fetch(&source_url, download.as_file_mut())?;
        download.as_file_mut().flush()?;

        let source_sha256 = sha256_file(download.path())?;
        tracing::info!(%source_url, bytes, sha256 = %source_sha256, "fingerprinted release archive");

        let scratch = TempDir::new()?;
        // A fresh handle starts reading at offset zero.
        let archive = download.reopen()?;
        extract_tar_gz(
            BufReader::new(archive),
            scratch.path(),
            self.config.strip_components,
        )?;
        let licenses = scan_licenses(scratch.path())?;

        Ok(Dependency {
            id: id.to_string(),
            name: Some(name.to_string()),
            version: version.to_string(),
            cpe: Some(self.config.cpe(id, version)),
            purl: Some(generate_purl(id, version, &source_sha256, &source_url)),
            source: Some(source_url),
            source_sha256: Some(source_sha256),
            licenses,
            ..Default::default()
        })
    }
}

/// Write `dependency` as compact JSON to `output`, returning the JSON.
pub fn write_descriptor(dependency: &Dependency, output: &Path) -> Result<String, MetadataError> {
    let json = serde_json::to_string(dependency)?;
    let mut file = File::create(output)?;
    file.write_all(json.as_bytes())?;
    Ok(json)
}

/// Read a descriptor previously written by [`write_descriptor`].
pub fn read_descriptor(path: &Path) -> Result<Dependency, MetadataError> {
    let json = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&json)?)
}
