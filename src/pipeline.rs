//! Pipeline orchestration
//!
//! Each command runs to completion or fails without touching the manifest:
//! - `metadata`: build one release descriptor and write it as JSON
//! - `assemble`: discover verified builds, merge them into the manifest,
//!   prune to the retention policies, and rewrite the manifest once
//! - `prune`: apply the retention policies to a manifest on its own
//!
//! Resolved arguments and intermediate results are echoed to the audit
//! writer (stdout for the CLI).

use std::collections::BTreeMap;
use std::io::{self, Write};
use std::path::Path;

use depman_manifest::{Dependency, Manifest, ManifestError, MergeReport, PruneReport};
use serde::Serialize;
use thiserror::Error;

use crate::artifact::{check_artifact_root, find_artifacts, load_metadata, DiscoveryError};
use crate::config::{ConfigError, PipelineConfig};
use crate::source::{write_descriptor, MetadataBuilder, MetadataError, ReleaseSource};

/// Pipeline errors
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error(transparent)]
    Metadata(#[from] MetadataError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("failed to write audit output: {0}")]
    Audit(#[from] io::Error),
}

/// Result type for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;

/// What an `assemble` run found and kept
#[derive(Debug, Clone)]
pub struct AssembleReport {
    /// Release descriptors keyed by version
    pub metadata: BTreeMap<String, Dependency>,

    /// One verified descriptor per build directory
    pub discovered: Vec<Dependency>,

    pub merge: MergeReport,

    pub prune: PruneReport,

    /// The manifest as written
    pub manifest: Manifest,
}

/// Build the descriptor for one release and write it to `output`.
pub fn build_metadata<S: ReleaseSource, W: Write>(
    source: &S,
    config: &PipelineConfig,
    version: &str,
    id: &str,
    name: &str,
    output: &Path,
    out: &mut W,
) -> PipelineResult<Dependency> {
    writeln!(out, "version={}", version)?;
    writeln!(out, "id={}", id)?;
    writeln!(out, "name={}", name)?;
    writeln!(out, "output={}", output.display())?;

    let dependency = MetadataBuilder::new(source, config).build(version, id, name)?;
    let json = write_descriptor(&dependency, output)?;
    writeln!(out, "{}", json)?;

    Ok(dependency)
}

/// Merge the verified builds under `artifact_root` into the manifest at
/// `manifest_path` and prune it.
///
/// The manifest file is written exactly once, after every stage succeeded.
pub fn assemble<W: Write>(
    id: &str,
    artifact_root: &Path,
    manifest_path: &Path,
    config: &PipelineConfig,
    out: &mut W,
) -> PipelineResult<AssembleReport> {
    writeln!(out, "id={}", id)?;
    writeln!(out, "artifactPath={}", artifact_root.display())?;
    writeln!(out, "manifestPath={}", manifest_path.display())?;

    check_artifact_root(artifact_root)?;

    let metadata = load_metadata(artifact_root, config)?;
    writeln!(out, "Found metadata:")?;
    print_json(out, &metadata)?;

    let discovered = find_artifacts(artifact_root, id, &metadata, config)?;
    writeln!(out, "Found artifacts:")?;
    print_json(out, &discovered)?;

    let mut manifest = Manifest::load(manifest_path)?;
    let merge = manifest.merge(discovered.clone());
    writeln!(
        out,
        "Merged {} new dependencies ({} -> {})",
        merge.added, merge.before, merge.after
    )?;
    writeln!(out, ">>> {}", manifest_path.display())?;
    write!(out, "{}", manifest.to_toml_string()?)?;
    writeln!(out, "<<<")?;

    let prune = prune_and_report(&mut manifest, out)?;
    manifest.save(manifest_path)?;

    tracing::info!(
        %id,
        discovered = discovered.len(),
        retained = prune.retained,
        dropped = prune.dropped.len(),
        "assemble complete"
    );

    Ok(AssembleReport {
        metadata,
        discovered,
        merge,
        prune,
        manifest,
    })
}

/// Apply the retention policies of the manifest at `manifest_path` in place.
pub fn prune_file<W: Write>(manifest_path: &Path, out: &mut W) -> PipelineResult<PruneReport> {
    writeln!(out, "manifestPath={}", manifest_path.display())?;

    let mut manifest = Manifest::load(manifest_path)?;
    let report = prune_and_report(&mut manifest, out)?;
    manifest.save(manifest_path)?;
    Ok(report)
}

fn prune_and_report<W: Write>(manifest: &mut Manifest, out: &mut W) -> PipelineResult<PruneReport> {
    let report = manifest.prune()?;

    writeln!(out, "Versions to keep:")?;
    for policy in &report.policies {
        writeln!(
            out,
            "- {} {} (keep {}): {}",
            policy.id,
            policy.constraint,
            policy.patches,
            policy.versions.join(", ")
        )?;
    }
    for dropped in &report.dropped {
        writeln!(out, "Dropping {} {}", dropped.id, dropped.version)?;
    }
    writeln!(out, "Dependencies to keep:")?;
    print_json(out, manifest.dependencies())?;

    Ok(report)
}

fn print_json<W: Write, T: Serialize + ?Sized>(out: &mut W, value: &T) -> PipelineResult<()> {
    writeln!(out, "{}", serde_json::to_string(value)?)?;
    Ok(())
}
