//! The persisted manifest document.
//!
//! Only `metadata.dependencies` and `metadata.dependency-constraints` are
//! interpreted; every other key is carried through load and save untouched.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::prune::{prune, PruneReport};
use crate::{Constraint, Dependency, ManifestError};

/// A dependency manifest (e.g. `buildpack.toml`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    /// Keys outside `[metadata]`
    #[serde(flatten)]
    pub extra: toml::Table,

    #[serde(default)]
    pub metadata: Metadata,
}

/// The `[metadata]` table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    /// Other `[metadata]` keys
    #[serde(flatten)]
    pub extra: toml::Table,

    #[serde(default)]
    pub dependencies: Vec<Dependency>,

    /// Retention policies
    #[serde(default, rename = "dependency-constraints")]
    pub constraints: Vec<Constraint>,
}

/// Counts recorded by [`Manifest::merge`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeReport {
    pub before: usize,
    pub added: usize,
    pub after: usize,
}

impl Manifest {
    /// Load a manifest from disk.
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let content = fs::read_to_string(path).map_err(|source| ManifestError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content)
    }

    /// Parse a manifest from a TOML string.
    pub fn parse(content: &str) -> Result<Self, ManifestError> {
        Ok(toml::from_str(content)?)
    }

    /// Serialize to TOML.
    pub fn to_toml_string(&self) -> Result<String, ManifestError> {
        Ok(toml::to_string(self)?)
    }

    /// Overwrite `path` with this manifest.
    ///
    /// The file is truncated and rewritten in one call; a crash mid-write can
    /// leave it incomplete.
    pub fn save(&self, path: &Path) -> Result<(), ManifestError> {
        let content = self.to_toml_string()?;
        fs::write(path, content).map_err(|source| ManifestError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::info!(
            path = %path.display(),
            dependencies = self.metadata.dependencies.len(),
            "manifest written"
        );
        Ok(())
    }

    pub fn dependencies(&self) -> &[Dependency] {
        &self.metadata.dependencies
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.metadata.constraints
    }

    /// Append newly discovered descriptors after the existing ones.
    ///
    /// No deduplication: the same id and version may appear once per stack set.
    pub fn merge(&mut self, discovered: Vec<Dependency>) -> MergeReport {
        let before = self.metadata.dependencies.len();
        let added = discovered.len();
        self.metadata.dependencies.extend(discovered);
        let report = MergeReport {
            before,
            added,
            after: self.metadata.dependencies.len(),
        };
        tracing::debug!(before, added, after = report.after, "merged dependencies");
        report
    }

    /// Reduce the dependency list to what the retention policies keep.
    ///
    /// On error the manifest is left unchanged.
    pub fn prune(&mut self) -> Result<PruneReport, ManifestError> {
        let dependencies = std::mem::take(&mut self.metadata.dependencies);
        match prune(dependencies.clone(), &self.metadata.constraints) {
            Ok((kept, report)) => {
                self.metadata.dependencies = kept;
                Ok(report)
            }
            Err(e) => {
                self.metadata.dependencies = dependencies;
                Err(e)
            }
        }
    }
}
