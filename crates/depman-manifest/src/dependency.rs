//! Dependency descriptors and retention policies.

use semver::Version;
use serde::{Deserialize, Serialize};

use crate::version::{parse_version, VersionRange};
use crate::ManifestError;

/// One dependency-artifact record in the manifest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dependency {
    /// Family identifier (e.g. `yarn`)
    pub id: String,

    /// Human-readable name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Semantic version string
    pub version: String,

    /// Location of the built artifact
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,

    /// SHA-256 of the built artifact
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,

    /// Upstream source archive URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    /// SHA-256 of the upstream source archive
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_sha256: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpe: Option<String>,

    /// Package URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purl: Option<String>,

    /// License identifiers, alphabetical
    #[serde(default)]
    pub licenses: Vec<String>,

    /// Target stacks this build was produced for
    #[serde(default)]
    pub stacks: Vec<String>,

    /// RFC 3339 date after which the version is deprecated
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deprecation_date: Option<String>,
}

impl Dependency {
    /// Parse `version` as a semantic version.
    pub fn semver(&self) -> Result<Version, ManifestError> {
        parse_version(&self.version)
    }

    /// Order stacks descending lexically.
    pub fn sort_stacks(&mut self) {
        self.stacks.sort_by(|a, b| b.cmp(a));
    }
}

/// Retention policy: keep the newest `patches` versions of `id` within `constraint`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constraint {
    /// Family identifier the policy applies to
    pub id: String,

    /// Version range expression
    pub constraint: String,

    /// Number of most recent matching versions to retain
    pub patches: usize,
}

impl Constraint {
    /// Parse the range expression.
    pub fn range(&self) -> Result<VersionRange, ManifestError> {
        VersionRange::parse(&self.constraint)
    }
}
