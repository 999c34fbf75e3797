//! Build target record (`matrix.json`)
//!
//! Written by the build job next to each tarball; identifies which release
//! and which target stacks the tarball was built for.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Per-build target record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildRecord {
    /// Build image the artifact was compiled in
    #[serde(default)]
    pub image: String,

    /// Release version
    pub version: String,

    /// Build target name
    #[serde(default)]
    pub target: String,

    /// Stacks the artifact is compatible with
    #[serde(default)]
    pub stacks: Vec<String>,
}

impl BuildRecord {
    /// Load from JSON
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Whether `path` names a build record under the configured file name
    pub fn is_record(path: &Path, file_name: &str) -> bool {
        path.file_name().map_or(false, |name| name == file_name)
    }
}
