//! Dependency manifest assembly
//!
//! Builds release descriptors for upstream versions, verifies per-stack
//! build outputs against their checksums, merges them into a dependency
//! manifest, and prunes the manifest to its retention policies.

pub mod artifact;
pub mod config;
pub mod pipeline;
pub mod source;

pub use config::{ConfigError, PipelineConfig};
pub use depman_manifest::{Constraint, Dependency, Manifest, ManifestError, PruneReport};
pub use pipeline::{assemble, build_metadata, prune_file, AssembleReport, PipelineError, PipelineResult};
pub use source::{HttpReleaseSource, ReleaseSource};
