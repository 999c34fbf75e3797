//! Dependency manifest model with merge and retention pruning.
//!
//! A manifest is a TOML document whose `[metadata]` table carries the list of
//! dependency descriptors and the retention policies (`dependency-constraints`)
//! that bound how many versions of each dependency family are kept.

mod dependency;
mod error;
mod manifest;
mod prune;
mod version;

pub use dependency::{Constraint, Dependency};
pub use error::ManifestError;
pub use manifest::{Manifest, MergeReport, Metadata};
pub use prune::{prune, PolicyRetention, PruneReport};
pub use version::{parse_version, VersionRange};
