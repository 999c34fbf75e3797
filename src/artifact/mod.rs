//! Built artifact handling
//!
//! Checksums, build target records, and discovery of verified build outputs.

mod build_record;
mod checksum;
mod discovery;

pub use build_record::BuildRecord;
pub use checksum::{matches_sidecar, sha256_bytes, sha256_file};
pub use discovery::{check_artifact_root, find_artifacts, load_metadata, DiscoveryError};
