//! Upstream release handling
//!
//! Fetching release archives, unpacking them, license detection, package
//! URLs, and the metadata builder that ties them together.

mod archive;
mod fetch;
mod license;
mod metadata;
mod purl;

pub use archive::{extract_tar_gz, ArchiveError};
pub use fetch::{FetchError, HttpReleaseSource, ReleaseSource};
pub use license::{detect as detect_licenses, scan_licenses, LicenseError};
pub use metadata::{read_descriptor, write_descriptor, MetadataBuilder, MetadataError};
pub use purl::{escaped_purl, generate_purl};
