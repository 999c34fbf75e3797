//! Built-in defaults

/// Upstream yarn release archive
pub const DEFAULT_SOURCE_URL_TEMPLATE: &str =
    "https://github.com/yarnpkg/yarn/releases/download/v{version}/yarn-v{version}.tar.gz";

pub const DEFAULT_CPE_TEMPLATE: &str = "cpe:2.3:a:{id}pkg:{id}:{version}:*:*:*:*:*:*:*";

pub const DEFAULT_TARBALL_SUFFIX: &str = ".tgz";

pub const DEFAULT_CHECKSUM_SUFFIX: &str = ".sha256";

pub const DEFAULT_BUILD_RECORD_FILE: &str = "matrix.json";

pub const DEFAULT_METADATA_PATTERN: &str = "metadata-*.json";

/// Discovered artifacts carry no recoverable download location yet.
pub const UNRESOLVED_URI: &str = "<UNKNOWN>";
