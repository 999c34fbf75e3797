//! Pipeline configuration
//!
//! Built-in defaults reproduce the conventions of the yarn release pipeline.
//! A TOML file may override any subset of them.

mod defaults;

pub use defaults::{
    DEFAULT_BUILD_RECORD_FILE, DEFAULT_CHECKSUM_SUFFIX, DEFAULT_CPE_TEMPLATE,
    DEFAULT_METADATA_PATTERN, DEFAULT_SOURCE_URL_TEMPLATE, DEFAULT_TARBALL_SUFFIX,
    UNRESOLVED_URI,
};

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Errors that can occur when loading configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// Settings shared by the metadata builder and artifact discovery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Release archive URL; `{version}` is substituted
    pub source_url_template: String,

    /// CPE string; `{id}` and `{version}` are substituted
    pub cpe_template: String,

    /// Leading path components dropped when extracting the release archive
    pub strip_components: usize,

    /// Suffix identifying the built tarball in an artifact directory
    pub tarball_suffix: String,

    /// Suffix identifying the checksum sidecar in an artifact directory
    pub checksum_suffix: String,

    /// File name of the build target record in an artifact directory
    pub build_record_file: String,

    /// Glob for metadata descriptors in the artifact root; one `*` stands for the version
    pub metadata_pattern: String,

    /// URI recorded for discovered artifacts
    pub unresolved_uri: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            source_url_template: DEFAULT_SOURCE_URL_TEMPLATE.to_string(),
            cpe_template: DEFAULT_CPE_TEMPLATE.to_string(),
            strip_components: 1,
            tarball_suffix: DEFAULT_TARBALL_SUFFIX.to_string(),
            checksum_suffix: DEFAULT_CHECKSUM_SUFFIX.to_string(),
            build_record_file: DEFAULT_BUILD_RECORD_FILE.to_string(),
            metadata_pattern: DEFAULT_METADATA_PATTERN.to_string(),
            unresolved_uri: UNRESOLVED_URI.to_string(),
        }
    }
}

impl PipelineConfig {
    /// Load from `path`, or use the defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    /// Load a TOML overlay from a file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content)
    }

    /// Parse a TOML overlay
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: PipelineConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !self.source_url_template.contains("{version}") {
            return Err(ConfigError::InvalidValue {
                field: "source_url_template",
                reason: "must contain {version}".to_string(),
            });
        }

        for (field, value) in [
            ("tarball_suffix", &self.tarball_suffix),
            ("checksum_suffix", &self.checksum_suffix),
            ("build_record_file", &self.build_record_file),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field,
                    reason: "must not be empty".to_string(),
                });
            }
        }

        if self.metadata_pattern.matches('*').count() != 1 {
            return Err(ConfigError::InvalidValue {
                field: "metadata_pattern",
                reason: "must contain exactly one '*'".to_string(),
            });
        }

        Ok(())
    }

    /// Release archive URL for `version`
    pub fn source_url(&self, version: &str) -> String {
        self.source_url_template.replace("{version}", version)
    }

    /// CPE for `id` at `version`
    pub fn cpe(&self, id: &str, version: &str) -> String {
        self.cpe_template
            .replace("{id}", id)
            .replace("{version}", version)
    }

    /// Extract the version from a metadata file name, if it matches the pattern.
    pub fn metadata_version<'a>(&self, file_name: &'a str) -> Option<&'a str> {
        let (prefix, suffix) = self.metadata_pattern.split_once('*')?;
        file_name
            .strip_prefix(prefix)?
            .strip_suffix(suffix)
            .filter(|v| !v.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_render_yarn_urls() {
        let config = PipelineConfig::default();
        assert_eq!(
            config.source_url("1.22.19"),
            "https://github.com/yarnpkg/yarn/releases/download/v1.22.19/yarn-v1.22.19.tar.gz"
        );
        assert_eq!(
            config.cpe("yarn", "1.22.19"),
            "cpe:2.3:a:yarnpkg:yarn:1.22.19:*:*:*:*:*:*:*"
        );
    }

    #[test]
    fn test_overlay_keeps_unset_defaults() {
        let config = PipelineConfig::parse(
            r#"
source_url_template = "https://example.com/tool-{version}.tgz"
strip_components = 0
"#,
        )
        .unwrap();

        assert_eq!(config.source_url("2.0.0"), "https://example.com/tool-2.0.0.tgz");
        assert_eq!(config.strip_components, 0);
        assert_eq!(config.tarball_suffix, DEFAULT_TARBALL_SUFFIX);
        assert_eq!(config.unresolved_uri, UNRESOLVED_URI);
    }

    #[test]
    fn test_template_without_version_rejected() {
        let err = PipelineConfig::parse(r#"source_url_template = "https://example.com/latest.tgz""#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { field: "source_url_template", .. }));
    }

    #[test]
    fn test_empty_suffix_rejected() {
        let err = PipelineConfig::parse(r#"checksum_suffix = """#).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { field: "checksum_suffix", .. }));
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(matches!(
            PipelineConfig::parse("retries = 3"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_metadata_version_extraction() {
        let config = PipelineConfig::default();
        assert_eq!(config.metadata_version("metadata-1.22.19.json"), Some("1.22.19"));
        assert_eq!(config.metadata_version("metadata-.json"), None);
        assert_eq!(config.metadata_version("yarn-1.22.19"), None);
    }

    #[test]
    fn test_load_without_path_uses_defaults() {
        assert_eq!(PipelineConfig::load(None).unwrap(), PipelineConfig::default());
    }
}
