//! Test fixtures for assemble tests
//!
//! Builds artifact roots shaped like the CI download layout:
//! `metadata-<version>.json/metadata-<version>.json` descriptors and one
//! `<id>-<version>-<target>/` directory per build.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use dependency_manifest::artifact::sha256_bytes;
use serde_json::json;

/// A yarn manifest with one policy keeping two versions
pub const YARN_MANIFEST: &str = r#"api = "0.7"

[buildpack]
id = "paketo-buildpacks/yarn"
name = "Paketo Buildpack for Yarn"

[metadata]
include-files = ["bin/build", "bin/detect", "buildpack.toml"]

[[metadata.dependencies]]
id = "yarn"
name = "Yarn"
version = "1.22.17"
uri = "https://example.com/yarn-1.22.17.tgz"
sha256 = "1111111111111111111111111111111111111111111111111111111111111111"
stacks = ["io.buildpacks.stacks.bionic"]
licenses = ["BSD-2-Clause"]

[[metadata.dependencies]]
id = "yarn"
name = "Yarn"
version = "1.22.18"
uri = "https://example.com/yarn-1.22.18.tgz"
sha256 = "2222222222222222222222222222222222222222222222222222222222222222"
stacks = ["io.buildpacks.stacks.bionic"]
licenses = ["BSD-2-Clause"]

[[metadata.dependency-constraints]]
id = "yarn"
constraint = ">=1.0.0"
patches = 2

[[stacks]]
id = "io.buildpacks.stacks.bionic"
"#;

/// Write the manifest fixture into `dir` and return its path
pub fn write_manifest(dir: &Path) -> PathBuf {
    let path = dir.join("buildpack.toml");
    fs::write(&path, YARN_MANIFEST).unwrap();
    path
}

/// Artifact root under construction
pub struct ArtifactRoot {
    pub path: PathBuf,
}

impl ArtifactRoot {
    pub fn new(path: PathBuf) -> Self {
        fs::create_dir_all(&path).unwrap();
        Self { path }
    }

    /// Add a release descriptor as the builder would have produced it
    pub fn with_metadata(self, version: &str) -> Self {
        let name = format!("metadata-{}.json", version);
        let dir = self.path.join(&name);
        fs::create_dir_all(&dir).unwrap();
        let descriptor = json!({
            "id": "yarn",
            "name": "Yarn",
            "version": version,
            "source": format!("https://github.com/yarnpkg/yarn/releases/download/v{0}/yarn-v{0}.tar.gz", version),
            "source_sha256": "abcdef",
            "cpe": format!("cpe:2.3:a:yarnpkg:yarn:{}:*:*:*:*:*:*:*", version),
            "licenses": ["BSD-2-Clause"],
        });
        fs::write(dir.join(&name), descriptor.to_string()).unwrap();
        self
    }

    /// Add one build directory with a correct checksum sidecar
    pub fn with_build(self, version: &str, target: &str, stacks: &[&str]) -> Self {
        let tarball = format!("yarn {} built for {}", version, target);
        let sha = sha256_bytes(tarball.as_bytes());
        self.with_build_sidecar(version, target, stacks, &tarball, &sha)
    }

    /// Add one build directory with an explicit sidecar value
    pub fn with_build_sidecar(
        self,
        version: &str,
        target: &str,
        stacks: &[&str],
        tarball: &str,
        sidecar: &str,
    ) -> Self {
        let dir = self.path.join(format!("yarn-{}-{}", version, target));
        fs::create_dir_all(&dir).unwrap();
        let file = format!("yarn-{}-{}.tgz", version, target);
        fs::write(dir.join(&file), tarball).unwrap();
        fs::write(dir.join(format!("{}.sha256", file)), format!("{}  {}\n", sidecar, file)).unwrap();
        let record = json!({
            "image": format!("{}-image", target),
            "version": version,
            "target": target,
            "stacks": stacks,
        });
        fs::write(dir.join("matrix.json"), record.to_string()).unwrap();
        self
    }
}
