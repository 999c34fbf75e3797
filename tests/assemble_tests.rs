//! End-to-end tests for `assemble` and `prune_file`.

mod fixtures;

use std::fs;

use dependency_manifest::artifact::DiscoveryError;
use dependency_manifest::{assemble, prune_file, Manifest, PipelineConfig, PipelineError};
use fixtures::{write_manifest, ArtifactRoot, YARN_MANIFEST};
use tempfile::TempDir;

fn versions(manifest: &Manifest) -> Vec<String> {
    manifest
        .dependencies()
        .iter()
        .map(|d| d.version.clone())
        .collect()
}

#[test]
fn test_assemble_adds_release_and_prunes_oldest() {
    let dir = TempDir::new().unwrap();
    let manifest_path = write_manifest(dir.path());
    let root = ArtifactRoot::new(dir.path().join("artifacts"))
        .with_metadata("1.22.19")
        .with_build("1.22.19", "bionic", &["io.buildpacks.stacks.bionic"]);

    let mut out = Vec::new();
    let report = assemble(
        "yarn",
        &root.path,
        &manifest_path,
        &PipelineConfig::default(),
        &mut out,
    )
    .unwrap();

    assert_eq!(report.discovered.len(), 1);
    assert_eq!(report.merge.after, report.merge.before + 1);
    assert_eq!(report.prune.dropped.len(), 1);
    assert_eq!(report.prune.dropped[0].version, "1.22.17");

    let written = Manifest::load(&manifest_path).unwrap();
    assert_eq!(versions(&written), vec!["1.22.18", "1.22.19"]);

    let added = &written.dependencies()[1];
    assert_eq!(added.uri.as_deref(), Some("<UNKNOWN>"));
    assert_eq!(added.name.as_deref(), Some("Yarn"));
    assert_eq!(added.licenses, vec!["BSD-2-Clause"]);
    assert_eq!(added.stacks, vec!["io.buildpacks.stacks.bionic"]);
    assert_eq!(added.sha256.as_ref().map(String::len), Some(64));

    // Everything outside the dependency list is carried through.
    assert_eq!(written.extra["api"].as_str(), Some("0.7"));
    assert!(written.extra.contains_key("stacks"));
    assert!(written.metadata.extra.contains_key("include-files"));
    assert_eq!(written.constraints().len(), 1);

    let audit = String::from_utf8(out).unwrap();
    assert!(audit.contains("id=yarn"));
    assert!(audit.contains("Found metadata:"));
    assert!(audit.contains("Found artifacts:"));
    assert!(audit.contains(">>> "));
    assert!(audit.contains("Dropping yarn 1.22.17"));
}

#[test]
fn test_multi_stack_builds_are_kept_side_by_side() {
    let dir = TempDir::new().unwrap();
    let manifest_path = write_manifest(dir.path());
    let root = ArtifactRoot::new(dir.path().join("artifacts"))
        .with_metadata("1.22.19")
        .with_build("1.22.19", "bionic", &["io.buildpacks.stacks.bionic"])
        .with_build(
            "1.22.19",
            "jammy",
            &["io.buildpacks.stacks.jammy", "io.buildpacks.stacks.bionic"],
        );

    let report = assemble(
        "yarn",
        &root.path,
        &manifest_path,
        &PipelineConfig::default(),
        &mut Vec::new(),
    )
    .unwrap();

    assert_eq!(report.discovered.len(), 2);
    let written = Manifest::load(&manifest_path).unwrap();
    assert_eq!(versions(&written), vec!["1.22.18", "1.22.19", "1.22.19"]);

    // Ties on version order by stack count; stacks are stored descending.
    let deps = written.dependencies();
    assert_eq!(deps[1].stacks, vec!["io.buildpacks.stacks.bionic"]);
    assert_eq!(
        deps[2].stacks,
        vec!["io.buildpacks.stacks.jammy", "io.buildpacks.stacks.bionic"]
    );
}

#[test]
fn test_checksum_mismatch_leaves_manifest_untouched() {
    let dir = TempDir::new().unwrap();
    let manifest_path = write_manifest(dir.path());
    let root = ArtifactRoot::new(dir.path().join("artifacts"))
        .with_metadata("1.22.19")
        .with_build("1.22.19", "bionic", &["io.buildpacks.stacks.bionic"])
        .with_build_sidecar(
            "1.22.19",
            "jammy",
            &["io.buildpacks.stacks.jammy"],
            "tampered tarball",
            &"f".repeat(64),
        );

    let err = assemble(
        "yarn",
        &root.path,
        &manifest_path,
        &PipelineConfig::default(),
        &mut Vec::new(),
    )
    .unwrap_err();

    assert!(matches!(
        err,
        PipelineError::Discovery(DiscoveryError::ChecksumMismatch { .. })
    ));
    assert_eq!(fs::read_to_string(&manifest_path).unwrap(), YARN_MANIFEST);
}

#[test]
fn test_missing_artifact_root_fails_before_manifest_is_read() {
    let dir = TempDir::new().unwrap();
    let missing_manifest = dir.path().join("missing.toml");

    let err = assemble(
        "yarn",
        &dir.path().join("artifacts"),
        &missing_manifest,
        &PipelineConfig::default(),
        &mut Vec::new(),
    )
    .unwrap_err();

    assert!(matches!(
        err,
        PipelineError::Discovery(DiscoveryError::MissingRoot(_))
    ));
}

#[test]
fn test_no_metadata_is_fatal() {
    let dir = TempDir::new().unwrap();
    let manifest_path = write_manifest(dir.path());
    let root = ArtifactRoot::new(dir.path().join("artifacts")).with_build(
        "1.22.19",
        "bionic",
        &["io.buildpacks.stacks.bionic"],
    );

    let err = assemble(
        "yarn",
        &root.path,
        &manifest_path,
        &PipelineConfig::default(),
        &mut Vec::new(),
    )
    .unwrap_err();

    assert!(matches!(
        err,
        PipelineError::Discovery(DiscoveryError::NoMetadata(_))
    ));
    assert_eq!(fs::read_to_string(&manifest_path).unwrap(), YARN_MANIFEST);
}

#[test]
fn test_assemble_twice_is_stable() {
    let dir = TempDir::new().unwrap();
    let manifest_path = write_manifest(dir.path());
    let root = ArtifactRoot::new(dir.path().join("artifacts"))
        .with_metadata("1.22.19")
        .with_build("1.22.19", "bionic", &["io.buildpacks.stacks.bionic"]);
    let config = PipelineConfig::default();

    assemble("yarn", &root.path, &manifest_path, &config, &mut Vec::new()).unwrap();
    let first = Manifest::load(&manifest_path).unwrap();

    // Re-running appends the same build again; pruning keeps both copies of 1.22.19.
    assemble("yarn", &root.path, &manifest_path, &config, &mut Vec::new()).unwrap();
    let second = Manifest::load(&manifest_path).unwrap();

    assert_eq!(versions(&first), vec!["1.22.18", "1.22.19"]);
    assert_eq!(versions(&second), vec!["1.22.18", "1.22.19", "1.22.19"]);
}

#[test]
fn test_prune_file_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let manifest_path = write_manifest(dir.path());

    let first = prune_file(&manifest_path, &mut Vec::new()).unwrap();
    let after_first = fs::read_to_string(&manifest_path).unwrap();
    let second = prune_file(&manifest_path, &mut Vec::new()).unwrap();
    let after_second = fs::read_to_string(&manifest_path).unwrap();

    assert!(first.dropped.is_empty());
    assert!(second.dropped.is_empty());
    assert_eq!(after_first, after_second);
}

#[test]
fn test_prune_file_rejects_non_semver_without_writing() {
    let dir = TempDir::new().unwrap();
    let manifest_path = dir.path().join("buildpack.toml");
    let content = YARN_MANIFEST.replace("1.22.17", "latest");
    fs::write(&manifest_path, &content).unwrap();

    let err = prune_file(&manifest_path, &mut Vec::new()).unwrap_err();

    assert!(matches!(err, PipelineError::Manifest(_)));
    assert_eq!(fs::read_to_string(&manifest_path).unwrap(), content);
}

#[test]
fn test_custom_config_patterns() {
    let dir = TempDir::new().unwrap();
    let manifest_path = write_manifest(dir.path());
    let root = ArtifactRoot::new(dir.path().join("artifacts"))
        .with_metadata("1.22.19")
        .with_build("1.22.19", "bionic", &["io.buildpacks.stacks.bionic"]);
    let config = PipelineConfig::parse(r#"unresolved_uri = "pending""#).unwrap();

    assemble("yarn", &root.path, &manifest_path, &config, &mut Vec::new()).unwrap();

    let written = Manifest::load(&manifest_path).unwrap();
    assert_eq!(written.dependencies()[1].uri.as_deref(), Some("pending"));
}
