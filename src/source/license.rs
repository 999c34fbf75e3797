//! License detection over an extracted source tree
//!
//! Looks at license-like files and `package.json` declarations in the top
//! level of the tree and reports SPDX identifiers with a match confidence.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;

use walkdir::WalkDir;

/// Confidence assigned to a full-text signature match
const TEXT_MATCH_CONFIDENCE: f32 = 1.0;

/// Confidence assigned to a license declared in `package.json`
const DECLARED_CONFIDENCE: f32 = 0.9;

/// Lowercased file name prefixes treated as license files
const LICENSE_FILE_PREFIXES: &[&str] = &["license", "licence", "copying", "unlicense"];

/// Errors raised by license detection
#[derive(Debug, thiserror::Error)]
pub enum LicenseError {
    #[error("no license file was found")]
    NoLicenseFile,

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to walk source tree: {0}")]
    Walk(#[from] walkdir::Error),
}

/// Text fragments identifying a license.
struct Signature {
    id: &'static str,
    required: &'static [&'static str],
    excluded: &'static [&'static str],
}

const SIGNATURES: &[Signature] = &[
    Signature {
        id: "Apache-2.0",
        required: &["apache license", "version 2.0"],
        excluded: &[],
    },
    Signature {
        id: "MIT",
        required: &[
            "permission is hereby granted, free of charge",
            "the above copyright notice and this permission notice shall be included",
        ],
        excluded: &[],
    },
    Signature {
        id: "BSD-3-Clause",
        required: &["redistribution and use in source and binary forms", "neither the name of"],
        excluded: &[],
    },
    Signature {
        id: "BSD-2-Clause",
        required: &["redistribution and use in source and binary forms"],
        excluded: &["neither the name of"],
    },
    Signature {
        id: "ISC",
        required: &["permission to use, copy, modify, and/or distribute this software for any purpose"],
        excluded: &[],
    },
    Signature {
        id: "MPL-2.0",
        required: &["mozilla public license", "version 2.0"],
        excluded: &[],
    },
    Signature {
        id: "LGPL-2.1",
        required: &["gnu lesser general public license", "version 2.1"],
        excluded: &[],
    },
    Signature {
        id: "LGPL-3.0",
        required: &["gnu lesser general public license", "version 3"],
        excluded: &[],
    },
    Signature {
        id: "GPL-2.0",
        required: &["gnu general public license", "version 2"],
        excluded: &["lesser general public license", "version 3"],
    },
    Signature {
        id: "GPL-3.0",
        required: &["gnu general public license", "version 3"],
        excluded: &["lesser general public license"],
    },
    Signature {
        id: "Unlicense",
        required: &["this is free and unencumbered software released into the public domain"],
        excluded: &[],
    },
];

/// SPDX identifiers accepted from `package.json` besides the signature ids.
const DECLARABLE: &[&str] = &[
    "0BSD",
    "AGPL-3.0",
    "Artistic-2.0",
    "BlueOak-1.0.0",
    "BSL-1.0",
    "CC-BY-3.0",
    "CC-BY-4.0",
    "CC0-1.0",
    "EPL-1.0",
    "EPL-2.0",
    "Python-2.0",
    "WTFPL",
    "Zlib",
];

/// Detect licenses in `dir`, keyed by SPDX identifier.
///
/// Returns [`LicenseError::NoLicenseFile`] when nothing is found.
pub fn detect(dir: &Path) -> Result<BTreeMap<String, f32>, LicenseError> {
    let mut found: BTreeMap<String, f32> = BTreeMap::new();

    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by(|a, b| a.file_name().cmp(b.file_name()))
    {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_lowercase();

        let detected: Vec<(String, f32)> = if name == "package.json" {
            declared_licenses(&read(entry.path())?)
                .into_iter()
                .map(|id| (id, DECLARED_CONFIDENCE))
                .collect()
        } else if LICENSE_FILE_PREFIXES.iter().any(|p| name.starts_with(p)) {
            match_text(&read(entry.path())?)
                .into_iter()
                .map(|id| (id.to_string(), TEXT_MATCH_CONFIDENCE))
                .collect()
        } else {
            continue;
        };

        for (id, confidence) in detected {
            tracing::debug!(file = %name, license = %id, confidence, "license evidence");
            let slot = found.entry(id).or_insert(0.0);
            *slot = slot.max(confidence);
        }
    }

    if found.is_empty() {
        return Err(LicenseError::NoLicenseFile);
    }
    Ok(found)
}

/// Sorted license identifiers for `dir`; no evidence yields an empty list.
pub fn scan_licenses(dir: &Path) -> Result<Vec<String>, LicenseError> {
    match detect(dir) {
        Ok(found) => Ok(found.into_keys().collect()),
        Err(LicenseError::NoLicenseFile) => {
            tracing::warn!(dir = %dir.display(), "no license evidence found");
            Ok(Vec::new())
        }
        Err(e) => Err(e),
    }
}

fn read(path: &Path) -> Result<String, LicenseError> {
    let bytes = fs::read(path).map_err(|source| LicenseError::Io {
        path: path.display().to_string(),
        source,
    })?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Identify license texts by signature.
fn match_text(text: &str) -> Vec<&'static str> {
    let normalized = text
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");

    SIGNATURES
        .iter()
        .filter(|sig| {
            sig.required.iter().all(|r| normalized.contains(r))
                && !sig.excluded.iter().any(|e| normalized.contains(e))
        })
        .map(|sig| sig.id)
        .collect()
}

/// SPDX identifiers declared by an npm manifest.
///
/// Handles `"license": "MIT"`, SPDX expressions such as `"(MIT OR Apache-2.0)"`,
/// `"license": {"type": ...}` and the legacy `"licenses": [{"type": ...}]`.
fn declared_licenses(package_json: &str) -> Vec<String> {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(package_json) else {
        return Vec::new();
    };

    let mut expressions = Vec::new();
    match value.get("license") {
        Some(serde_json::Value::String(s)) => expressions.push(s.clone()),
        Some(serde_json::Value::Object(obj)) => {
            if let Some(t) = obj.get("type").and_then(|t| t.as_str()) {
                expressions.push(t.to_string());
            }
        }
        _ => {}
    }
    if let Some(list) = value.get("licenses").and_then(|l| l.as_array()) {
        expressions.extend(
            list.iter()
                .filter_map(|l| l.get("type").and_then(|t| t.as_str()))
                .map(str::to_string),
        );
    }

    expressions
        .iter()
        .filter(|expr| !expr.trim_start().to_uppercase().starts_with("SEE LICENSE IN"))
        .flat_map(|expr| {
            expr.split(|c: char| c == '(' || c == ')' || c.is_whitespace())
                .filter_map(spdx_id)
                .collect::<Vec<_>>()
        })
        .collect()
}

/// The canonical SPDX identifier for `token`, if it names a known license.
///
/// Matching ignores case and the `-only`, `-or-later` and `+` suffixes.
fn spdx_id(token: &str) -> Option<String> {
    let lower = token.to_lowercase();
    let base = ["-only", "-or-later", "+"]
        .iter()
        .find_map(|suffix| lower.strip_suffix(suffix))
        .unwrap_or(lower.as_str());

    SIGNATURES
        .iter()
        .map(|sig| sig.id)
        .chain(DECLARABLE.iter().copied())
        .find(|id| id.eq_ignore_ascii_case(base))
        .map(str::to_string)
}
