//! Version and version-range parsing.
//!
//! Versions are semantic versions. A single leading `v` is accepted and a
//! partial version such as `1.22` is read as `1.22.0`.
//! Ranges are comparator sets joined by `||`; comparators inside a set are
//! separated by commas or whitespace and must all hold. A bare version means
//! equality, and `a - b` is an inclusive range.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use semver::{Version, VersionReq};

use crate::ManifestError;

/// Characters that may form a comparison operator.
const OPERATOR_CHARS: &[char] = &['<', '>', '=', '~', '^'];

/// Parse a manifest version string.
pub fn parse_version(raw: &str) -> Result<Version, ManifestError> {
    let trimmed = raw.trim();
    let bare = trimmed.strip_prefix('v').unwrap_or(trimmed);
    Version::parse(&pad_partial(bare)).map_err(|source| ManifestError::InvalidVersion {
        version: raw.to_string(),
        source,
    })
}

/// Fill in missing minor and patch numbers: `1` -> `1.0.0`, `1.2-rc.1` -> `1.2.0-rc.1`.
fn pad_partial(version: &str) -> Cow<'_, str> {
    let core_len = version.find(['-', '+']).unwrap_or(version.len());
    let (core, suffix) = version.split_at(core_len);

    let parts = core.split('.').count();
    let numeric = core
        .split('.')
        .all(|part| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit()));
    if parts >= 3 || !numeric {
        return Cow::Borrowed(version);
    }

    let mut padded = core.to_string();
    for _ in parts..3 {
        padded.push_str(".0");
    }
    padded.push_str(suffix);
    Cow::Owned(padded)
}

/// A parsed version-range expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionRange {
    raw: String,
    alternatives: Vec<VersionReq>,
}

impl VersionRange {
    /// Parse a range expression such as `>=1.0.0`, `1.22.*`, or `~1 || ^2.1`.
    pub fn parse(raw: &str) -> Result<Self, ManifestError> {
        let invalid = |reason: String| ManifestError::InvalidRange {
            range: raw.to_string(),
            reason,
        };

        let mut alternatives = Vec::new();
        for alternative in raw.split("||") {
            let comparators = normalize_alternative(alternative).map_err(invalid)?;
            let req = VersionReq::parse(&comparators).map_err(|e| invalid(e.to_string()))?;
            alternatives.push(req);
        }

        Ok(Self {
            raw: raw.to_string(),
            alternatives,
        })
    }

    /// Whether `version` satisfies any alternative of this range.
    pub fn matches(&self, version: &Version) -> bool {
        self.alternatives.iter().any(|req| req.matches(version))
    }

    /// The expression as written in the manifest.
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl FromStr for VersionRange {
    type Err = ManifestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Rewrite one `||` alternative into `semver` requirement syntax.
fn normalize_alternative(alternative: &str) -> Result<String, String> {
    let tokens = tokenize(alternative);
    if tokens.is_empty() {
        return Err("empty comparator set".to_string());
    }

    // Hyphen range: `a - b`
    if let Some(pos) = tokens.iter().position(|t| t == "-") {
        if tokens.len() != 3 || pos != 1 {
            return Err("malformed hyphen range".to_string());
        }
        return Ok(format!(
            ">={}, <={}",
            strip_v(&tokens[0]),
            strip_v(&tokens[2])
        ));
    }

    let comparators: Vec<String> = tokens.iter().map(|t| normalize_comparator(t)).collect();
    Ok(comparators.join(", "))
}

/// Split on commas and whitespace, gluing a lone operator to the version after it.
fn tokenize(alternative: &str) -> Vec<String> {
    let mut tokens: Vec<String> = Vec::new();
    let mut pending_operator: Option<String> = None;

    for piece in alternative
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|p| !p.is_empty())
    {
        if piece.chars().all(|c| OPERATOR_CHARS.contains(&c)) {
            pending_operator = Some(pending_operator.unwrap_or_default() + piece);
            continue;
        }
        match pending_operator.take() {
            Some(op) => tokens.push(format!("{}{}", op, piece)),
            None => tokens.push(piece.to_string()),
        }
    }

    if let Some(op) = pending_operator {
        // Dangling operator; let the requirement parser report it.
        tokens.push(op);
    }
    tokens
}

fn normalize_comparator(token: &str) -> String {
    let op_len = token
        .find(|c: char| !OPERATOR_CHARS.contains(&c))
        .unwrap_or(token.len());
    let (op, version) = token.split_at(op_len);
    let version = strip_v(version);

    if version == "*" || version.eq_ignore_ascii_case("x") {
        return "*".to_string();
    }
    let has_wildcard = version
        .split('.')
        .any(|part| part == "*" || part.eq_ignore_ascii_case("x"));
    if op.is_empty() && !has_wildcard {
        // A bare version is an equality check, not a caret requirement.
        format!("={}", version)
    } else {
        format!("{}{}", op, version)
    }
}

fn strip_v(version: &str) -> &str {
    version.strip_prefix('v').unwrap_or(version)
}
