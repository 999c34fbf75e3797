//! Retention pruning.
//!
//! Each policy keeps the `patches` newest distinct versions of its family
//! within its range. The kept versions form one set shared by every family:
//! a descriptor survives if its version is in that set, whatever its id. The
//! survivors
//! are written back with stacks sorted descending and the list ordered by
//! id, then semantic version, then number of stacks.

use std::collections::{BTreeMap, BTreeSet};

use semver::Version;

use crate::{Constraint, Dependency, ManifestError};

/// Versions kept by one policy, ascending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyRetention {
    pub id: String,
    pub constraint: String,
    pub patches: usize,
    pub versions: Vec<String>,
}

/// Outcome of a pruning pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PruneReport {
    /// One entry per policy, in manifest order
    pub policies: Vec<PolicyRetention>,

    /// Number of descriptors kept
    pub retained: usize,

    /// Descriptors removed, in their original order
    pub dropped: Vec<Dependency>,
}

/// Apply `constraints` to `dependencies`.
///
/// Returns the retained, normalized descriptors and a report. Fails if any
/// version or range does not parse.
pub fn prune(
    dependencies: Vec<Dependency>,
    constraints: &[Constraint],
) -> Result<(Vec<Dependency>, PruneReport), ManifestError> {
    let ranges = constraints
        .iter()
        .map(|c| c.range())
        .collect::<Result<Vec<_>, _>>()?;

    let mut parsed: Vec<(Version, Dependency)> = dependencies
        .into_iter()
        .map(|dep| dep.semver().map(|v| (v, dep)))
        .collect::<Result<_, _>>()?;

    let mut keep: BTreeSet<Version> = BTreeSet::new();
    let mut policies = Vec::with_capacity(constraints.len());

    for (constraint, range) in constraints.iter().zip(&ranges) {
        // Distinct versions; several stacks of one release count once.
        let matching: BTreeMap<&Version, &str> = parsed
            .iter()
            .filter(|(version, dep)| dep.id == constraint.id && range.matches(version))
            .map(|(version, dep)| (version, dep.version.as_str()))
            .collect();

        let skip = matching.len().saturating_sub(constraint.patches);
        let kept: Vec<(&Version, &str)> = matching.into_iter().skip(skip).collect();

        for (version, _) in &kept {
            keep.insert((*version).clone());
        }

        tracing::debug!(
            id = %constraint.id,
            constraint = %constraint.constraint,
            patches = constraint.patches,
            kept = kept.len(),
            "applied retention policy"
        );

        policies.push(PolicyRetention {
            id: constraint.id.clone(),
            constraint: constraint.constraint.clone(),
            patches: constraint.patches,
            versions: kept.into_iter().map(|(_, raw)| raw.to_string()).collect(),
        });
    }

    let mut dropped = Vec::new();
    parsed.retain(|(version, dep)| {
        let retained = keep.contains(version);
        if !retained {
            dropped.push(dep.clone());
        }
        retained
    });

    for (_, dep) in parsed.iter_mut() {
        dep.sort_stacks();
    }

    // Stable: equal keys keep their merge order.
    parsed.sort_by(|(va, a), (vb, b)| {
        a.id.cmp(&b.id)
            .then_with(|| va.cmp(vb))
            .then_with(|| a.stacks.len().cmp(&b.stacks.len()))
    });

    let retained: Vec<Dependency> = parsed.into_iter().map(|(_, dep)| dep).collect();

    tracing::info!(
        retained = retained.len(),
        dropped = dropped.len(),
        "pruned manifest"
    );

    let report = PruneReport {
        policies,
        retained: retained.len(),
        dropped,
    };
    Ok((retained, report))
}
