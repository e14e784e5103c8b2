// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Reduction Policies
//
// Stateless folds that combine the surviving per-cluster answers of one
// fan-out round into a single coordinator-level answer. All of them are
// total over their (already-filtered) input: reduction never fails, and
// it never starts before every dispatched call has settled.

use crate::domain::osystem::{OperatingSystem, ReleaseTitleOverrides, CUSTOM_OSYSTEM};
use std::collections::HashMap;

/// Merge per-cluster `osystems` listings into one fleet-wide sequence.
///
/// An operating system is admitted once per distinct (name, value) pair:
/// two clusters reporting the same name with different detail both get
/// through, exact duplicates are suppressed. After admission, entries
/// named `custom` have each release title rewritten from `overrides`
/// where an override exists.
///
/// The returned iterator is lazy and single-pass, in encounter order.
pub fn merge_operating_systems<'a, I>(
    responses: I,
    overrides: &'a dyn ReleaseTitleOverrides,
) -> impl Iterator<Item = OperatingSystem> + 'a
where
    I: IntoIterator<Item = Vec<OperatingSystem>> + 'a,
{
    let mut seen: HashMap<String, Vec<OperatingSystem>> = HashMap::new();
    responses.into_iter().flatten().filter_map(move |osystem| {
        let admitted = seen.entry(osystem.name.clone()).or_default();
        if admitted.contains(&osystem) {
            return None;
        }
        admitted.push(osystem.clone());
        if osystem.name == CUSTOM_OSYSTEM {
            Some(fix_custom_release_titles(osystem, overrides))
        } else {
            Some(osystem)
        }
    })
}

/// Substitute locally-known titles into an uploaded OS's releases.
fn fix_custom_release_titles(
    mut osystem: OperatingSystem,
    overrides: &dyn ReleaseTitleOverrides,
) -> OperatingSystem {
    for release in &mut osystem.releases {
        if let Some(title) = overrides.title_for(&release.name) {
            release.title = Some(title);
        }
    }
    osystem
}

/// Reduce per-cluster string answers to one: the last non-empty answer
/// wins, `None` when every answer was empty.
///
/// Every cluster is equally authoritative and completion order is
/// arbitrary, so no position carries priority; callers must not read a
/// cluster preference into which answer survives.
pub fn last_non_empty<I, S>(answers: I) -> Option<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    answers
        .into_iter()
        .map(Into::into)
        .filter(|answer| !answer.is_empty())
        .last()
}

/// Logical OR over per-cluster verdicts; empty input is `false`.
///
/// Consumes the whole sequence rather than short-circuiting on the first
/// `true`, so every underlying answer is observed.
pub fn any_true<I>(verdicts: I) -> bool
where
    I: IntoIterator<Item = bool>,
{
    verdicts.into_iter().fold(false, |any, verdict| any || verdict)
}
