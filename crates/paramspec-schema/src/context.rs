//! Per-call validation context.
//!
//! A [`ValidationContext`] binds one revision-validation call to the cleaned
//! baseline it runs against. It is created inside the call, borrowed
//! read-only, and dropped when the call returns, so concurrent calls on the
//! same compiled schemas never share it.

use std::collections::BTreeMap;

use crate::cleaned::CleanedBaseline;
use crate::rules::{BoundResolver, ResolvedValue};
use crate::types::{describe_labels, Entry, LabelAssignment};

pub struct ValidationContext<'a> {
    baseline: &'a CleanedBaseline,
    /// Entries of the revision under validation that cleaned successfully.
    revision: &'a BTreeMap<String, Vec<Entry>>,
}

impl<'a> ValidationContext<'a> {
    pub fn new(baseline: &'a CleanedBaseline, revision: &'a BTreeMap<String, Vec<Entry>>) -> Self {
        Self { baseline, revision }
    }

    pub fn baseline(&self) -> &'a CleanedBaseline {
        self.baseline
    }

    /// Values of `param` applicable to an entry labeled `labels`.
    ///
    /// A candidate applies when every dimension the entry assigns (other than
    /// `exclude`) is either unassigned on the candidate or carries the same
    /// label. A revision entry replaces the baseline entry with the identical
    /// label assignment and adds to the rest; every match is returned.
    pub fn lookup(
        &self,
        param: &str,
        labels: &LabelAssignment,
        exclude: Option<&str>,
    ) -> Result<Vec<ResolvedValue>, String> {
        let proposed = self.revision.get(param).map(Vec::as_slice).unwrap_or(&[]);
        if !self.baseline.contains(param) && proposed.is_empty() {
            return Err(format!("`{param}` is not in the baseline"));
        }

        let baseline = self.baseline.entries(param);
        let same_labels = |a: &Entry, b: &Entry| a.labels == b.labels;
        let found: Vec<ResolvedValue> = baseline
            .iter()
            .map(|b| proposed.iter().find(|p| same_labels(p, b)).unwrap_or(b))
            .chain(
                proposed
                    .iter()
                    .filter(|p| !baseline.iter().any(|b| same_labels(p, b))),
            )
            .filter(|e| e.applies_to(labels, exclude))
            .map(|e| ResolvedValue {
                labels: e.labels.clone(),
                value: e.value.clone(),
            })
            .collect();

        if found.is_empty() {
            let mut scope = labels.clone();
            if let Some(dim) = exclude {
                scope.remove(dim);
            }
            return Err(format!(
                "no entry of `{param}` matches {}",
                describe_labels(&scope)
            ));
        }
        Ok(found)
    }

    /// Resolver for reference bounds of one entry.
    pub(crate) fn resolver<'c>(
        &'c self,
        labels: &'c LabelAssignment,
        exclude: Option<&'c str>,
    ) -> EntryResolver<'c, 'a> {
        EntryResolver {
            context: self,
            labels,
            exclude,
        }
    }
}

/// Resolves reference bounds at one entry's label assignment.
pub(crate) struct EntryResolver<'c, 'a> {
    context: &'c ValidationContext<'a>,
    labels: &'c LabelAssignment,
    exclude: Option<&'c str>,
}

impl BoundResolver for EntryResolver<'_, '_> {
    fn resolve(&self, param: &str) -> Result<Vec<ResolvedValue>, String> {
        self.context.lookup(param, self.labels, self.exclude)
    }
}
