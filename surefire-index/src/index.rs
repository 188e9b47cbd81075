// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The per-class index that reports are aggregated into.

use crate::report::{ClassReport, OutcomeDelta, TestCaseResult};
use std::collections::{BTreeMap, btree_map};

/// Aggregated test outcomes, keyed by class identity.
///
/// Each class identity appears at most once. Recording the same identity again (for example
/// because a class is split across several reports, or was rerun) accumulates into the existing
/// [`ClassReport`] rather than replacing it.
///
/// Identities are iterated in lexicographic order.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct TestIndex {
    reports: BTreeMap<String, ClassReport>,
}

impl TestIndex {
    /// Creates a new, empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `delta` to the report for `identity`, creating the report if necessary.
    pub fn record(&mut self, identity: impl Into<String>, delta: OutcomeDelta) {
        self.reports
            .entry(identity.into())
            .or_default()
            .add_delta(delta);
    }

    /// Adds a single test case to the report for its class identity.
    ///
    /// The test case is kept so that per-test details can be rendered later.
    pub fn record_result(&mut self, result: TestCaseResult) {
        self.reports
            .entry(result.classname.clone())
            .or_default()
            .add_result(result);
    }

    /// Returns the known class identities.
    pub fn class_identities(&self) -> impl ExactSizeIterator<Item = &str> + '_ {
        self.reports.keys().map(String::as_str)
    }

    /// Returns the report for `identity`, if anything was recorded for it.
    pub fn report_for(&self, identity: &str) -> Option<&ClassReport> {
        self.reports.get(identity)
    }

    /// Moves everything recorded for `source` into `dest`.
    ///
    /// After this call, `source` is absent from the index. If `source` is absent this does
    /// nothing, and if `dest` is absent it is created. Merging an identity into itself does
    /// nothing.
    pub fn merge(&mut self, source: &str, dest: &str) {
        if source == dest {
            return;
        }
        if let Some(report) = self.reports.remove(source) {
            self.reports
                .entry(dest.to_owned())
                .or_default()
                .absorb(report);
        }
    }

    /// Merges every report in `other` into this index.
    pub fn absorb(&mut self, other: TestIndex) {
        for (identity, report) in other.reports {
            self.absorb_report(identity, report);
        }
    }

    /// Returns the number of class identities in the index.
    pub fn len(&self) -> usize {
        self.reports.len()
    }

    /// Returns true if nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }

    /// Iterates over identities and their reports.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            inner: self.reports.iter(),
        }
    }

    fn absorb_report(&mut self, identity: String, report: ClassReport) {
        match self.reports.entry(identity) {
            btree_map::Entry::Vacant(entry) => {
                entry.insert(report);
            }
            btree_map::Entry::Occupied(mut entry) => {
                entry.get_mut().absorb(report);
            }
        }
    }
}

impl IntoIterator for TestIndex {
    type Item = (String, ClassReport);
    type IntoIter = btree_map::IntoIter<String, ClassReport>;

    fn into_iter(self) -> Self::IntoIter {
        self.reports.into_iter()
    }
}

impl<'a> IntoIterator for &'a TestIndex {
    type Item = (&'a str, &'a ClassReport);
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl FromIterator<(String, ClassReport)> for TestIndex {
    fn from_iter<T: IntoIterator<Item = (String, ClassReport)>>(iter: T) -> Self {
        let mut index = TestIndex::new();
        for (identity, report) in iter {
            index.absorb_report(identity, report);
        }
        index
    }
}

/// An iterator over the entries of a [`TestIndex`].
///
/// Returned by [`TestIndex::iter`].
#[derive(Clone, Debug)]
pub struct Iter<'a> {
    inner: btree_map::Iter<'a, String, ClassReport>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (&'a str, &'a ClassReport);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner
            .next()
            .map(|(identity, report)| (identity.as_str(), report))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for Iter<'_> {}
