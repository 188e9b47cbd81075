// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Folding nested classes into the class that encloses them.
//!
//! Test frameworks report nested classes (`Outer$Inner`) separately, but metrics are attributed
//! per source file, and a source file owns all of the classes nested in it.

use crate::index::TestIndex;

/// The separator used by JUnit-style reports for nested classes.
pub const DEFAULT_NESTING_SEPARATOR: &str = "$";

/// Normalizes a [`TestIndex`] so that no identity contains the nesting separator.
#[derive(Clone, Debug)]
pub struct Sanitizer {
    separator: String,
}

impl Sanitizer {
    /// Creates a new `Sanitizer` for the given nesting separator.
    ///
    /// An empty separator disables sanitizing.
    pub fn new(separator: impl Into<String>) -> Self {
        Self {
            separator: separator.into(),
        }
    }

    /// Returns the top-level identity that `identity` is nested in, or `None` if it is not nested.
    ///
    /// The top-level identity is everything before the first separator, so `A$B$C` resolves
    /// directly to `A`, and `$A` to the empty identity.
    pub fn parent_identity<'a>(&self, identity: &'a str) -> Option<&'a str> {
        self.split_nested(identity).map(|(parent, _)| parent)
    }

    /// Folds every nested identity into its top-level identity.
    ///
    /// Each identity is resolved directly to its top-level ancestor, so the result does not
    /// depend on the order in which identities are visited. A nested identity whose parent was
    /// never recorded creates the parent.
    ///
    /// Test cases carried by a folded report are renamed to `<nested part>/<name>` so that they
    /// remain distinguishable in the parent, e.g. test `t` of `A$B` becomes `B/t` in `A`.
    pub fn sanitize(&self, index: TestIndex) -> TestIndex {
        index
            .into_iter()
            .map(|(identity, mut report)| {
                let split = self
                    .split_nested(&identity)
                    .map(|(parent, nested)| (parent.to_owned(), nested.to_owned()));
                match split {
                    Some((parent, nested)) => {
                        for result in report.results_mut() {
                            result.name = format!("{nested}/{}", result.name);
                            result.classname.clone_from(&parent);
                        }
                        (parent, report)
                    }
                    None => (identity, report),
                }
            })
            .collect()
    }

    fn split_nested<'a>(&self, identity: &'a str) -> Option<(&'a str, &'a str)> {
        if self.separator.is_empty() {
            return None;
        }
        identity.split_once(self.separator.as_str())
    }
}

impl Default for Sanitizer {
    fn default() -> Self {
        Self::new(DEFAULT_NESTING_SEPARATOR)
    }
}
