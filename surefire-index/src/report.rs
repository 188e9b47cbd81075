// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test results read from reports, and the per-class aggregates built from them.

use crate::{details::serialize_details, errors::SerializeDetailsError};
use std::time::Duration;

/// The outcome of a single test case.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum TestStatus {
    /// The test ran and passed.
    Passed,

    /// The test was not run.
    Skipped,

    /// The test ran and hit an *unexpected* issue, such as an uncaught exception.
    Error,

    /// The test ran and an assertion failed.
    Failure,
}

impl TestStatus {
    /// Returns the status string used in test details.
    pub fn details_str(self) -> &'static str {
        match self {
            TestStatus::Passed => "ok",
            TestStatus::Skipped => "skipped",
            TestStatus::Error => "error",
            TestStatus::Failure => "failure",
        }
    }
}

/// A single test execution, as observed in a report.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TestCaseResult {
    /// The class identity this test case belongs to.
    ///
    /// This is the `classname` reported for the test case, possibly compound for nested classes
    /// (e.g. `Outer$Inner`).
    pub classname: String,

    /// The name of the test case.
    pub name: String,

    /// The outcome of the test case.
    pub status: TestStatus,

    /// The time taken by the test case.
    ///
    /// Skipped test cases always have a zero duration.
    pub duration: Duration,

    /// The message attached to a failure, error or skip marker.
    pub message: Option<String>,

    /// The text content of a failure, error or skip marker. Typically a stack trace.
    pub stack_trace: Option<String>,
}

impl TestCaseResult {
    /// Creates a new `TestCaseResult` with a zero duration and no message.
    pub fn new(classname: impl Into<String>, name: impl Into<String>, status: TestStatus) -> Self {
        Self {
            classname: classname.into(),
            name: name.into(),
            status,
            duration: Duration::ZERO,
            message: None,
            stack_trace: None,
        }
    }

    /// Sets the time taken by the test case.
    pub fn set_duration(&mut self, duration: Duration) -> &mut Self {
        self.duration = duration;
        self
    }

    /// Sets the message.
    pub fn set_message(&mut self, message: impl Into<String>) -> &mut Self {
        self.message = Some(message.into());
        self
    }

    /// Sets the stack trace.
    pub fn set_stack_trace(&mut self, stack_trace: impl Into<String>) -> &mut Self {
        self.stack_trace = Some(stack_trace.into());
        self
    }

    /// Returns the delta this test case contributes to its class report.
    pub fn delta(&self) -> OutcomeDelta {
        OutcomeDelta {
            tests: 1,
            skipped: usize::from(self.status == TestStatus::Skipped),
            errors: usize::from(self.status == TestStatus::Error),
            failures: usize::from(self.status == TestStatus::Failure),
            duration: self.duration,
        }
    }
}

/// Counts and time added to a [`ClassReport`] in a single step.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[cfg_attr(test, derive(test_strategy::Arbitrary))]
pub struct OutcomeDelta {
    /// The number of tests.
    #[cfg_attr(test, strategy(0..1000usize))]
    pub tests: usize,

    /// The number of skipped tests.
    #[cfg_attr(test, strategy(0..1000usize))]
    pub skipped: usize,

    /// The number of tests that errored.
    #[cfg_attr(test, strategy(0..1000usize))]
    pub errors: usize,

    /// The number of tests that failed.
    #[cfg_attr(test, strategy(0..1000usize))]
    pub failures: usize,

    /// The time taken.
    #[cfg_attr(test, strategy(crate::test_helpers::arb_duration()))]
    pub duration: Duration,
}

impl OutcomeDelta {
    /// Returns the coordinate-wise sum of `self` and `other`.
    ///
    /// Saturates instead of overflowing.
    pub fn saturating_add(self, other: OutcomeDelta) -> OutcomeDelta {
        OutcomeDelta {
            tests: self.tests.saturating_add(other.tests),
            skipped: self.skipped.saturating_add(other.skipped),
            errors: self.errors.saturating_add(other.errors),
            failures: self.failures.saturating_add(other.failures),
            duration: self.duration.saturating_add(other.duration),
        }
    }
}

/// The aggregate of all test outcomes recorded for one class identity.
///
/// `ClassReport` instances are owned by a [`TestIndex`](crate::TestIndex) and can only be mutated
/// through it.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ClassReport {
    totals: OutcomeDelta,
    results: Vec<TestCaseResult>,
}

impl ClassReport {
    /// Returns the total number of tests, including skipped ones.
    pub fn tests(&self) -> usize {
        self.totals.tests
    }

    /// Returns the number of skipped tests.
    pub fn skipped(&self) -> usize {
        self.totals.skipped
    }

    /// Returns the number of tests that errored.
    pub fn errors(&self) -> usize {
        self.totals.errors
    }

    /// Returns the number of tests that failed.
    pub fn failures(&self) -> usize {
        self.totals.failures
    }

    /// Returns the cumulative time taken by all tests.
    pub fn duration(&self) -> Duration {
        self.totals.duration
    }

    /// Returns all counts and the cumulative duration at once.
    pub fn totals(&self) -> OutcomeDelta {
        self.totals
    }

    /// Returns the individual test cases recorded for this class, in the order they were seen.
    ///
    /// Counts recorded through [`TestIndex::record`](crate::TestIndex::record) have no
    /// corresponding entries here.
    pub fn results(&self) -> &[TestCaseResult] {
        &self.results
    }

    /// Renders the individual test cases as a `<tests-details>` XML document.
    pub fn details_xml(&self) -> Result<String, SerializeDetailsError> {
        serialize_details(&self.results)
    }

    pub(crate) fn add_delta(&mut self, delta: OutcomeDelta) {
        self.totals = self.totals.saturating_add(delta);
    }

    pub(crate) fn add_result(&mut self, result: TestCaseResult) {
        self.add_delta(result.delta());
        self.results.push(result);
    }

    pub(crate) fn absorb(&mut self, other: ClassReport) {
        let ClassReport { totals, results } = other;
        self.add_delta(totals);
        self.results.extend(results);
    }

    pub(crate) fn results_mut(&mut self) -> &mut [TestCaseResult] {
        &mut self.results
    }
}
