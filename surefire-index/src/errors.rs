// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Errors produced by surefire-index.

use camino::{Utf8Path, Utf8PathBuf};
use config::ConfigError;
use std::{error, fmt, io};
use thiserror::Error;

/// A test report is not well-formed XML, or does not have the shape of a JUnit report.
///
/// Returned by [`ReportStreamParser`](crate::ReportStreamParser).
#[derive(Debug, Error)]
#[error("malformed test report `{path}` (at byte {position})")]
pub struct MalformedReportError {
    path: Utf8PathBuf,
    position: u64,
    #[source]
    kind: MalformedReportErrorKind,
}

impl MalformedReportError {
    pub(crate) fn new(
        path: impl Into<Utf8PathBuf>,
        position: u64,
        kind: MalformedReportErrorKind,
    ) -> Self {
        Self {
            path: path.into(),
            position,
            kind,
        }
    }

    /// Returns the path of the report, as given to the parser.
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Returns the byte offset in the report at which the problem was detected.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Returns the kind of problem.
    pub fn kind(&self) -> &MalformedReportErrorKind {
        &self.kind
    }

    /// Consumes `self`, returning the kind of problem.
    pub fn into_kind(self) -> MalformedReportErrorKind {
        self.kind
    }
}

/// The kind of problem found in a [`MalformedReportError`].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum MalformedReportErrorKind {
    /// The report is not well-formed XML, or could not be read.
    #[error("error reading XML")]
    Xml(#[source] quick_xml::Error),

    /// The report has no root element at all.
    #[error("document has no root element")]
    NoRootElement,

    /// The root element is not `<testsuite>` or `<testsuites>`.
    #[error("unexpected root element `<{name}>` (expected `<testsuite>` or `<testsuites>`)")]
    UnexpectedRoot {
        /// The name of the root element.
        name: String,
    },

    /// The report has text outside of its root element.
    #[error("document has text outside of the root element")]
    TextOutsideRoot,

    /// The report has more than one top-level element.
    #[error("document has more than one root element")]
    MultipleRoots,

    /// The report ended before all open elements were closed.
    #[error("document ended with {open_elements} unclosed element(s)")]
    UnexpectedEof {
        /// The number of elements still open.
        open_elements: usize,
    },

    /// A required attribute is missing or blank.
    #[error("`<{element}>` is missing required attribute `{attribute}`")]
    MissingAttribute {
        /// The element the attribute belongs to.
        element: &'static str,
        /// The name of the attribute.
        attribute: &'static str,
    },

    /// An attribute could not be read, for example because of a bad escape sequence.
    #[error("invalid attribute on `<{element}>`: {message}")]
    InvalidAttribute {
        /// The element the attribute belongs to.
        element: String,
        /// A description of the problem.
        message: String,
    },

    /// The `time` attribute of a test case is not a number.
    #[error("invalid time `{input}` for test case `{name}`")]
    InvalidTime {
        /// The name of the test case.
        name: String,
        /// The value of the attribute.
        input: String,
    },
}

/// A test report could not be opened.
#[derive(Debug, Error)]
#[error("failed to open test report `{path}`")]
pub struct ReportOpenError {
    path: Utf8PathBuf,
    #[source]
    err: io::Error,
}

impl ReportOpenError {
    pub(crate) fn new(path: impl Into<Utf8PathBuf>, err: io::Error) -> Self {
        Self {
            path: path.into(),
            err,
        }
    }

    /// Returns the path of the report.
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }
}

/// An error that occurred while parsing a single report.
#[derive(Debug, Error)]
pub enum ReportParseError {
    /// The report could not be opened.
    #[error(transparent)]
    Open(#[from] ReportOpenError),

    /// The report is malformed.
    #[error(transparent)]
    Malformed(#[from] MalformedReportError),
}

impl ReportParseError {
    /// Returns the path of the report that failed.
    pub fn path(&self) -> &Utf8Path {
        match self {
            ReportParseError::Open(err) => err.path(),
            ReportParseError::Malformed(err) => err.path(),
        }
    }
}

/// An error that aborted a collection run.
///
/// Only returned when the malformed-report policy is
/// [`Abort`](crate::config::MalformedReportPolicy::Abort).
#[derive(Debug, Error)]
#[error("collection aborted after {parsed_reports} report(s)")]
pub struct CollectError {
    parsed_reports: usize,
    #[source]
    err: ReportParseError,
}

impl CollectError {
    pub(crate) fn new(parsed_reports: usize, err: ReportParseError) -> Self {
        Self {
            parsed_reports,
            err,
        }
    }

    /// Returns the number of reports that were successfully parsed before the failure.
    pub fn parsed_reports(&self) -> usize {
        self.parsed_reports
    }

    /// Returns the error for the report that aborted the run.
    pub fn report_error(&self) -> &ReportParseError {
        &self.err
    }
}

/// A class identity could not be resolved to a source artifact.
///
/// This is recovered from by publishing against a placeholder artifact.
#[derive(Clone, Debug, Error)]
#[error("source file `{file_name}` not found for class `{identity}`")]
pub struct ResourceNotFoundError {
    identity: String,
    file_name: String,
}

impl ResourceNotFoundError {
    /// Creates a new `ResourceNotFoundError` for the given identity and file name suffix.
    pub fn new(identity: impl Into<String>, suffix: &str) -> Self {
        let identity = identity.into();
        let file_name = format!("{identity}{suffix}");
        Self {
            identity,
            file_name,
        }
    }

    /// Returns the class identity that could not be resolved.
    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Returns the file name that was searched for.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }
}

/// An error that occurred while rendering test details.
#[derive(Debug, Error)]
#[error("error serializing test details")]
pub struct SerializeDetailsError {
    #[source]
    inner: Box<dyn error::Error + Send + Sync>,
}

impl SerializeDetailsError {
    pub(crate) fn new(inner: impl Into<Box<dyn error::Error + Send + Sync>>) -> Self {
        Self {
            inner: inner.into(),
        }
    }
}

/// An error that occurred while parsing the config.
#[derive(Debug, Error)]
#[error("failed to parse config at `{config_file}`")]
pub struct ConfigParseError {
    config_file: Utf8PathBuf,
    #[source]
    kind: ConfigParseErrorKind,
}

impl ConfigParseError {
    pub(crate) fn new(config_file: impl Into<Utf8PathBuf>, kind: ConfigParseErrorKind) -> Self {
        Self {
            config_file: config_file.into(),
            kind,
        }
    }

    /// Returns the config file that failed to parse.
    pub fn config_file(&self) -> &Utf8Path {
        &self.config_file
    }

    /// Returns the kind of error.
    pub fn kind(&self) -> &ConfigParseErrorKind {
        &self.kind
    }
}

/// The kind of [`ConfigParseError`].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigParseErrorKind {
    /// An error occurred while building the config.
    #[error(transparent)]
    BuildError(Box<ConfigError>),

    /// An error occurred while deserializing the config.
    #[error(transparent)]
    DeserializeError(Box<serde_path_to_error::Error<ConfigError>>),

    /// The config deserialized, but contains invalid values.
    #[error(transparent)]
    Validation(ConfigValidationError),
}

/// A config value is out of range.
#[derive(Clone, Debug, Error)]
#[non_exhaustive]
pub enum ConfigValidationError {
    /// `classes.nesting-separator` is empty.
    #[error("classes.nesting-separator must not be empty")]
    EmptyNestingSeparator,

    /// `reports.primary-prefix` or `reports.fallback-prefix` is empty.
    #[error("reports.{key} must not be empty")]
    EmptyReportPrefix {
        /// The key that is empty.
        key: &'static str,
    },

    /// `metrics.density-precision` is too large.
    #[error("metrics.density-precision must be at most {max} (found {found})")]
    DensityPrecisionTooLarge {
        /// The maximum allowed value.
        max: u32,
        /// The configured value.
        found: u32,
    },
}

/// Error returned while parsing a [`MalformedReportPolicy`](crate::config::MalformedReportPolicy)
/// from a string.
#[derive(Clone, Debug, Error)]
#[error(
    "unrecognized value for on-malformed: {input}\n(known values: {})",
    crate::config::MalformedReportPolicy::variants().join(", "),
)]
pub struct MalformedReportPolicyParseError {
    input: String,
}

impl MalformedReportPolicyParseError {
    pub(crate) fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
        }
    }
}

/// Displays an error along with its chain of sources, one per line.
pub struct DisplayErrorChain<E>(E);

impl<E: error::Error> DisplayErrorChain<E> {
    /// Creates a new `DisplayErrorChain`.
    pub fn new(error: E) -> Self {
        Self(error)
    }
}

impl<E: error::Error> fmt::Display for DisplayErrorChain<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)?;
        let mut source = self.0.source();
        while let Some(err) = source {
            write!(f, "\n  caused by: {err}")?;
            source = err.source();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_error_chain() {
        let err = MalformedReportError::new(
            "TEST-Foo.xml",
            17,
            MalformedReportErrorKind::MissingAttribute {
                element: "testcase",
                attribute: "name",
            },
        );
        assert_eq!(
            DisplayErrorChain::new(&err).to_string(),
            "malformed test report `TEST-Foo.xml` (at byte 17)\n  \
             caused by: `<testcase>` is missing required attribute `name`",
        );
    }

    #[test]
    fn resource_not_found_file_name() {
        let err = ResourceNotFoundError::new("UnitTests", ".pas");
        assert_eq!(err.file_name(), "UnitTests.pas");
        assert_eq!(
            err.to_string(),
            "source file `UnitTests.pas` not found for class `UnitTests`",
        );
    }
}
