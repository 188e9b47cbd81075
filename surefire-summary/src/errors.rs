// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::output::{NO_HEADING_TARGET, StderrStyles};
use owo_colors::OwoColorize;
use std::error::Error;
use surefire_index::errors::{
    CollectError, ConfigParseError, ReportParseError, SerializeDetailsError,
};
use thiserror::Error;
use tracing::error;

pub(crate) type Result<T, E = ExpectedError> = std::result::Result<T, E>;

/// Documented exit codes for `surefire-summary` failures.
///
/// Unknown or unexpected failures always result in exit code 1.
pub enum SurefireExitCode {}

impl SurefireExitCode {
    /// No errors occurred.
    pub const OK: i32 = 0;

    /// Writing the summary to stdout failed.
    pub const WRITE_OUTPUT_ERROR: i32 = 1;

    /// The configuration could not be read.
    pub const SETUP_ERROR: i32 = 2;

    /// A report could not be read, and malformed reports abort the run.
    pub const MALFORMED_REPORT: i32 = 3;
}

// Note that the #[error()] strings are mostly placeholder messages -- the expected way to print out
// errors is with the display_to_stderr method, which colorizes errors.

/// An expected error that aborted the run.
#[derive(Debug, Error)]
#[doc(hidden)]
pub enum ExpectedError {
    #[error("config parse error")]
    ConfigParseError {
        #[from]
        err: ConfigParseError,
    },
    #[error("collect error")]
    CollectError {
        #[from]
        err: CollectError,
    },
    #[error("error serializing test details")]
    SerializeDetailsError {
        #[from]
        err: SerializeDetailsError,
    },
    #[error("error serializing JSON output")]
    JsonSerializeError {
        #[source]
        err: serde_json::Error,
    },
    #[error("error writing output")]
    WriteOutputError {
        #[source]
        err: std::io::Error,
    },
}

impl ExpectedError {
    /// Returns the exit code for the process.
    pub fn process_exit_code(&self) -> i32 {
        match self {
            Self::ConfigParseError { .. } => SurefireExitCode::SETUP_ERROR,
            Self::CollectError { .. } => SurefireExitCode::MALFORMED_REPORT,
            Self::SerializeDetailsError { .. }
            | Self::JsonSerializeError { .. }
            | Self::WriteOutputError { .. } => SurefireExitCode::WRITE_OUTPUT_ERROR,
        }
    }

    /// Displays this error to stderr.
    pub fn display_to_stderr(&self, styles: &StderrStyles) {
        match self {
            Self::ConfigParseError { err } => {
                error!(
                    "failed to parse config file `{}`",
                    err.config_file().style(styles.bold)
                );
            }
            Self::CollectError { err } => {
                let report_error = err.report_error();
                let action = match report_error {
                    ReportParseError::Open(_) => "open",
                    ReportParseError::Malformed(_) => "parse",
                };
                error!(
                    "failed to {action} test report `{}` (after reading {} report(s))\n\
                     (hint: pass `--on-malformed skip` to ignore malformed reports)",
                    report_error.path().style(styles.bold),
                    err.parsed_reports(),
                );
            }
            Self::SerializeDetailsError { err } => {
                error!("{err}");
            }
            Self::JsonSerializeError { .. } => {
                error!("error serializing JSON output");
            }
            Self::WriteOutputError { .. } => {
                error!("error writing output");
            }
        }

        let mut next_error = self.first_cause();
        while let Some(err) = next_error {
            error!(target: NO_HEADING_TARGET, "\nCaused by:\n  {}", err);
            next_error = err.source();
        }
    }

    /// Returns the first error printed under "Caused by".
    fn first_cause(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::ConfigParseError { err } => err.source(),
            // ReportParseError is transparent, so its source would skip the report's own message.
            Self::CollectError { err } => Some(err.report_error() as &dyn Error),
            Self::SerializeDetailsError { err } => err.source(),
            Self::JsonSerializeError { err } => Some(err as &dyn Error),
            Self::WriteOutputError { err } => Some(err as &dyn Error),
        }
    }
}
