// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Aggregate JUnit/Surefire XML test reports into per-class metrics.
//!
//! A run goes through these stages:
//!
//! 1. [`ReportScanner`] finds the report files in a directory.
//! 2. [`ReportStreamParser`] reads each report as a stream of [`ReportEvent`]s.
//! 3. Test cases are accumulated into a [`TestIndex`], keyed by class identity.
//! 4. [`Sanitizer`] folds nested classes (`Outer$Inner`) into their enclosing class.
//! 5. [`MetricPublisher`] computes [`ClassMetrics`] for each class and hands them to a
//!    [`MetricSink`], attached to whatever an [`ArtifactResolver`] maps the class to.
//!
//! [`Collector`] runs stages 1 to 4 according to a [`CollectorConfig`](config::CollectorConfig).
//!
//! # Examples
//!
//! ```
//! use surefire_index::{Collector, config::CollectorConfig};
//!
//! let report = r#"
//!     <testsuite name="Calculator" tests="2">
//!         <testcase classname="Calculator" name="adds" time="0.012"/>
//!         <testcase classname="Calculator$Division" name="by_zero" time="0.003">
//!             <failure message="expected an error"/>
//!         </testcase>
//!     </testsuite>
//! "#;
//!
//! let config = CollectorConfig::default();
//! let collector = Collector::new(&config);
//! let index = collector.parse_reader(report.as_bytes(), "TEST-Calculator.xml").unwrap();
//! let index = surefire_index::Sanitizer::default().sanitize(index);
//!
//! let report = index.report_for("Calculator").unwrap();
//! assert_eq!(report.tests(), 2);
//! assert_eq!(report.failures(), 1);
//! assert_eq!(report.duration().as_millis(), 15);
//! ```

mod collector;
pub mod config;
mod details;
pub mod errors;
mod index;
mod metrics;
mod parse;
mod publish;
mod report;
mod sanitize;
mod scanner;
#[cfg(test)]
mod test_helpers;

pub use collector::*;
pub use index::*;
pub use metrics::*;
pub use parse::*;
pub use publish::*;
pub use report::*;
pub use sanitize::*;
pub use scanner::*;
