// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Summarize JUnit/Surefire XML test reports as per-class metrics.
//!
//! This is the library behind the `surefire-summary` binary. For the aggregation engine itself,
//! see [`surefire_index`].

#![warn(missing_docs)]

mod app;
mod errors;
mod output;
mod resolver;
mod sink;

#[doc(hidden)]
pub use app::*;
#[doc(hidden)]
pub use errors::*;
#[doc(hidden)]
pub use output::OutputContext;
