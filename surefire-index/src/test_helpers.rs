// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use proptest::prelude::*;
use std::time::Duration;

/// Durations up to a few hours, at millisecond granularity.
pub(crate) fn arb_duration() -> impl Strategy<Value = Duration> {
    (0u64..10_000_000).prop_map(Duration::from_millis)
}
