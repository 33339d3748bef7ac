// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time formatting.

use chrono::{DateTime, Duration, SecondsFormat, Utc};

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Unix timestamp `days_back` days before `now`, used as the `after` bound
/// of the activity list.
pub fn lower_bound_timestamp(now: DateTime<Utc>, days_back: u32) -> i64 {
    (now - Duration::days(i64::from(days_back))).timestamp()
}
