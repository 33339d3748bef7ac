// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Strava activity and stream models.

use serde::{Deserialize, Serialize};

/// Summary activity as returned by `GET /athlete/activities`.
///
/// Only the fields the dashboard shows are kept; everything optional on
/// Strava's side is optional here too.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    /// Strava activity ID
    pub id: u64,
    /// Activity name/title
    #[serde(default)]
    pub name: String,
    /// Local start date/time (ISO 8601, as reported by Strava)
    #[serde(default)]
    pub start_date_local: String,
    /// Distance in meters
    #[serde(default)]
    pub distance: Option<f64>,
    /// Moving time in seconds
    #[serde(default)]
    pub moving_time: Option<i64>,
    #[serde(default)]
    pub average_heartrate: Option<f64>,
    #[serde(default)]
    pub max_heartrate: Option<f64>,
}

/// Heart-rate series for one activity, index aligned with `time`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HeartRateStream {
    /// Seconds since activity start
    pub time: Vec<i64>,
    /// Beats per minute
    pub heartrate: Vec<i64>,
}

impl HeartRateStream {
    /// Build a stream from the `key_by_type` response.
    ///
    /// A missing heart-rate channel yields an empty series; a missing time
    /// channel is replaced by `0..heartrate.len()`.
    pub fn from_streams(streams: StreamSet) -> Self {
        let heartrate = streams.heartrate.map(|s| s.data).unwrap_or_default();
        let mut time = streams
            .time
            .map(|s| s.data)
            .unwrap_or_else(|| (0..heartrate.len() as i64).collect());

        let mut heartrate = heartrate;
        let len = time.len().min(heartrate.len());
        time.truncate(len);
        heartrate.truncate(len);

        Self { time, heartrate }
    }

    pub fn is_empty(&self) -> bool {
        self.heartrate.is_empty()
    }

    pub fn len(&self) -> usize {
        self.heartrate.len()
    }

    /// Iterate `(time, heartrate)` pairs.
    pub fn points(&self) -> impl Iterator<Item = (i64, i64)> + '_ {
        self.time.iter().copied().zip(self.heartrate.iter().copied())
    }
}

/// Stream response keyed by type (`key_by_type=true`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StreamSet {
    #[serde(default)]
    pub heartrate: Option<StreamData>,
    #[serde(default)]
    pub time: Option<StreamData>,
}

/// One stream channel.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StreamData {
    #[serde(default)]
    pub data: Vec<i64>,
}
