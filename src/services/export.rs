// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Table rows and CSV export.
//!
//! Activities are flattened into [`ActivityRow`]s with derived kilometre and
//! minute columns; rows and heart-rate streams are written as UTF-8 CSV with
//! a header row.

use crate::models::{Activity, HeartRateStream};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Download filename for the activity table.
pub const ACTIVITIES_CSV_FILENAME: &str = "strava_activities.csv";

/// Column names of the activity table, in order.
pub const ACTIVITY_COLUMNS: [&str; 7] = [
    "id",
    "name",
    "date",
    "distance_km",
    "time_min",
    "avg_hr",
    "max_hr",
];

/// Column names of the heart-rate export.
pub const HEARTRATE_COLUMNS: [&str; 2] = ["Time (s)", "HR"];

/// One row of the activity table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ActivityRow {
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub id: u64,
    pub name: String,
    pub date: String,
    pub distance_km: Option<f64>,
    pub time_min: Option<f64>,
    pub avg_hr: Option<f64>,
    pub max_hr: Option<f64>,
}

impl From<&Activity> for ActivityRow {
    fn from(a: &Activity) -> Self {
        Self {
            id: a.id,
            name: a.name.clone(),
            date: a.start_date_local.clone(),
            distance_km: distance_km(a.distance),
            time_min: time_min(a.moving_time),
            avg_hr: a.average_heartrate,
            max_hr: a.max_heartrate,
        }
    }
}

/// Filename for one activity's heart-rate export.
pub fn heartrate_csv_filename(activity_id: u64) -> String {
    format!("hr_{}.csv", activity_id)
}

/// Meters to kilometres, two decimals. Missing or zero distance is `None`.
pub fn distance_km(meters: Option<f64>) -> Option<f64> {
    meters
        .filter(|m| *m != 0.0)
        .map(|m| round_to(m / 1000.0, 2))
}

/// Seconds to minutes, one decimal. Missing or zero time is `None`.
pub fn time_min(seconds: Option<i64>) -> Option<f64> {
    seconds
        .filter(|s| *s != 0)
        .map(|s| round_to(s as f64 / 60.0, 1))
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Build table rows in provider order.
pub fn to_rows(activities: &[Activity]) -> Vec<ActivityRow> {
    activities.iter().map(ActivityRow::from).collect()
}

/// Render the activity table as CSV.
///
/// The header row is written even when there are no rows.
pub fn activities_csv(rows: &[ActivityRow]) -> Result<String, CsvError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());

    writer.write_record(ACTIVITY_COLUMNS)?;
    for row in rows {
        writer.serialize(row)?;
    }

    finish(writer)
}

/// Render a heart-rate stream as CSV.
pub fn heartrate_csv(stream: &HeartRateStream) -> Result<String, CsvError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());

    writer.write_record(HEARTRATE_COLUMNS)?;
    for point in stream.points() {
        writer.serialize(point)?;
    }

    finish(writer)
}

fn finish(writer: csv::Writer<Vec<u8>>) -> Result<String, CsvError> {
    let bytes = writer.into_inner().map_err(|e| e.into_error())?;
    Ok(String::from_utf8(bytes)?)
}

/// Format a float the way a table would show it: integral values keep one
/// decimal place (`10.0`), others print their shortest exact form.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{:.1}", value)
    } else {
        value.to_string()
    }
}

/// CSV read/write errors.
#[derive(Debug, thiserror::Error)]
pub enum CsvError {
    #[error("Unexpected header: {0}")]
    Header(String),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("CSV output is not UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Parse text produced by [`activities_csv`] back into rows.
pub fn parse_activities_csv(text: &str) -> Result<Vec<ActivityRow>, CsvError> {
    let mut reader = csv::Reader::from_reader(text.as_bytes());

    let header = reader.headers()?;
    if header.iter().ne(ACTIVITY_COLUMNS) {
        return Err(CsvError::Header(header.iter().collect::<Vec<_>>().join(",")));
    }

    reader
        .deserialize::<ActivityRow>()
        .map(|row| row.map_err(CsvError::from))
        .collect()
}
