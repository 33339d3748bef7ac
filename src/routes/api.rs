// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! JSON and CSV API routes.

use crate::error::{AppError, Result};
use crate::routes::{DEFAULT_DAYS_BACK, MAX_DAYS_BACK, MIN_DAYS_BACK, NO_ACTIVITIES_WARNING};
use crate::services::export::{self, ActivityRow};
use crate::time_utils::format_utc_rfc3339;
use crate::AppState;
use axum::{
    extract::{
        rejection::{PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::header,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Strava refuses pages larger than this.
const MAX_PER_PAGE: u32 = 200;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/activities", get(get_activities))
        .route("/api/activities.csv", get(get_activities_csv))
        .route("/api/activities/{id}/heartrate", get(get_heartrate))
        .route("/api/activities/{id}/heartrate.csv", get(get_heartrate_csv))
        .route("/api/token", get(get_token_status).delete(clear_token))
}

// ─── Activities ──────────────────────────────────────────────

#[derive(Deserialize)]
struct ActivitiesQuery {
    /// How many days back to list
    #[serde(default = "default_days")]
    days: u32,
    /// Page size (defaults to the configured value)
    per_page: Option<u32>,
}

fn default_days() -> u32 {
    DEFAULT_DAYS_BACK
}

/// Malformed query strings become JSON `bad_request` errors.
fn parse_query<T>(query: std::result::Result<Query<T>, QueryRejection>) -> Result<T> {
    query
        .map(|Query(params)| params)
        .map_err(|e| AppError::BadRequest(e.body_text()))
}

fn parse_activity_id(path: std::result::Result<Path<u64>, PathRejection>) -> Result<u64> {
    path.map(|Path(id)| id)
        .map_err(|e| AppError::BadRequest(e.body_text()))
}

fn validate_days(days: u32) -> Result<u32> {
    if !(MIN_DAYS_BACK..=MAX_DAYS_BACK).contains(&days) {
        return Err(AppError::BadRequest(format!(
            "'days' must be between {} and {}",
            MIN_DAYS_BACK, MAX_DAYS_BACK
        )));
    }
    Ok(days)
}

fn validate_per_page(per_page: Option<u32>, default: u32) -> Result<u32> {
    match per_page.unwrap_or(default) {
        0 => Err(AppError::BadRequest(
            "'per_page' must be greater than 0".to_string(),
        )),
        n => Ok(n.min(MAX_PER_PAGE)),
    }
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ActivitiesResponse {
    pub days: u32,
    pub count: u32,
    /// Set when the range holds no activities
    pub warning: Option<String>,
    pub activities: Vec<ActivityRow>,
}

async fn fetch_rows(state: &AppState, query: &ActivitiesQuery) -> Result<Vec<ActivityRow>> {
    let days = validate_days(query.days)?;
    let per_page = validate_per_page(query.per_page, state.config.per_page)?;

    let activities = state.strava.fetch_activities(days, per_page).await?;
    Ok(export::to_rows(&activities))
}

/// List activities as table rows.
async fn get_activities(
    State(state): State<Arc<AppState>>,
    query: std::result::Result<Query<ActivitiesQuery>, QueryRejection>,
) -> Result<Json<ActivitiesResponse>> {
    let params = parse_query(query)?;
    tracing::debug!(days = params.days, per_page = ?params.per_page, "Fetching activities");

    let rows = fetch_rows(&state, &params).await?;
    let warning = rows.is_empty().then(|| NO_ACTIVITIES_WARNING.to_string());

    Ok(Json(ActivitiesResponse {
        days: params.days,
        count: rows.len() as u32,
        warning,
        activities: rows,
    }))
}

/// Download the activity table as CSV.
async fn get_activities_csv(
    State(state): State<Arc<AppState>>,
    query: std::result::Result<Query<ActivitiesQuery>, QueryRejection>,
) -> Result<Response> {
    let params = parse_query(query)?;
    let rows = fetch_rows(&state, &params).await?;
    let body = export::activities_csv(&rows).map_err(anyhow::Error::from)?;

    Ok(csv_attachment(export::ACTIVITIES_CSV_FILENAME, body))
}

// ─── Heart Rate ──────────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct HeartRatePoint {
    pub time: i64,
    pub heartrate: i64,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct HeartRateResponse {
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub activity_id: u64,
    pub has_data: bool,
    pub points: Vec<HeartRatePoint>,
}

/// Heart-rate series for one activity.
async fn get_heartrate(
    State(state): State<Arc<AppState>>,
    path: std::result::Result<Path<u64>, PathRejection>,
) -> Result<Json<HeartRateResponse>> {
    let activity_id = parse_activity_id(path)?;
    let stream = state.strava.fetch_heartrate(activity_id).await?;

    Ok(Json(HeartRateResponse {
        activity_id,
        has_data: !stream.is_empty(),
        points: stream
            .points()
            .map(|(time, heartrate)| HeartRatePoint { time, heartrate })
            .collect(),
    }))
}

/// Download one activity's heart-rate series as CSV.
async fn get_heartrate_csv(
    State(state): State<Arc<AppState>>,
    path: std::result::Result<Path<u64>, PathRejection>,
) -> Result<Response> {
    let activity_id = parse_activity_id(path)?;
    let stream = state.strava.fetch_heartrate(activity_id).await?;

    if stream.is_empty() {
        return Err(AppError::NotFound(format!(
            "No heart-rate stream for activity {}",
            activity_id
        )));
    }

    let body = export::heartrate_csv(&stream).map_err(anyhow::Error::from)?;
    Ok(csv_attachment(&export::heartrate_csv_filename(activity_id), body))
}

fn csv_attachment(filename: &str, body: String) -> Response {
    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        body,
    )
        .into_response()
}

// ─── Token Cache ─────────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct TokenStatusResponse {
    pub cached: bool,
    pub scope: Option<String>,
    #[cfg_attr(feature = "binding-generation", ts(type = "number | null"))]
    pub athlete_id: Option<u64>,
    pub obtained_at: Option<String>,
    pub expires_at: Option<String>,
}

/// Describe the cached token without exposing it.
async fn get_token_status(State(state): State<Arc<AppState>>) -> Json<TokenStatusResponse> {
    let response = match state.strava.tokens().cached().await {
        Some(cached) => TokenStatusResponse {
            cached: true,
            scope: Some(cached.credential.scope.clone()),
            athlete_id: cached.credential.athlete_id,
            obtained_at: Some(format_utc_rfc3339(cached.obtained_at)),
            expires_at: Some(format_utc_rfc3339(cached.expires_at())),
        },
        None => TokenStatusResponse {
            cached: false,
            scope: None,
            athlete_id: None,
            obtained_at: None,
            expires_at: None,
        },
    };

    Json(response)
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ClearTokenResponse {
    pub success: bool,
    pub message: String,
}

/// Clear the cached token so the next request refreshes it.
async fn clear_token(State(state): State<Arc<AppState>>) -> Json<ClearTokenResponse> {
    state.strava.tokens().invalidate().await;

    Json(ClearTokenResponse {
        success: true,
        message: "Token cache cleared.".to_string(),
    })
}
