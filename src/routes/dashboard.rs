// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Server-rendered dashboard page.
//!
//! Each request runs the whole pipeline: token, activities, and optionally
//! the heart-rate stream of the selected activity. The first failure is
//! rendered as a diagnostic and nothing below it is drawn.

use crate::error::{body_as_details, AppError};
use crate::models::Credential;
use crate::routes::{DEFAULT_DAYS_BACK, MAX_DAYS_BACK, MIN_DAYS_BACK, NO_ACTIVITIES_WARNING};
use crate::services::chart::heartrate_svg;
use crate::services::export::{self, format_number, ActivityRow};
use crate::AppState;
use axum::{
    extract::{rejection::QueryRejection, Query, State},
    response::{Html, Redirect},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use std::fmt::Write;
use std::sync::Arc;

pub const TITLE: &str = "Strava Export Dashboard";
pub const NO_STREAM_INFO: &str = "No heart-rate stream for this activity.";
pub const CACHE_CLEARED: &str = "Cache cleared – run again.";

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(dashboard))
        .route("/token/clear", post(clear_cache))
}

/// Raw dashboard query. Values are parsed leniently so a hand-edited URL
/// still renders the page.
#[derive(Deserialize, Default)]
pub struct DashboardQuery {
    days: Option<String>,
    /// Selected activity ID
    activity: Option<String>,
    /// Set by the "Show heart rate" button
    show_hr: Option<String>,
    cleared: Option<String>,
}

impl DashboardQuery {
    /// Days back, clamped to the slider range. Unparseable values fall back
    /// to the default.
    fn days(&self) -> u32 {
        self.days
            .as_deref()
            .and_then(|d| d.trim().parse::<i64>().ok())
            .map(|d| d.clamp(MIN_DAYS_BACK as i64, MAX_DAYS_BACK as i64) as u32)
            .unwrap_or(DEFAULT_DAYS_BACK)
    }

    fn activity(&self) -> Option<u64> {
        self.activity.as_deref().and_then(|a| a.trim().parse().ok())
    }

    fn show_hr(&self) -> bool {
        is_set(self.show_hr.as_deref())
    }

    fn cleared(&self) -> bool {
        is_set(self.cleared.as_deref())
    }
}

fn is_set(flag: Option<&str>) -> bool {
    matches!(flag.map(str::trim), Some("true" | "1" | "on"))
}

/// Clear the token cache and go back to the dashboard.
async fn clear_cache(State(state): State<Arc<AppState>>) -> Redirect {
    state.strava.tokens().invalidate().await;
    Redirect::to("/?cleared=true")
}

/// Render the dashboard.
async fn dashboard(
    State(state): State<Arc<AppState>>,
    query: Result<Query<DashboardQuery>, QueryRejection>,
) -> Html<String> {
    let params = query.map(|Query(q)| q).unwrap_or_default();
    let days = params.days();

    let mut page = Page::new();
    page.controls(days, params.cleared());

    // Render stops at the first failure or at an empty result
    let _ = render_pipeline(&state, &mut page, days, &params).await;

    Html(page.finish())
}

async fn render_pipeline(
    state: &AppState,
    page: &mut Page,
    days: u32,
    params: &DashboardQuery,
) -> Option<()> {
    let credential = page.check(state.strava.get_access_token().await)?;
    page.token_status(&credential);

    let activities = page.check(
        state
            .strava
            .fetch_activities(days, state.config.per_page)
            .await,
    )?;

    if activities.is_empty() {
        page.warning(NO_ACTIVITIES_WARNING);
        return None;
    }

    let rows = export::to_rows(&activities);
    page.activity_table(&rows, days);

    // A stale selection from a wider range falls back to the first row
    let selected = params
        .activity()
        .filter(|id| rows.iter().any(|r| r.id == *id))
        .unwrap_or(rows[0].id);
    page.activity_picker(&rows, days, selected);

    if params.show_hr() {
        let stream = page.check(state.strava.fetch_heartrate(selected).await)?;
        match page.check(heartrate_svg(&stream).map_err(AppError::from))? {
            Some(svg) => page.heartrate_chart(selected, &svg),
            None => page.info(NO_STREAM_INFO),
        }
    }

    Some(())
}

/// HTML page under construction.
struct Page {
    html: String,
}

impl Page {
    fn new() -> Self {
        let mut html = String::new();
        let _ = write!(
            html,
            "<!doctype html>\n<html lang=\"en\"><head><meta charset=\"utf-8\">\
             <title>{title}</title><style>{css}</style></head><body>\
             <h1>{title}</h1>",
            title = TITLE,
            css = STYLE
        );
        Self { html }
    }

    fn finish(mut self) -> String {
        self.html.push_str("</body></html>\n");
        self.html
    }

    /// Record an error as a diagnostic, returning the value on success.
    fn check<T>(&mut self, result: Result<T, AppError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(error = %e, "Dashboard request failed");
                self.error(&e);
                None
            }
        }
    }

    fn controls(&mut self, days: u32, cleared: bool) {
        self.html.push_str(
            "<form method=\"post\" action=\"/token/clear\">\
             <button type=\"submit\">Clear cache</button></form>",
        );
        if cleared {
            self.notice("success", CACHE_CLEARED);
        }
        let _ = write!(
            self.html,
            "<form method=\"get\" action=\"/\"><label>Days back ({min}–{max}): \
             <input type=\"range\" name=\"days\" min=\"{min}\" max=\"{max}\" value=\"{days}\"> \
             <strong>{days}</strong></label> <button type=\"submit\">Fetch</button></form>",
            min = MIN_DAYS_BACK,
            max = MAX_DAYS_BACK,
            days = days
        );
    }

    fn token_status(&mut self, credential: &Credential) {
        let scope = if credential.scope.is_empty() {
            "(unknown)".to_string()
        } else {
            credential.scope.clone()
        };
        let athlete = credential
            .athlete_id
            .map(|id| id.to_string())
            .unwrap_or_else(|| "(unknown)".to_string());

        self.notice(
            "info",
            &format!("Token OK • Scopes: {} • Athlete: {}", scope, athlete),
        );
    }

    fn activity_table(&mut self, rows: &[ActivityRow], days: u32) {
        self.html.push_str("<h2>Your activities</h2><table><thead><tr>");
        for column in export::ACTIVITY_COLUMNS {
            let _ = write!(self.html, "<th>{}</th>", column);
        }
        self.html.push_str("</tr></thead><tbody>");

        for r in rows {
            let _ = write!(
                self.html,
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
                r.id,
                escape(&r.name),
                escape(&r.date),
                cell(r.distance_km),
                cell(r.time_min),
                cell(r.avg_hr),
                cell(r.max_hr)
            );
        }
        self.html.push_str("</tbody></table>");

        let _ = write!(
            self.html,
            "<p><a href=\"/api/activities.csv?days={}\" download=\"{}\">Download CSV</a></p>",
            days,
            export::ACTIVITIES_CSV_FILENAME
        );
    }

    fn activity_picker(&mut self, rows: &[ActivityRow], days: u32, selected: u64) {
        let _ = write!(
            self.html,
            "<h2>Heart rate for an activity</h2><form method=\"get\" action=\"/\">\
             <input type=\"hidden\" name=\"days\" value=\"{}\">\
             <label>Activity ID: <select name=\"activity\">",
            days
        );
        for r in rows {
            let _ = write!(
                self.html,
                "<option value=\"{id}\"{sel}>{id}</option>",
                id = r.id,
                sel = if r.id == selected { " selected" } else { "" }
            );
        }
        self.html.push_str(
            "</select></label> <button type=\"submit\" name=\"show_hr\" value=\"true\">\
             Show heart rate</button></form>",
        );
    }

    fn heartrate_chart(&mut self, activity_id: u64, svg: &str) {
        self.html.push_str("<div class=\"hr-chart\">");
        self.html.push_str(svg);
        self.html.push_str("</div>");
        let filename = export::heartrate_csv_filename(activity_id);
        let _ = write!(
            self.html,
            "<p><a href=\"/api/activities/{}/heartrate.csv\" download=\"{}\">Download HR CSV</a></p>",
            activity_id, filename
        );
    }

    fn warning(&mut self, message: &str) {
        self.notice("warning", message);
    }

    fn info(&mut self, message: &str) {
        self.notice("info", message);
    }

    fn notice(&mut self, class: &str, message: &str) {
        let _ = write!(
            self.html,
            "<div class=\"notice {}\">{}</div>",
            class,
            escape(message)
        );
    }

    /// Diagnostic box. Token refresh failures get their own heading so the
    /// user knows to check their credentials rather than retry.
    fn error(&mut self, err: &AppError) {
        let (class, heading) = match err {
            AppError::TokenRefresh { .. } => ("error token-error", "Token refresh failed"),
            AppError::SanityCheck { .. } => ("error api-error", "Athlete check failed"),
            AppError::ActivityFetch { .. } => ("error api-error", "Activity request failed"),
            AppError::StreamFetch { .. } => ("error api-error", "Heart-rate stream request failed"),
            _ => ("error api-error", "Request failed"),
        };

        let _ = write!(self.html, "<div class=\"{}\">", class);
        match err.upstream() {
            Some((status, body)) => {
                // Token failures show the provider's body verbatim
                let details = match (err, body_as_details(body)) {
                    (AppError::TokenRefresh { .. }, _) | (_, serde_json::Value::String(_)) => {
                        body.to_string()
                    }
                    (_, json) => {
                        serde_json::to_string_pretty(&json).unwrap_or_else(|_| body.to_string())
                    }
                };
                let _ = write!(
                    self.html,
                    "<h3>{} (HTTP {})</h3><pre>{}</pre>",
                    heading,
                    status,
                    escape(&details)
                );
            }
            None => {
                let _ = write!(
                    self.html,
                    "<h3>{}</h3><pre>{}</pre>",
                    heading,
                    escape(&err.to_string())
                );
            }
        }
        self.html.push_str("</div>");
    }
}

fn cell(value: Option<f64>) -> String {
    value.map(format_number).unwrap_or_default()
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

const STYLE: &str = "body{font-family:system-ui,sans-serif;margin:2rem;max-width:1100px}\
table{border-collapse:collapse;width:100%}th,td{border:1px solid #ddd;padding:4px 8px;text-align:left}\
.notice{padding:8px 12px;margin:8px 0;border-radius:4px}.info{background:#e8f0fe}\
.success{background:#e6f4ea}.warning{background:#fef7e0}\
.error{padding:8px 12px;margin:8px 0;border-radius:4px;background:#fce8e6}\
.token-error{border-left:6px solid #a50e0e}.api-error{border-left:6px solid #e37400}\
pre{white-space:pre-wrap}.hr-chart svg{max-width:100%;height:auto}";
