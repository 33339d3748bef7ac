// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Strava Export: a small dashboard over the Strava API
//!
//! Fetches recent activities with a cached OAuth access token, shows them
//! as a table and heart-rate chart, and exports both as CSV.

pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use services::StravaService;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub strava: StravaService,
}
