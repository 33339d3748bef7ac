// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod chart;
pub mod export;
pub mod strava;

pub use export::ActivityRow;
pub use strava::{CachedToken, StravaClient, StravaService, TokenManager};
