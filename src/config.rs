// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! The Strava credentials are read once at startup. A `.env` file is
//! honoured for local development.

use std::env;
use std::str::FromStr;

const DEFAULT_TOKEN_URL: &str = "https://www.strava.com/oauth/token";
const DEFAULT_API_BASE: &str = "https://www.strava.com/api/v3";

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Secrets ---
    /// Strava OAuth client ID
    pub client_id: String,
    /// Strava OAuth client secret
    pub client_secret: String,
    /// Long-lived refresh token exchanged for access tokens
    pub refresh_token: String,

    // --- Strava endpoints ---
    /// OAuth token endpoint
    pub token_url: String,
    /// REST API base URL (no trailing slash)
    pub api_base_url: String,

    // --- Behaviour ---
    /// Call `/athlete` before listing activities
    pub athlete_check: bool,
    /// Page size for the activity list request
    pub per_page: u32,
    /// Timeout applied to every outbound request
    pub http_timeout_secs: u64,
    /// Server port
    pub port: u16,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let per_page: u32 = parse_var("PER_PAGE", 200)?;
        if per_page == 0 {
            return Err(ConfigError::Invalid("PER_PAGE", "0".to_string()));
        }

        Ok(Self {
            client_id: required("CLIENT_ID")?,
            client_secret: required("CLIENT_SECRET")?,
            refresh_token: required("REFRESH_TOKEN")?,
            token_url: env::var("STRAVA_TOKEN_URL")
                .unwrap_or_else(|_| DEFAULT_TOKEN_URL.to_string()),
            api_base_url: env::var("STRAVA_API_BASE")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| DEFAULT_API_BASE.to_string()),
            athlete_check: parse_var("ATHLETE_CHECK", true)?,
            per_page,
            http_timeout_secs: parse_var("HTTP_TIMEOUT_SECS", 30)?,
            port: parse_var("PORT", 8080)?,
        })
    }

    /// Config for tests, pointing both Strava endpoints at `base_url`.
    pub fn test_default(base_url: &str) -> Self {
        let base_url = base_url.trim_end_matches('/');
        Self {
            client_id: "test_client_id".to_string(),
            client_secret: "test_secret".to_string(),
            refresh_token: "test_refresh_token".to_string(),
            token_url: format!("{}/oauth/token", base_url),
            api_base_url: format!("{}/api/v3", base_url),
            athlete_check: true,
            per_page: 200,
            http_timeout_secs: 5,
            port: 8080,
        }
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name)
        .map(|v| v.trim().to_string())
        .map_err(|_| ConfigError::Missing(name))
}

fn parse_var<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid(name, raw)),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1:?}")]
    Invalid(&'static str, String),
}
