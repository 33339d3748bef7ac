// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Strava API client for fetching activities and heart-rate streams.
//!
//! Handles:
//! - Access token refresh from the configured refresh token
//! - In-memory token caching for one hour
//! - Optional `/athlete` check before listing activities
//! - Activity listing and per-activity stream fetching

use crate::config::Config;
use crate::error::AppError;
use crate::models::{Activity, Credential, HeartRateStream, StreamSet, TokenRefreshResponse};
use crate::time_utils::lower_bound_timestamp;
use chrono::{DateTime, Duration, Utc};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tokio::sync::Mutex;

/// How long a refreshed access token is reused before refreshing again.
pub const TOKEN_CACHE_TTL_SECS: i64 = 60 * 60;

/// Strava API client.
#[derive(Clone)]
pub struct StravaClient {
    http: reqwest::Client,
    token_url: String,
    base_url: String,
    client_id: String,
    client_secret: String,
}

impl StravaClient {
    /// Create a new Strava client from configuration.
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.http_timeout_secs))
            .build()
            .map_err(|e| AppError::Internal(anyhow::anyhow!("HTTP client init failed: {}", e)))?;

        Ok(Self {
            http,
            token_url: config.token_url.clone(),
            base_url: config.api_base_url.clone(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
        })
    }

    /// Exchange a refresh token for a new access token.
    pub async fn refresh_token(&self, refresh_token: &str) -> Result<Credential, AppError> {
        let response = self
            .http
            .post(&self.token_url)
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
            ])
            .send()
            .await
            .map_err(|e| AppError::StravaApi(format!("Token refresh request failed: {}", e)))?;

        let token: TokenRefreshResponse = check_response_json(response, |status, body| {
            AppError::TokenRefresh { status, body }
        })
        .await?;

        Ok(token.into())
    }

    /// Lightweight check that the access token is accepted.
    pub async fn check_athlete(&self, access_token: &str) -> Result<(), AppError> {
        let url = format!("{}/athlete", self.base_url);

        let response = self
            .http
            .get(&url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AppError::StravaApi(e.to_string()))?;

        check_response(response, |status, body| AppError::SanityCheck { status, body }).await
    }

    /// List activities started after `after` (Unix timestamp).
    pub async fn list_activities(
        &self,
        access_token: &str,
        after: i64,
        per_page: u32,
    ) -> Result<Vec<Activity>, AppError> {
        let url = format!("{}/athlete/activities", self.base_url);

        let response = self
            .http
            .get(&url)
            .bearer_auth(access_token)
            .query(&[("after", after.to_string()), ("per_page", per_page.to_string())])
            .send()
            .await
            .map_err(|e| AppError::StravaApi(e.to_string()))?;

        check_response_json(response, |status, body| AppError::ActivityFetch {
            status,
            body,
        })
        .await
    }

    /// Get the heart-rate and time streams for an activity.
    pub async fn get_streams(
        &self,
        access_token: &str,
        activity_id: u64,
    ) -> Result<StreamSet, AppError> {
        let url = format!("{}/activities/{}/streams", self.base_url, activity_id);

        let response = self
            .http
            .get(&url)
            .bearer_auth(access_token)
            .query(&[("keys", "heartrate,time"), ("key_by_type", "true")])
            .send()
            .await
            .map_err(|e| AppError::StravaApi(e.to_string()))?;

        check_response_json(response, |status, body| AppError::StreamFetch { status, body })
            .await
    }
}

/// Check response status, mapping failures through `on_error`.
///
/// Strava answers these calls with 200; any other status, including other
/// 2xx codes, is a failure.
async fn check_response(
    response: reqwest::Response,
    on_error: impl FnOnce(u16, String) -> AppError,
) -> Result<(), AppError> {
    if response.status() == StatusCode::OK {
        return Ok(());
    }

    Err(error_from_response(response, on_error).await)
}

/// Check response and parse JSON body.
async fn check_response_json<T: DeserializeOwned>(
    response: reqwest::Response,
    on_error: impl FnOnce(u16, String) -> AppError,
) -> Result<T, AppError> {
    if response.status() != StatusCode::OK {
        return Err(error_from_response(response, on_error).await);
    }

    response
        .json()
        .await
        .map_err(|e| AppError::StravaApi(format!("JSON parse error: {}", e)))
}

/// Capture status and raw body of a failed response.
async fn error_from_response(
    response: reqwest::Response,
    on_error: impl FnOnce(u16, String) -> AppError,
) -> AppError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();

    // Rate limit - surfaced like any other failure, the user retries by hand
    if status == 429 {
        tracing::warn!("Strava rate limit hit (429)");
    }

    on_error(status, body)
}

// ─────────────────────────────────────────────────────────────────────────────
// TokenManager - cached access token
// ─────────────────────────────────────────────────────────────────────────────

/// Cached access token with the time it was obtained.
#[derive(Debug, Clone)]
pub struct CachedToken {
    pub credential: Credential,
    pub obtained_at: DateTime<Utc>,
    pub ttl: Duration,
}

impl CachedToken {
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.obtained_at + self.ttl
    }

    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at()
    }
}

/// Owns the refresh token and the single cached access token.
pub struct TokenManager {
    client: StravaClient,
    refresh_token: String,
    ttl: Duration,
    /// Held across the refresh call so concurrent requests wait for one
    /// exchange instead of each starting their own.
    cache: Mutex<Option<CachedToken>>,
}

impl TokenManager {
    pub fn new(client: StravaClient, refresh_token: String) -> Self {
        Self::with_ttl(client, refresh_token, Duration::seconds(TOKEN_CACHE_TTL_SECS))
    }

    pub fn with_ttl(client: StravaClient, refresh_token: String, ttl: Duration) -> Self {
        Self {
            client,
            refresh_token,
            ttl,
            cache: Mutex::new(None),
        }
    }

    /// Return the cached credential, refreshing it if the cache window lapsed.
    pub async fn get_access_token(&self) -> Result<Credential, AppError> {
        let mut cache = self.cache.lock().await;
        let now = Utc::now();

        if let Some(cached) = cache.as_ref() {
            if cached.is_fresh(now) {
                return Ok(cached.credential.clone());
            }
            tracing::debug!(obtained_at = %cached.obtained_at, "Cached token expired");
        }

        tracing::info!("Refreshing Strava access token");
        let credential = match self.client.refresh_token(&self.refresh_token).await {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(error = %e, "Strava token refresh failed");
                return Err(e);
            }
        };

        tracing::info!(
            scope = %credential.scope,
            athlete_id = ?credential.athlete_id,
            "Token refreshed and cached"
        );

        *cache = Some(CachedToken {
            credential: credential.clone(),
            obtained_at: now,
            ttl: self.ttl,
        });

        Ok(credential)
    }

    /// Drop the cached credential so the next call refreshes.
    pub async fn invalidate(&self) {
        let mut cache = self.cache.lock().await;
        if cache.take().is_some() {
            tracing::info!("Token cache cleared");
        }
    }

    /// Current cache entry, if still fresh.
    pub async fn cached(&self) -> Option<CachedToken> {
        let cache = self.cache.lock().await;
        cache.as_ref().filter(|c| c.is_fresh(Utc::now())).cloned()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// StravaService - High-level service with token management
// ─────────────────────────────────────────────────────────────────────────────

/// High-level Strava service that manages the token and the API calls the
/// dashboard needs.
#[derive(Clone)]
pub struct StravaService {
    client: StravaClient,
    tokens: Arc<TokenManager>,
    athlete_check: bool,
}

impl StravaService {
    /// Create a new Strava service from configuration.
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let client = StravaClient::new(config)?;
        let tokens = Arc::new(TokenManager::new(
            client.clone(),
            config.refresh_token.clone(),
        ));

        Ok(Self {
            client,
            tokens,
            athlete_check: config.athlete_check,
        })
    }

    /// Token manager shared by all clones of this service.
    pub fn tokens(&self) -> &TokenManager {
        &self.tokens
    }

    /// Get a valid access credential (cached for one hour).
    pub async fn get_access_token(&self) -> Result<Credential, AppError> {
        self.tokens.get_access_token().await
    }

    /// Fetch activities from the last `days_back` days.
    ///
    /// An empty list is a valid result.
    pub async fn fetch_activities(
        &self,
        days_back: u32,
        per_page: u32,
    ) -> Result<Vec<Activity>, AppError> {
        let credential = self.get_access_token().await?;

        if self.athlete_check {
            self.client.check_athlete(&credential.access_token).await?;
        }

        let after = lower_bound_timestamp(Utc::now(), days_back);
        tracing::debug!(days_back, after, per_page, "Listing activities");

        let activities = self
            .client
            .list_activities(&credential.access_token, after, per_page)
            .await?;

        tracing::info!(days_back, count = activities.len(), "Fetched activities");
        Ok(activities)
    }

    /// Fetch the heart-rate stream for an activity.
    ///
    /// Activities without heart-rate data yield an empty stream.
    pub async fn fetch_heartrate(&self, activity_id: u64) -> Result<HeartRateStream, AppError> {
        let credential = self.get_access_token().await?;

        let streams = self
            .client
            .get_streams(&credential.access_token, activity_id)
            .await?;

        let stream = HeartRateStream::from_streams(streams);
        tracing::info!(activity_id, points = stream.len(), "Fetched heart-rate stream");
        Ok(stream)
    }
}
