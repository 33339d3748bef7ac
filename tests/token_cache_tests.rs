// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Tests for the access token cache.

use chrono::Duration;
use strava_export::error::AppError;
use strava_export::services::{StravaClient, TokenManager};

mod common;
use common::{test_service, Canned, FakeStrava, TEST_ACCESS_TOKEN};

#[tokio::test]
async fn test_token_cached_within_window() {
    let fake = FakeStrava::start().await;
    let strava = test_service(&fake);

    let first = strava.get_access_token().await.unwrap();
    let second = strava.get_access_token().await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first.access_token, TEST_ACCESS_TOKEN);
    assert_eq!(first.scope, "read,activity:read_all");
    assert_eq!(first.athlete_id, Some(12345));
    assert_eq!(fake.token_requests(), 1, "Second call should hit the cache");
}

#[tokio::test]
async fn test_refresh_request_form() {
    let fake = FakeStrava::start().await;
    let strava = test_service(&fake);

    strava.get_access_token().await.unwrap();

    let form = fake.state.last_token_form.lock().unwrap().clone().unwrap();
    assert_eq!(form["grant_type"], "refresh_token");
    assert_eq!(form["client_id"], "test_client_id");
    assert_eq!(form["client_secret"], "test_secret");
    assert_eq!(form["refresh_token"], "test_refresh_token");
}

#[tokio::test]
async fn test_clones_share_cache() {
    let fake = FakeStrava::start().await;
    let strava = test_service(&fake);
    let other = strava.clone();

    strava.get_access_token().await.unwrap();
    other.get_access_token().await.unwrap();

    assert_eq!(fake.token_requests(), 1);
}

#[tokio::test]
async fn test_invalidate_forces_refresh() {
    let fake = FakeStrava::start().await;
    let strava = test_service(&fake);

    strava.get_access_token().await.unwrap();
    assert!(strava.tokens().cached().await.is_some());

    strava.tokens().invalidate().await;
    assert!(strava.tokens().cached().await.is_none());

    strava.get_access_token().await.unwrap();
    assert_eq!(fake.token_requests(), 2);
}

#[tokio::test]
async fn test_expired_entry_is_refreshed() {
    let fake = FakeStrava::start().await;
    let client = StravaClient::new(&fake.config()).unwrap();
    let tokens = TokenManager::with_ttl(client, "test_refresh_token".to_string(), Duration::zero());

    tokens.get_access_token().await.unwrap();
    tokens.get_access_token().await.unwrap();

    assert_eq!(fake.token_requests(), 2);
}

#[tokio::test]
async fn test_cached_entry_expiry_is_one_hour() {
    let fake = FakeStrava::start().await;
    let strava = test_service(&fake);

    strava.get_access_token().await.unwrap();
    let cached = strava.tokens().cached().await.unwrap();

    assert_eq!(cached.expires_at() - cached.obtained_at, Duration::hours(1));
}

#[tokio::test]
async fn test_refresh_failure_carries_status_and_body() {
    let fake = FakeStrava::start().await;
    fake.set_token(Canned::status(401, r#"{"message":"invalid_token"}"#));
    let strava = test_service(&fake);

    let err = strava.get_access_token().await.unwrap_err();

    assert!(err.is_token_refresh_error());
    match err {
        AppError::TokenRefresh { status, body } => {
            assert_eq!(status, 401);
            assert_eq!(body, r#"{"message":"invalid_token"}"#);
        }
        other => panic!("Expected TokenRefresh, got {:?}", other),
    }
}

#[tokio::test]
async fn test_refresh_requires_200() {
    let fake = FakeStrava::start().await;
    fake.set_token(Canned::status(202, r#"{"access_token":"pending"}"#));
    let strava = test_service(&fake);

    let err = strava.get_access_token().await.unwrap_err();

    match err {
        AppError::TokenRefresh { status, body } => {
            assert_eq!(status, 202);
            assert_eq!(body, r#"{"access_token":"pending"}"#);
        }
        other => panic!("Expected TokenRefresh, got {:?}", other),
    }
    assert!(strava.tokens().cached().await.is_none());
}

#[tokio::test]
async fn test_failed_refresh_is_not_cached() {
    let fake = FakeStrava::start().await;
    fake.set_token(Canned::status(500, "boom"));
    let strava = test_service(&fake);

    assert!(strava.get_access_token().await.is_err());

    fake.set_token(Canned::ok(r#"{"access_token":"recovered"}"#));
    let credential = strava.get_access_token().await.unwrap();

    assert_eq!(credential.access_token, "recovered");
    assert_eq!(credential.scope, "");
    assert_eq!(credential.athlete_id, None);
    assert_eq!(fake.token_requests(), 2);
}

#[tokio::test]
async fn test_concurrent_callers_share_one_refresh() {
    let fake = FakeStrava::start().await;
    let strava = test_service(&fake);

    let (a, b, c) = tokio::join!(
        strava.get_access_token(),
        strava.get_access_token(),
        strava.get_access_token()
    );

    assert!(a.is_ok() && b.is_ok() && c.is_ok());
    assert_eq!(fake.token_requests(), 1);
}
