// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared test helpers: an in-process fake Strava API and app builders.

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Router,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use strava_export::config::Config;
use strava_export::routes::create_router;
use strava_export::services::StravaService;
use strava_export::AppState;

pub const TEST_ACCESS_TOKEN: &str = "access-token-1";

/// Canned status and body for one endpoint.
#[derive(Clone)]
pub struct Canned {
    pub status: u16,
    pub body: String,
}

#[allow(dead_code)]
impl Canned {
    pub fn ok(body: &str) -> Self {
        Self {
            status: 200,
            body: body.to_string(),
        }
    }

    pub fn status(status: u16, body: &str) -> Self {
        Self {
            status,
            body: body.to_string(),
        }
    }
}

/// Responses and request log of the fake server.
pub struct FakeState {
    pub token: Mutex<Canned>,
    pub athlete: Mutex<Canned>,
    pub activities: Mutex<Canned>,
    pub streams: Mutex<Canned>,

    pub token_requests: AtomicUsize,
    pub athlete_requests: AtomicUsize,
    pub activity_requests: AtomicUsize,
    pub stream_requests: AtomicUsize,

    pub last_token_form: Mutex<Option<HashMap<String, String>>>,
    pub last_activities_query: Mutex<Option<HashMap<String, String>>>,
    pub last_streams_query: Mutex<Option<HashMap<String, String>>>,
    pub last_stream_activity: Mutex<Option<u64>>,
    pub last_authorization: Mutex<Option<String>>,
}

impl FakeState {
    fn new() -> Self {
        Self {
            token: Mutex::new(Canned::ok(&format!(
                r#"{{"token_type":"Bearer","access_token":"{}","scope":"read,activity:read_all","athlete":{{"id":12345}}}}"#,
                TEST_ACCESS_TOKEN
            ))),
            athlete: Mutex::new(Canned::ok(r#"{"id":12345,"firstname":"Ada"}"#)),
            activities: Mutex::new(Canned::ok("[]")),
            streams: Mutex::new(Canned::ok("{}")),
            token_requests: AtomicUsize::new(0),
            athlete_requests: AtomicUsize::new(0),
            activity_requests: AtomicUsize::new(0),
            stream_requests: AtomicUsize::new(0),
            last_token_form: Mutex::new(None),
            last_activities_query: Mutex::new(None),
            last_streams_query: Mutex::new(None),
            last_stream_activity: Mutex::new(None),
            last_authorization: Mutex::new(None),
        }
    }
}

/// Handle to a running fake Strava server.
#[derive(Clone)]
pub struct FakeStrava {
    pub base_url: String,
    pub state: Arc<FakeState>,
}

#[allow(dead_code)]
impl FakeStrava {
    /// Start the fake on an ephemeral localhost port.
    pub async fn start() -> Self {
        let state = Arc::new(FakeState::new());

        let app = Router::new()
            .route("/oauth/token", post(token))
            .route("/api/v3/athlete", get(athlete))
            .route("/api/v3/athlete/activities", get(activities))
            .route("/api/v3/activities/{id}/streams", get(streams))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind fake Strava server");
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            state,
        }
    }

    pub fn config(&self) -> Config {
        Config::test_default(&self.base_url)
    }

    pub fn set_token(&self, canned: Canned) {
        *self.state.token.lock().unwrap() = canned;
    }

    pub fn set_athlete(&self, canned: Canned) {
        *self.state.athlete.lock().unwrap() = canned;
    }

    pub fn set_activities(&self, canned: Canned) {
        *self.state.activities.lock().unwrap() = canned;
    }

    pub fn set_streams(&self, canned: Canned) {
        *self.state.streams.lock().unwrap() = canned;
    }

    pub fn token_requests(&self) -> usize {
        self.state.token_requests.load(Ordering::SeqCst)
    }

    pub fn athlete_requests(&self) -> usize {
        self.state.athlete_requests.load(Ordering::SeqCst)
    }

    pub fn activity_requests(&self) -> usize {
        self.state.activity_requests.load(Ordering::SeqCst)
    }

    pub fn stream_requests(&self) -> usize {
        self.state.stream_requests.load(Ordering::SeqCst)
    }
}

fn reply(slot: &Mutex<Canned>) -> Response {
    let canned = slot.lock().unwrap().clone();
    (
        StatusCode::from_u16(canned.status).unwrap(),
        [(header::CONTENT_TYPE, "application/json")],
        canned.body,
    )
        .into_response()
}

fn record_auth(state: &FakeState, headers: &HeaderMap) {
    let auth = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .map(String::from);
    *state.last_authorization.lock().unwrap() = auth;
}

async fn token(
    State(state): State<Arc<FakeState>>,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    state.token_requests.fetch_add(1, Ordering::SeqCst);
    *state.last_token_form.lock().unwrap() = Some(form);
    reply(&state.token)
}

async fn athlete(State(state): State<Arc<FakeState>>, headers: HeaderMap) -> Response {
    state.athlete_requests.fetch_add(1, Ordering::SeqCst);
    record_auth(&state, &headers);
    reply(&state.athlete)
}

async fn activities(
    State(state): State<Arc<FakeState>>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    state.activity_requests.fetch_add(1, Ordering::SeqCst);
    record_auth(&state, &headers);
    *state.last_activities_query.lock().unwrap() = Some(query);
    reply(&state.activities)
}

async fn streams(
    State(state): State<Arc<FakeState>>,
    headers: HeaderMap,
    Path(id): Path<u64>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    state.stream_requests.fetch_add(1, Ordering::SeqCst);
    record_auth(&state, &headers);
    *state.last_stream_activity.lock().unwrap() = Some(id);
    *state.last_streams_query.lock().unwrap() = Some(query);
    reply(&state.streams)
}

/// Build a Strava service pointed at the fake.
#[allow(dead_code)]
pub fn test_service(fake: &FakeStrava) -> StravaService {
    StravaService::new(&fake.config()).expect("Failed to build Strava service")
}

/// Create a test app wired to the fake Strava server.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app(fake: &FakeStrava) -> (Router, Arc<AppState>) {
    create_test_app_with(fake.config())
}

#[allow(dead_code)]
pub fn create_test_app_with(config: Config) -> (Router, Arc<AppState>) {
    let strava = StravaService::new(&config).expect("Failed to build Strava service");
    let state = Arc::new(AppState { config, strava });

    (create_router(state.clone()), state)
}

/// Read a response body as UTF-8 text.
#[allow(dead_code)]
pub async fn body_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// One activity record as Strava returns it.
#[allow(dead_code)]
pub fn activity_json(
    id: u64,
    name: &str,
    distance: Option<f64>,
    moving_time: Option<i64>,
    average_heartrate: Option<f64>,
) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "name": name,
        "sport_type": "Run",
        "start_date_local": "2024-01-15T07:30:00Z",
        "distance": distance,
        "moving_time": moving_time,
        "average_heartrate": average_heartrate,
        "max_heartrate": average_heartrate.map(|hr| hr + 20.0),
    })
}
