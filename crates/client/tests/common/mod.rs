//! In-process stand-in for the map-poster backend.
//!
//! Serves the `/api` routes the client uses from an axum router bound to
//! `127.0.0.1:0`. Job status responses are scripted per test.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

/// Job ID handed out by the mock generate route.
pub const JOB_ID: &str = "42";

/// Body served for every poster download.
pub const POSTER_BYTES: &[u8] = b"\x89PNG\r\n\x1a\nmock-poster";

#[derive(Default)]
pub struct MockBackend {
    /// Status bodies for `JOB_ID`, served in order; the last one repeats.
    statuses: Mutex<VecDeque<Value>>,
    /// Bodies received by `POST /api/generate`.
    pub generate_requests: Mutex<Vec<Value>>,
    pub status_polls: Mutex<usize>,
}

impl MockBackend {
    pub fn with_statuses(statuses: impl IntoIterator<Item = Value>) -> Arc<Self> {
        Arc::new(Self {
            statuses: Mutex::new(statuses.into_iter().collect()),
            ..Self::default()
        })
    }

    pub fn polls(&self) -> usize {
        *self.status_polls.lock().unwrap()
    }
}

/// Start the mock backend and return its base URL.
pub async fn spawn_backend(state: Arc<MockBackend>) -> String {
    let app = Router::new()
        .route("/api/themes", get(list_themes))
        .route("/api/theme/create", post(create_theme))
        .route("/api/theme/{id}", get(get_theme))
        .route("/api/geocode", post(geocode))
        .route("/api/generate", post(generate))
        .route("/api/status/{job_id}", get(status))
        .route("/api/poster/{file}", get(poster))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{addr}")
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

async fn list_themes() -> Json<Value> {
    Json(json!([
        {
            "id": "noir",
            "name": "Noir",
            "description": "Black background, white roads",
            "colors": {
                "bg": "#000000", "text": "#FFFFFF", "water": "#0A0A0A", "parks": "#111111",
                "road_motorway": "#FFFFFF", "road_primary": "#EEEEEE", "road_residential": "#999999"
            }
        },
        {
            "id": "ocean",
            "name": "Ocean",
            "description": "Blue water tones",
            "colors": { "bg": "#E8F4F8", "text": null }
        }
    ]))
}

async fn get_theme(Path(id): Path<String>) -> Response {
    if id != "noir" {
        return error(StatusCode::NOT_FOUND, "Theme not found");
    }
    Json(json!({
        "name": "Noir",
        "description": "Black background, white roads",
        "bg": "#000000",
        "text": "#FFFFFF",
        "road_default": "#CCCCCC"
    }))
    .into_response()
}

async fn create_theme(Json(body): Json<Value>) -> Response {
    let Some(name) = body.get("name").and_then(Value::as_str) else {
        return error(StatusCode::BAD_REQUEST, "Theme name is required");
    };
    Json(json!({
        "success": true,
        "theme_id": name.trim().to_lowercase().replace(' ', "_"),
        "message": format!("Theme \"{}\" created successfully", name.trim()),
    }))
    .into_response()
}

async fn geocode(Json(body): Json<Value>) -> Response {
    match body.get("address").and_then(Value::as_str).unwrap_or("").trim() {
        "" => error(StatusCode::BAD_REQUEST, "Address is required"),
        "nowhere" => error(StatusCode::NOT_FOUND, "Address not found"),
        "offline" => Json(json!({ "success": false, "error": "Geocoder unavailable" })).into_response(),
        _ => Json(json!({
            "success": true,
            "coordinates": { "lat": 48.8566, "lon": 2.3522 },
            "address": "Paris, Île-de-France, France",
            "city": "Paris",
            "country": "France"
        }))
        .into_response(),
    }
}

async fn generate(State(state): State<Arc<MockBackend>>, Json(body): Json<Value>) -> Response {
    state.generate_requests.lock().unwrap().push(body.clone());

    let city = body.get("city").and_then(Value::as_str).unwrap_or("");
    if city.trim().is_empty() {
        return error(StatusCode::BAD_REQUEST, "City and country are required");
    }
    Json(json!({ "success": true, "job_id": JOB_ID })).into_response()
}

async fn status(State(state): State<Arc<MockBackend>>, Path(job_id): Path<String>) -> Response {
    if job_id != JOB_ID {
        return error(StatusCode::NOT_FOUND, "Job not found");
    }
    *state.status_polls.lock().unwrap() += 1;

    let mut statuses = state.statuses.lock().unwrap();
    let body = if statuses.len() > 1 {
        statuses.pop_front()
    } else {
        statuses.front().cloned()
    };
    match body {
        Some(body) => Json(body).into_response(),
        None => error(StatusCode::NOT_FOUND, "Job not found"),
    }
}

async fn poster(Path(file): Path<String>) -> Response {
    if !file.ends_with(".png") {
        return error(StatusCode::NOT_FOUND, "Poster not found");
    }
    ([(CONTENT_TYPE, "image/png")], POSTER_BYTES).into_response()
}
