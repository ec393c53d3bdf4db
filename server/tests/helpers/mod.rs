//! Reusable test helpers for HTTP integration tests.
//!
//! Provides `TestApp` for building and sending requests through the full axum
//! router, backed by a temporary data directory and a manual clock.
#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{self, Method, Request, Response};
use axum::Router;
use chrono::{DateTime, TimeZone, Utc};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;
use warden_server::api::{create_router, AppState};
use warden_server::config::Config;
use warden_server::permissions::ManualClock;
use warden_server::service::PermissionService;
use warden_server::settings::{AuthConfig, SettingsStore};

/// Member ID configured as bot owner.
pub const OWNER_ID: &str = "owner-1";
/// Community every helper request is issued in unless stated otherwise.
pub const COMMUNITY_ID: &str = "guild-1";

// ============================================================================
// Test App
// ============================================================================

/// A test application wrapping the full axum router.
pub struct TestApp {
    pub router: Router,
    pub config: Arc<Config>,
    pub clock: ManualClock,
    /// Keeps the data directory alive for the duration of the test.
    pub dir: TempDir,
}

impl TestApp {
    /// Create a test app with an owner configured and the allow-list disabled.
    pub fn new() -> Self {
        Self::with_auth_config(AuthConfig {
            owner: OWNER_ID.into(),
            ..AuthConfig::default()
        })
    }

    /// Create a test app with explicit authorization settings.
    pub fn with_auth_config(auth: AuthConfig) -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let config = Arc::new(Config::default_for_test(dir.path()));
        let settings = SettingsStore::with_config(&config.settings_path, auth);
        let clock = ManualClock::new(start_time());
        let service = PermissionService::new(Arc::clone(&config), settings, Arc::new(clock.clone()));
        let router = create_router(AppState::new(service, Arc::clone(&config)));

        Self {
            router,
            config,
            clock,
            dir,
        }
    }

    /// Build an HTTP request with the given method and URI.
    pub fn request(method: Method, uri: &str) -> http::request::Builder {
        Request::builder().method(method).uri(uri)
    }

    /// Send a request through the router via `tower::ServiceExt::oneshot`.
    pub async fn oneshot(&self, request: Request<Body>) -> Response<Body> {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("oneshot request failed")
    }

    /// POST a JSON body.
    pub async fn post_json(&self, uri: &str, body: &Value) -> Response<Body> {
        let req = Self::request(Method::POST, uri)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.oneshot(req).await
    }

    /// Run a command in [`COMMUNITY_ID`] and return the response.
    pub async fn command(&self, invoker: &Value, command: &str, targets: Targets) -> Response<Body> {
        let body = json!({
            "context": context(invoker, targets.roster),
            "command": command,
            "members": targets.members,
            "roles": targets.roles,
            "argument": targets.argument,
        });
        self.post_json("/api/commands", &body).await
    }

    /// Run a command that must succeed and return its messages.
    pub async fn command_ok(&self, invoker: &Value, command: &str, targets: Targets) -> Vec<String> {
        let resp = self.command(invoker, command, targets).await;
        let status = resp.status();
        let json = body_to_json(resp).await;
        assert_eq!(status, 200, "{command} failed: {json}");
        serde_json::from_value(json["messages"].clone()).expect("messages should be strings")
    }

    /// Query a grant in [`COMMUNITY_ID`].
    pub async fn check(&self, member: &Value, kind: &str) -> Value {
        let uri = format!("/api/communities/{COMMUNITY_ID}/checks");
        let resp = self.post_json(&uri, &json!({ "member": member, "kind": kind })).await;
        assert_eq!(resp.status(), 200);
        body_to_json(resp).await
    }
}

/// Targets and trailing argument of a command.
#[derive(Default)]
pub struct Targets {
    pub members: Vec<Value>,
    pub roles: Vec<String>,
    pub argument: Option<String>,
    pub roster: Vec<Value>,
}

impl Targets {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn members(members: &[&Value]) -> Self {
        Self {
            members: members.iter().map(|m| (*m).clone()).collect(),
            ..Self::default()
        }
    }

    pub fn roles(roles: &[&str]) -> Self {
        Self {
            roles: roles.iter().map(|r| (*r).to_owned()).collect(),
            ..Self::default()
        }
    }

    pub fn argument(mut self, argument: &str) -> Self {
        self.argument = Some(argument.to_owned());
        self
    }

    pub fn roster(mut self, roster: &[&Value]) -> Self {
        self.roster = roster.iter().map(|m| (*m).clone()).collect();
        self
    }
}

// ============================================================================
// Data helpers
// ============================================================================

pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
}

/// A member as the front-end sends it.
pub fn member(id: &str, name: &str, roles: &[&str]) -> Value {
    json!({ "id": id, "name": name, "roles": roles })
}

pub fn owner() -> Value {
    member(OWNER_ID, "boss", &[])
}

pub fn context(invoker: &Value, roster: Vec<Value>) -> Value {
    json!({
        "invoker": invoker,
        "community": { "id": COMMUNITY_ID, "name": "Test Guild" },
        "roster": roster,
        "joined": [
            { "id": COMMUNITY_ID, "name": "Test Guild" },
            { "id": "guild-2", "name": "Other Guild" },
        ],
    })
}

/// Collect a response body and parse it as JSON.
pub async fn body_to_json(response: Response<Body>) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("Failed to collect response body")
        .to_bytes();
    serde_json::from_slice(&bytes).unwrap_or_else(|e| {
        let preview = String::from_utf8_lossy(&bytes);
        panic!("Failed to parse response as JSON: {e}\nBody: {preview}")
    })
}
