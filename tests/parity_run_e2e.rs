//! End-to-end parity runs: a stub deployment is served on a local port and
//! the real reqwest transport drives the full check roster against it.

#![cfg(feature = "server")]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::{
    extract::State,
    http::{header::COOKIE, HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json, Router,
};
use serde_json::{json, Value};

use parity_check::api::create_auth_router;
use parity_check::auth::{AuthState, IdentityGate, SessionTable};
use parity_check::checks;
use parity_check::identity::{IdentityResolver, IdentityStore, InMemoryIdentityStore, UpsertIdentity};
use parity_check::{CheckStatus, HttpTransport, ParityConfig, ParityOrchestrator};

// ── Stub deployment ─────────────────────────────────────────────

#[derive(Default)]
struct StubDeployment {
    runtime_users: u64,
    failing: HashMap<&'static str, StatusCode>,
    seen: Mutex<Vec<(String, Option<String>)>>,
}

impl StubDeployment {
    fn healthy() -> Self {
        Self {
            runtime_users: 10,
            ..Self::default()
        }
    }

    fn cookie_for(&self, path: &str) -> Option<Option<String>> {
        self.seen
            .lock()
            .unwrap()
            .iter()
            .find(|(p, _)| p == path)
            .map(|(_, cookie)| cookie.clone())
    }
}

fn list(n: usize) -> Value {
    Value::Array(
        (0..n)
            .map(|i| json!({ "id": i, "firstName": format!("Friend{}", i), "imageUrl": format!("/img/{}.png", i) }))
            .collect(),
    )
}

async fn deployment(
    State(stub): State<Arc<StubDeployment>>,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    let path = uri.path().to_string();
    let cookie = headers
        .get(COOKIE)
        .and_then(|v| v.to_str().ok())
        .map(String::from);
    stub.seen.lock().unwrap().push((path.clone(), cookie));

    if let Some(status) = stub.failing.get(path.as_str()) {
        return (*status, "unavailable").into_response();
    }

    let body = match path.as_str() {
        "/api/debug/parity-report" => json!({
            "demoUser": {
                "exists": true, "hasProfile": true,
                "friendCount": 6, "rsvpCount": 4, "interactionCount": 9
            },
            "databaseFingerprint": { "host": "db.internal", "dbName": "campus" },
            "nodeEnv": "production",
            "isPublished": true,
            "demoModeFlags": { "DEMO_BYPASS_AUTH": "false" }
        }),
        "/api/debug/runtime" => json!({
            "counts": {
                "users": stub.runtime_users, "items": 40, "events": 20,
                "rsvps": 10, "friendships": 5, "profiles": 12
            }
        }),
        "/api/recommendations/academic" => json!({ "recommendations": list(6) }),
        "/api/events/for-you" => list(12),
        "/api/friends" => list(3),
        "/api/explore/map-data" => json!({ "events": list(14), "clubs": list(6) }),
        "/api/taste-profile" => json!({ "onboardingComplete": true, "topClusters": ["robotics"] }),
        _ => return StatusCode::NOT_FOUND.into_response(),
    };
    Json(body).into_response()
}

/// Serve the stub plus the real identity route (strict mode, one session).
async fn spawn_deployment(stub: Arc<StubDeployment>) -> String {
    let store = Arc::new(InMemoryIdentityStore::new());
    store
        .upsert_identity(UpsertIdentity {
            id: "user-7".into(),
            email: Some("ana@example.edu".into()),
            first_name: Some("Ana".into()),
            last_name: Some("Ruiz".into()),
            profile_image_url: None,
        })
        .await
        .unwrap();

    let mut sessions = SessionTable::default();
    sessions.insert("tok-7", "user-7");
    let auth = AuthState::new(IdentityGate::Strict, Arc::new(sessions));
    let resolver = IdentityResolver::new(store, false);

    let app: Router = create_auth_router(resolver, auth)
        .merge(Router::new().fallback(deployment).with_state(stub));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn orchestrator(base_url: &str, cookie: Option<&str>) -> ParityOrchestrator<HttpTransport> {
    let mut config = ParityConfig::new(base_url).unwrap();
    if let Some(cookie) = cookie {
        config = config.with_session_cookie(cookie);
    }
    ParityOrchestrator::new(HttpTransport::new(&config).unwrap())
}

// ── Tests ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_healthy_deployment_all_pass() {
    let stub = Arc::new(StubDeployment::healthy());
    let base = spawn_deployment(stub.clone()).await;

    let state = orchestrator(&base, Some("sid=tok-7")).run_all().await.unwrap();

    for check in state.checks() {
        assert_eq!(check.status, CheckStatus::Pass, "{}: {}", check.name, check.detail);
    }
    assert_eq!(state.pass_count(), 8);
    assert_eq!(
        state.get(checks::AUTH_STATUS).unwrap().detail,
        "Logged in as Ana Ruiz (user-7)"
    );
    assert_eq!(
        state.last_raw_report().unwrap()["databaseFingerprint"]["dbName"],
        "campus"
    );
}

#[tokio::test]
async fn test_cookies_only_sent_to_credentialed_endpoints() {
    let stub = Arc::new(StubDeployment::healthy());
    let base = spawn_deployment(stub.clone()).await;

    orchestrator(&base, Some("sid=tok-7")).run_all().await.unwrap();

    assert_eq!(stub.cookie_for("/api/debug/parity-report"), Some(None));
    assert_eq!(stub.cookie_for("/api/debug/runtime"), Some(None));
    assert_eq!(
        stub.cookie_for("/api/friends"),
        Some(Some("sid=tok-7".to_string()))
    );
    assert_eq!(
        stub.cookie_for("/api/taste-profile"),
        Some(Some("sid=tok-7".to_string()))
    );
}

#[tokio::test]
async fn test_missing_session_fails_only_auth_status() {
    let stub = Arc::new(StubDeployment::healthy());
    let base = spawn_deployment(stub).await;

    let state = orchestrator(&base, None).run_all().await.unwrap();

    let auth = state.get(checks::AUTH_STATUS).unwrap();
    assert_eq!(auth.status, CheckStatus::Fail);
    assert_eq!(auth.detail, "Auth returned 401");
    assert_eq!(state.fail_count(), 1);
    assert_eq!(state.pass_count(), 7);
}

#[tokio::test]
async fn test_unavailable_endpoint_reports_status_code() {
    let stub = Arc::new(StubDeployment {
        runtime_users: 10,
        failing: HashMap::from([("/api/explore/map-data", StatusCode::SERVICE_UNAVAILABLE)]),
        ..StubDeployment::default()
    });
    let base = spawn_deployment(stub).await;

    let state = orchestrator(&base, Some("sid=tok-7")).run_all().await.unwrap();

    let map = state.get(checks::MAP_DATA).unwrap();
    assert_eq!(map.status, CheckStatus::Fail);
    assert!(map.detail.contains("503"), "{}", map.detail);
    assert_eq!(
        state.get(checks::PROFILE_DATA).unwrap().status,
        CheckStatus::Pass
    );
}

#[tokio::test]
async fn test_runtime_one_user_short_fails() {
    let stub = Arc::new(StubDeployment {
        runtime_users: 9,
        ..StubDeployment::default()
    });
    let base = spawn_deployment(stub).await;

    let state = orchestrator(&base, Some("sid=tok-7")).run_all().await.unwrap();

    let runtime = state.get(checks::RUNTIME_INFO).unwrap();
    assert_eq!(runtime.status, CheckStatus::Fail);
    assert!(runtime.detail.starts_with("Users=9 "), "{}", runtime.detail);
}

#[tokio::test]
async fn test_unreachable_deployment_fails_every_check() {
    // Bind then drop to get a port with nothing listening.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let state = orchestrator(&format!("http://{}", addr), None)
        .run_all()
        .await
        .unwrap();

    assert_eq!(state.fail_count(), 8);
    assert!(state.is_settled());
    assert!(state.last_raw_report().is_none());
}
