//! Transport integration tests.
//!
//! These tests run `HttpTransport` and the controller against an in-process
//! axum engine bound to a loopback port.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use greatness_client::transport::{TransitionRequest, TRANSITION_FAILED_DETAIL};
use greatness_client::{
    AnalyticsSink, AnalyticsTracker, ErrorCategory, ErrorClassifier, HttpTransport, Payload,
    SessionId, SubstringClassifier, Transport, TransitionController, TransportError,
};

const SESSION: &str = "sess-42";

// ============================================================================
// Mock engine
// ============================================================================

#[derive(Clone, Default)]
struct Engine {
    state: Arc<Mutex<String>>,
    chapter: Arc<Mutex<u64>>,
    transitions: Arc<Mutex<Vec<Value>>>,
    deleted: Arc<Mutex<Vec<String>>>,
}

async fn create_session(State(engine): State<Engine>) -> Json<Value> {
    *engine.state.lock().unwrap() = "welcome".to_string();
    Json(json!({"session_id": SESSION}))
}

async fn get_session(State(engine): State<Engine>, Path(id): Path<String>) -> Response {
    if id != SESSION {
        return (StatusCode::NOT_FOUND, Json(json!({"detail": "Session not found"})))
            .into_response();
    }
    let state = engine.state.lock().unwrap().clone();
    let chapter = *engine.chapter.lock().unwrap();
    Json(json!({
        "session_id": SESSION,
        "state": state,
        "data": {},
        "character": null,
        "total_cost": 0.0042,
        "ui_data": {"title": format!("Screen {state}"), "chapter": chapter}
    }))
    .into_response()
}

async fn delete_session(State(engine): State<Engine>, Path(id): Path<String>) -> Json<Value> {
    engine.deleted.lock().unwrap().push(id);
    Json(json!({"message": "Session deleted"}))
}

async fn transition(State(engine): State<Engine>, Json(body): Json<Value>) -> Response {
    engine.transitions.lock().unwrap().push(body.clone());

    match body["action"].as_str().unwrap_or_default() {
        "begin" => {
            *engine.state.lock().unwrap() = "identity_input".to_string();
            Json(json!({"success": true, "next_state": "identity_input", "data": {}}))
                .into_response()
        }
        "start_chapter" => {
            *engine.state.lock().unwrap() = "chapter_before".to_string();
            *engine.chapter.lock().unwrap() = 2;
            Json(json!({"success": true, "next_state": "chapter_before", "data": {}}))
                .into_response()
        }
        "explode" => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"detail": "Engine returned 500"})),
        )
            .into_response(),
        "invalid" => (
            StatusCode::BAD_REQUEST,
            Json(json!({"detail": "Invalid action 'invalid' for state welcome"})),
        )
            .into_response(),
        "silent" => (StatusCode::BAD_REQUEST, Json(json!({}))).into_response(),
        "garbled" => (StatusCode::BAD_GATEWAY, "<html>bad gateway</html>").into_response(),
        "slow" => {
            tokio::time::sleep(Duration::from_secs(2)).await;
            Json(json!({"success": true})).into_response()
        }
        _ => Json(json!({"success": true})).into_response(),
    }
}

async fn cost(Path(id): Path<String>) -> Json<Value> {
    Json(json!({
        "session_id": id,
        "total_cost_usd": 0.0125,
        "total_tokens": 4200,
        "prompt_tokens": 3000,
        "completion_tokens": 1200,
        "cost_by_state": {"welcome": 0.0, "chapter_before": 0.0125},
        "cost_by_model": {},
        "num_api_calls": 3,
        "average_cost_per_call": 0.0041
    }))
}

async fn timeline(Path(id): Path<String>) -> Json<Value> {
    Json(json!({
        "session_id": id,
        "timeline": [
            {"chapter": 1, "narrative": "You wake.", "transformation": "awareness"},
            {"chapter": 2, "narrative": "You walk."}
        ]
    }))
}

async fn health() -> Json<Value> {
    Json(json!({"status": "healthy"}))
}

async fn spawn_engine() -> (String, Engine) {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let engine = Engine::default();

    let api = Router::new()
        .route("/session", post(create_session))
        .route("/session/{id}", get(get_session).delete(delete_session))
        .route("/transition", post(transition))
        .route("/cost/{id}", get(cost))
        .route("/timeline/{id}", get(timeline))
        .route("/health", get(health));
    let app = Router::new().nest("/api", api).with_state(engine.clone());

    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (format!("http://{addr}/api"), engine)
}

/// Address with nothing listening on it.
async fn dead_address() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}/api")
}

#[derive(Default)]
struct RecordingSink(Mutex<Vec<String>>);

impl AnalyticsSink for RecordingSink {
    fn track_event(&self, name: &str) {
        self.0.lock().unwrap().push(name.to_string());
    }
}

impl RecordingSink {
    fn events(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

fn request(action: &str) -> TransitionRequest {
    TransitionRequest::new(SessionId::from(SESSION), action, Payload::new())
}

// ============================================================================
// HttpTransport Tests
// ============================================================================

#[tokio::test]
async fn test_create_and_fetch_state() {
    let (url, _engine) = spawn_engine().await;
    let transport = HttpTransport::new(url).unwrap();

    let created = transport.create_session().await.unwrap();
    assert_eq!(created.session_id.as_str(), SESSION);

    let snapshot = transport.fetch_state(&created.session_id).await.unwrap();
    assert_eq!(snapshot.state, "welcome");
    assert_eq!(snapshot.ui_data["title"], "Screen welcome");
    assert!(snapshot.character.is_none());
    assert!((snapshot.total_cost - 0.0042).abs() < f64::EPSILON);
}

#[tokio::test]
async fn test_trailing_slash_in_base_url() {
    let (url, _engine) = spawn_engine().await;
    let transport = HttpTransport::new(format!("{url}/")).unwrap();

    assert!(transport.base_url().ends_with("/api"));
    assert!(transport.create_session().await.is_ok());
}

#[tokio::test]
async fn test_fetch_unknown_session_is_status_error() {
    let (url, _engine) = spawn_engine().await;
    let transport = HttpTransport::new(url).unwrap();

    let err = transport
        .fetch_state(&SessionId::from("missing"))
        .await
        .unwrap_err();

    match err {
        TransportError::Status { status, endpoint } => {
            assert_eq!(status, 404);
            assert_eq!(endpoint, "/api/session/missing");
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_transition_request_body() {
    let (url, engine) = spawn_engine().await;
    let transport = HttpTransport::new(url).unwrap();

    let mut data = Payload::new();
    data.insert("admired_person".into(), json!("Seneca"));
    let result = transport
        .submit_transition(&TransitionRequest::new(
            SessionId::from(SESSION),
            "begin",
            data,
        ))
        .await
        .unwrap();

    assert!(result.success);
    assert_eq!(result.next_state.unwrap(), "identity_input");

    let sent = engine.transitions.lock().unwrap().clone();
    assert_eq!(
        sent,
        vec![json!({
            "session_id": SESSION,
            "action": "begin",
            "data": {"admired_person": "Seneca"}
        })]
    );
}

#[tokio::test]
async fn test_transition_rejected_with_detail() {
    let (url, _engine) = spawn_engine().await;
    let transport = HttpTransport::new(url).unwrap();

    let err = transport
        .submit_transition(&request("invalid"))
        .await
        .unwrap_err();

    assert!(matches!(err, TransportError::Rejected { status: 400, .. }));
    assert_eq!(
        err.to_string(),
        "Invalid action 'invalid' for state welcome"
    );
}

#[tokio::test]
async fn test_transition_rejected_without_detail() {
    let (url, _engine) = spawn_engine().await;
    let transport = HttpTransport::new(url).unwrap();

    let err = transport
        .submit_transition(&request("silent"))
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), TRANSITION_FAILED_DETAIL);
}

#[tokio::test]
async fn test_transition_rejected_with_unreadable_body() {
    let (url, _engine) = spawn_engine().await;
    let transport = HttpTransport::new(url).unwrap();

    let err = transport
        .submit_transition(&request("garbled"))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        TransportError::Rejected { status: 502, ref detail } if detail == "Unknown error"
    ));
}

#[tokio::test]
async fn test_transition_timeout() {
    let (url, _engine) = spawn_engine().await;
    let transport = HttpTransport::with_timeout(url, Duration::from_millis(200)).unwrap();

    let err = transport
        .submit_transition(&request("slow"))
        .await
        .unwrap_err();

    assert!(matches!(err, TransportError::Timeout(_)));
    assert_eq!(
        SubstringClassifier.classify(&err.to_string()).category,
        ErrorCategory::Timeout
    );
}

#[tokio::test]
async fn test_connection_refused_is_network_error() {
    let transport = HttpTransport::new(dead_address().await).unwrap();

    let err = transport.create_session().await.unwrap_err();

    assert!(matches!(err, TransportError::Network(_)));
}

#[tokio::test]
async fn test_error_text_leaves_out_request_url() {
    let transport = HttpTransport::new(format!("{}500", dead_address().await)).unwrap();

    let err = transport.create_session().await.unwrap_err();
    let raw = err.to_string();

    assert!(matches!(err, TransportError::Network(_)));
    assert!(!raw.contains("api500"), "raw text: {raw}");
    assert!(!raw.contains("127.0.0.1"), "raw text: {raw}");
    assert_ne!(
        SubstringClassifier.classify(&raw).category,
        ErrorCategory::Server
    );
}

#[tokio::test]
async fn test_missing_session_with_500_in_id_is_not_server_error() {
    let (url, _engine) = spawn_engine().await;
    let transport = HttpTransport::new(url).unwrap();

    let err = transport
        .fetch_state(&SessionId::from("lost-500"))
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "HTTP 404");
    assert!(matches!(
        err,
        TransportError::Status { status: 404, ref endpoint } if endpoint == "/api/session/lost-500"
    ));
    assert_eq!(
        SubstringClassifier.classify(&err.to_string()).category,
        ErrorCategory::Generic
    );
}

#[tokio::test]
async fn test_session_id_is_percent_encoded() {
    let (url, _engine) = spawn_engine().await;
    let transport = HttpTransport::new(url).unwrap();

    let err = transport
        .fetch_state(&SessionId::from("sess-42?view=full"))
        .await
        .unwrap_err();

    assert!(matches!(err, TransportError::Status { status: 404, .. }));
}

#[tokio::test]
async fn test_reports_and_delete() {
    let (url, engine) = spawn_engine().await;
    let transport = HttpTransport::new(url).unwrap();
    let id = SessionId::from(SESSION);

    let report = transport.fetch_cost(&id).await.unwrap();
    assert_eq!(report.num_api_calls, 3);
    assert_eq!(report.total_tokens, 4200);
    assert_eq!(report.cost_by_state.len(), 2);

    let events = transport.fetch_timeline(&id).await.unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].transformation.as_deref(), Some("awareness"));
    assert!(events[1].transformation.is_none());

    transport.health().await.unwrap();

    transport.delete_session(&id).await.unwrap();
    assert_eq!(engine.deleted.lock().unwrap().as_slice(), [SESSION]);
}

// ============================================================================
// Controller over HTTP Tests
// ============================================================================

#[tokio::test]
async fn test_controller_session_flow() {
    let (url, _engine) = spawn_engine().await;
    let sink = Arc::new(RecordingSink::default());
    let controller = TransitionController::new(
        Arc::new(HttpTransport::new(url).unwrap()),
        AnalyticsTracker::new(Some(sink.clone())),
    );

    let session = controller.create_session().await.unwrap();
    assert_eq!(session.id.as_str(), SESSION);
    assert_eq!(session.state, "welcome");
    assert_eq!(sink.events(), vec!["welcome_viewed"]);

    controller.submit("begin", Payload::new()).await.unwrap();
    assert_eq!(controller.session().unwrap().state, "identity_input");

    controller
        .submit("start_chapter", Payload::new())
        .await
        .unwrap();
    let view = controller.view();
    assert!(!view.loading);
    assert!(view.error.is_none());
    assert_eq!(view.state().unwrap(), "chapter_before");

    assert_eq!(
        sink.events(),
        vec![
            "welcome_viewed",
            "identity_input_viewed",
            "chapter_before_ch2_viewed"
        ]
    );
}

#[tokio::test]
async fn test_controller_rejection_keeps_state() {
    let (url, _engine) = spawn_engine().await;
    let controller = TransitionController::new(
        Arc::new(HttpTransport::new(url).unwrap()),
        AnalyticsTracker::disabled(),
    );
    controller.create_session().await.unwrap();

    let err = controller
        .submit("explode", Payload::new())
        .await
        .unwrap_err();

    assert_eq!(err.category, ErrorCategory::Server);
    let view = controller.view();
    assert_eq!(view.error.unwrap().error.category, ErrorCategory::Server);
    assert_eq!(view.session.unwrap().state, "welcome");
    assert!(!view.loading);
}

#[tokio::test]
async fn test_controller_create_against_dead_engine() {
    let controller = TransitionController::new(
        Arc::new(HttpTransport::new(dead_address().await).unwrap()),
        AnalyticsTracker::disabled(),
    );

    let err = controller.create_session().await.unwrap_err();

    assert!(err.message.starts_with("Failed to create session: "));
    let view = controller.view();
    assert!(view.session.is_none());
    assert!(!view.loading);
    assert!(!view.error.unwrap().auto_dismiss);
}

#[tokio::test]
async fn test_controller_end_session() {
    let (url, engine) = spawn_engine().await;
    let controller = TransitionController::new(
        Arc::new(HttpTransport::new(url).unwrap()),
        AnalyticsTracker::disabled(),
    );
    controller.health().await.unwrap();
    controller.create_session().await.unwrap();

    controller.end_session().await.unwrap();

    assert!(controller.session().is_none());
    assert_eq!(engine.deleted.lock().unwrap().len(), 1);
}
