use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use floor_shared::error::PERSONS_NOT_FOUND;
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::net::TcpListener;

use super::*;

#[derive(Clone, Default)]
struct ServerState {
    last_body: Arc<Mutex<Option<Value>>>,
}

async fn handle_login(Json(body): Json<Value>) -> Json<Value> {
    let identifier = body["identifier1"].as_str().unwrap_or_default().to_string();
    Json(json!({
        "success": {
            "operator1": { "identifier": identifier, "displayName": "Anna Nowak" },
            "operator2": null
        }
    }))
}

async fn handle_create_card(
    State(state): State<ServerState>,
    Json(body): Json<Value>,
) -> Json<Value> {
    let reply = if body["warehouse"] == "A" {
        json!({ "error": PERSONS_NOT_FOUND })
    } else {
        json!({ "success": true, "cardNumber": 17 })
    };
    *state.last_body.lock() = Some(body);
    Json(reply)
}

async fn handle_active_program(Json(body): Json<Value>) -> Json<Value> {
    assert_eq!(body, json!({ "oven": "oven-1" }));
    Json(json!({ "success": { "program": "P-7" } }))
}

async fn handle_active_fault(
    State(state): State<ServerState>,
    Json(body): Json<Value>,
) -> Json<Value> {
    *state.last_body.lock() = Some(body);
    Json(json!({ "success": { "fault": null } }))
}

async fn handle_finish_fault() -> Json<Value> {
    Json(json!({ "success": null }))
}

async fn handle_broken() -> StatusCode {
    StatusCode::INTERNAL_SERVER_ERROR
}

async fn spawn_action_server() -> (String, ServerState) {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let state = ServerState::default();
    let app = Router::new()
        .route("/actions/login", post(handle_login))
        .route("/actions/create-new-card", post(handle_create_card))
        .route("/actions/fetch-active-oven-program", post(handle_active_program))
        .route("/actions/fetch-active-oven-fault", post(handle_active_fault))
        .route("/actions/finish-oven-fault", post(handle_finish_fault))
        .route("/actions/get-oven-processes", post(handle_broken))
        .with_state(state.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (format!("http://{addr}"), state)
}

#[tokio::test]
async fn login_unwraps_success_envelope() {
    let (server_url, _) = spawn_action_server().await;
    let gateway = HttpActionGateway::new(&server_url).expect("gateway");

    let response = gateway
        .login(LoginCredentials {
            identifier1: "1001".to_string(),
            identifier2: None,
            identifier3: None,
        })
        .await
        .expect("login");

    let operator = response.operator1.expect("operator1");
    assert_eq!(operator.identifier, "1001");
    assert_eq!(operator.display_name, "Anna Nowak");
    assert!(response.operator2.is_none());
    assert!(response.operator3.is_none());
}

#[tokio::test]
async fn error_envelope_becomes_gateway_error() {
    let (server_url, state) = spawn_action_server().await;
    let gateway = HttpActionGateway::new(&server_url).expect("gateway");

    let err = gateway
        .create_new_card(vec!["1001".to_string()], "A".to_string(), "1".to_string())
        .await
        .expect_err("error envelope");

    assert!(err.is_gateway(PERSONS_NOT_FOUND));
    assert_eq!(
        state.last_body.lock().clone(),
        Some(json!({ "persons": ["1001"], "warehouse": "A", "sector": "1" }))
    );
}

#[tokio::test]
async fn created_card_number_comes_from_flat_reply() {
    let (server_url, _) = spawn_action_server().await;
    let gateway = HttpActionGateway::new(&server_url).expect("gateway");

    let card = gateway
        .create_new_card(vec!["1001".to_string()], "B".to_string(), "2".to_string())
        .await
        .expect("created");

    assert_eq!(card, CardNumber(17));
}

#[tokio::test]
async fn optional_results_decode() {
    let (server_url, state) = spawn_action_server().await;
    let gateway = HttpActionGateway::new(&server_url).expect("gateway");

    let program = gateway
        .fetch_active_oven_program(OvenId::new("oven-1"))
        .await
        .expect("program");
    assert_eq!(program, Some(ProgramId::new("P-7")));

    let fault = gateway
        .fetch_active_oven_fault(OvenId::new("oven-1"), Locale::De)
        .await
        .expect("fault");
    assert_eq!(fault, None);
    assert_eq!(
        state.last_body.lock().clone(),
        Some(json!({ "oven": "oven-1", "lang": "de" }))
    );

    gateway
        .finish_oven_fault(OvenId::new("oven-1"), vec!["1001".to_string()])
        .await
        .expect("unit success");
}

#[tokio::test]
async fn http_failures_are_network_errors() {
    let (server_url, _) = spawn_action_server().await;
    let gateway = HttpActionGateway::new(&server_url).expect("gateway");

    let err = gateway
        .fetch_oven_processes(OvenId::new("oven-1"))
        .await
        .expect_err("500");
    assert!(matches!(err, ClientError::Network(_)), "unexpected error: {err:?}");

    let err = gateway
        .fetch_oven_fault_types()
        .await
        .expect_err("unrouted action");
    assert!(matches!(err, ClientError::Network(_)), "unexpected error: {err:?}");
}

#[test]
fn base_url_keeps_path_prefix() {
    let gateway = HttpActionGateway::new("http://floor.local/api").expect("gateway");
    assert_eq!(gateway.base_url().as_str(), "http://floor.local/api/");
    assert_eq!(
        gateway
            .base_url()
            .join("actions/login")
            .expect("join")
            .as_str(),
        "http://floor.local/api/actions/login"
    );

    let err = HttpActionGateway::new("not a url").err().expect("invalid url");
    assert!(matches!(err, ClientError::Network(_)));
}
