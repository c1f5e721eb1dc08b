//! In-process stub of the Agents Bar API for integration tests.

#![allow(dead_code)]

use agents_bar::settings::ApiConfig;
use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

pub const AGENT: &str = "CartPoleAgent";
pub const TOKEN: &str = "bearer abc123";
/// Agent name whose existence check always fails with 503.
pub const BROKEN_AGENT: &str = "BrokenAgent";

/// Canned behaviour of the stub service.
#[derive(Clone)]
pub struct StubConfig {
    pub login_status: StatusCode,
    /// Raw login body replacing the canned JSON answer.
    pub login_body: Option<String>,
    pub exists_status: StatusCode,
    pub act_status: StatusCode,
    pub act_body: Value,
    pub step_status: StatusCode,
}

impl Default for StubConfig {
    fn default() -> Self {
        Self {
            login_status: StatusCode::OK,
            login_body: None,
            exists_status: StatusCode::OK,
            act_status: StatusCode::OK,
            act_body: json!({ "action": [1.0] }),
            step_status: StatusCode::ACCEPTED,
        }
    }
}

/// A request as seen by the stub.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Login {
        content_type: Option<String>,
        accept: Option<String>,
        authorization: Option<String>,
        body: String,
    },
    Exists {
        agent: String,
        authorization: Option<String>,
    },
    Act {
        agent: String,
        noise: Option<String>,
        authorization: Option<String>,
        body: Value,
    },
    Step {
        agent: String,
        authorization: Option<String>,
        body: Value,
    },
}

pub struct Stub {
    config: StubConfig,
    calls: Mutex<Vec<Call>>,
}

impl Stub {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

fn header_value(headers: &HeaderMap, name: header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

async fn login(State(stub): State<Arc<Stub>>, headers: HeaderMap, body: String) -> Response {
    stub.record(Call::Login {
        content_type: header_value(&headers, header::CONTENT_TYPE),
        accept: header_value(&headers, header::ACCEPT),
        authorization: header_value(&headers, header::AUTHORIZATION),
        body,
    });
    let status = stub.config.login_status;
    if let Some(raw) = &stub.config.login_body {
        return (status, [(header::CONTENT_TYPE, "text/html")], raw.clone()).into_response();
    }
    if status == StatusCode::OK {
        (status, Json(json!({ "token_type": "bearer", "access_token": "abc123" }))).into_response()
    } else {
        (status, Json(json!({ "detail": "Incorrect username or password" }))).into_response()
    }
}

async fn exists(State(stub): State<Arc<Stub>>, Path(agent): Path<String>, headers: HeaderMap) -> StatusCode {
    let status = match agent.as_str() {
        AGENT => stub.config.exists_status,
        BROKEN_AGENT => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::NOT_FOUND,
    };
    stub.record(Call::Exists {
        agent,
        authorization: header_value(&headers, header::AUTHORIZATION),
    });
    status
}

async fn act(
    State(stub): State<Arc<Stub>>,
    Path(agent): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    body: String,
) -> impl IntoResponse {
    stub.record(Call::Act {
        agent,
        noise: query.get("noise").cloned(),
        authorization: header_value(&headers, header::AUTHORIZATION),
        body: serde_json::from_str(&body).unwrap_or(Value::Null),
    });
    (stub.config.act_status, Json(stub.config.act_body.clone()))
}

async fn step(
    State(stub): State<Arc<Stub>>,
    Path(agent): Path<String>,
    headers: HeaderMap,
    body: String,
) -> impl IntoResponse {
    stub.record(Call::Step {
        agent,
        authorization: header_value(&headers, header::AUTHORIZATION),
        body: serde_json::from_str(&body).unwrap_or(Value::Null),
    });
    (stub.config.step_status, Json(json!({})))
}

/// Serves the stub on an ephemeral port and returns a matching client config.
pub async fn start(config: StubConfig) -> (ApiConfig, Arc<Stub>) {
    let stub = Arc::new(Stub {
        config,
        calls: Mutex::new(Vec::new()),
    });

    let app = Router::new()
        .route("/api/v1/login/access-token", post(login))
        .route("/api/v1/agents/:agent", get(exists))
        .route("/api/v1/agents/:agent/act", post(act))
        .route("/api/v1/agents/:agent/step", post(step))
        .with_state(stub.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let api = ApiConfig {
        base_url: format!("http://{}/api/v1/", addr),
        verify_tls: true,
        timeout_seconds: 5,
    };
    (api, stub)
}
