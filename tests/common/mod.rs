//! In-process mock appliance for integration tests
//!
//! Serves a small firewall-alias resource with the appliance's response
//! envelope (`code`, `return`, `message`, `data`) and supports the three
//! authentication methods. Knobs on [`Shared`] let tests force 401s,
//! revoke credentials and slow down responses.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use serde_json::{json, Value};

use apie2e::session::{AuthMethod, Credentials, Scheme, Target, TransportPolicy};

pub const USERNAME: &str = "admin";
pub const PASSWORD: &str = "pfsense";
/// `admin:pfsense` in basic auth form
const BASIC: &str = "Basic YWRtaW46cGZzZW5zZQ==";

pub const PROBE_URI: &str = "/api/v1/system/api";
pub const TOKEN_URI: &str = "/api/v1/access_token";
pub const ALIAS_URI: &str = "/api/v1/firewall/alias";
pub const SLOW_URI: &str = "/api/v1/diagnostics/slow";

/// A request the mock received
#[derive(Debug, Clone)]
pub struct Seen {
    pub method: String,
    pub path: String,
    pub body: Option<Value>,
}

#[derive(Default)]
pub struct Shared {
    pub requests: Mutex<Vec<Seen>>,
    aliases: Mutex<Vec<String>>,
    /// Answer this many resource requests with 401 before serving normally
    pub reject_next: AtomicUsize,
    /// Reject every credential, probe included, once this many resource
    /// requests have been served
    pub revoke_after: Mutex<Option<usize>>,
    revoked: AtomicBool,
    served: AtomicUsize,
    /// Delay for requests to the slow endpoint
    pub slow_ms: AtomicU64,
    tokens_issued: AtomicUsize,
}

impl Shared {
    pub fn seen(&self) -> Vec<Seen> {
        self.requests.lock().unwrap().clone()
    }

    /// Requests to anything but the probe and token endpoints
    pub fn resource_requests(&self) -> Vec<Seen> {
        self.seen()
            .into_iter()
            .filter(|s| s.path != PROBE_URI && s.path != TOKEN_URI)
            .collect()
    }

    pub fn count(&self, path: &str) -> usize {
        self.seen().iter().filter(|s| s.path == path).count()
    }
}

pub struct MockAppliance {
    pub addr: SocketAddr,
    pub shared: Arc<Shared>,
}

impl MockAppliance {
    pub async fn start() -> Self {
        let shared = Arc::new(Shared::default());
        shared.slow_ms.store(300, Ordering::SeqCst);

        let app = Router::new().fallback(handle).with_state(shared.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, shared }
    }

    pub fn target(&self) -> Target {
        Target {
            scheme: Scheme::Http,
            host: self.addr.ip().to_string(),
            port: Some(self.addr.port()),
        }
    }
}

pub fn credentials(method: AuthMethod) -> Credentials {
    Credentials::local(USERNAME, PASSWORD).with_method(method)
}

pub fn policy() -> TransportPolicy {
    TransportPolicy {
        verify_tls: false,
        request_timeout: Duration::from_secs(5),
        connect_timeout: Duration::from_secs(2),
    }
}

/// A port nothing listens on
pub async fn closed_port() -> u16 {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap().port()
}

fn envelope(status: StatusCode, code: i64, message: &str, data: Value) -> Response {
    (
        status,
        Json(json!({
            "status": if status.is_success() { "ok" } else { "bad request" },
            "code": status.as_u16(),
            "return": code,
            "message": message,
            "data": data,
        })),
    )
        .into_response()
}

fn unauthorized() -> Response {
    envelope(StatusCode::UNAUTHORIZED, 3, "Authentication failed", json!({}))
}

fn authorized(shared: &Shared, headers: &HeaderMap) -> bool {
    if shared.revoked.load(Ordering::SeqCst) {
        return false;
    }
    let Some(value) = headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()) else {
        return false;
    };
    if value == BASIC || value == format!("{} {}", USERNAME, PASSWORD) {
        return true;
    }
    let issued = shared.tokens_issued.load(Ordering::SeqCst);
    value == format!("Bearer token-{}", issued) && issued > 0
}

async fn handle(
    State(shared): State<Arc<Shared>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path = uri.path().to_string();
    if method == Method::HEAD {
        return StatusCode::OK.into_response();
    }

    let body: Option<Value> = if body.is_empty() {
        None
    } else {
        serde_json::from_slice(&body).ok()
    };
    shared.requests.lock().unwrap().push(Seen {
        method: method.to_string(),
        path: path.clone(),
        body: body.clone(),
    });

    if path == TOKEN_URI && method == Method::POST {
        let client_id = body.as_ref().and_then(|b| b.get("client-id")).and_then(Value::as_str);
        if shared.revoked.load(Ordering::SeqCst) || client_id != Some(USERNAME) {
            return unauthorized();
        }
        let n = shared.tokens_issued.fetch_add(1, Ordering::SeqCst) + 1;
        return envelope(
            StatusCode::OK,
            0,
            "Success",
            json!({"token": format!("token-{}", n)}),
        );
    }

    if !authorized(&shared, &headers) {
        return unauthorized();
    }
    if path == PROBE_URI {
        return envelope(StatusCode::OK, 0, "Success", json!({"version": "1.6.0"}));
    }

    if shared
        .reject_next
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
    {
        return unauthorized();
    }

    let served = shared.served.fetch_add(1, Ordering::SeqCst) + 1;
    let limit = *shared.revoke_after.lock().unwrap();
    if let Some(limit) = limit {
        if served >= limit {
            shared.revoked.store(true, Ordering::SeqCst);
        }
    }

    if path == SLOW_URI {
        let delay = shared.slow_ms.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(delay)).await;
        return envelope(StatusCode::OK, 0, "Success", json!({}));
    }

    if path == ALIAS_URI {
        return alias(&shared, &method, body.as_ref());
    }

    envelope(StatusCode::NOT_FOUND, 9, "Endpoint not found", json!({}))
}

fn alias(shared: &Shared, method: &Method, body: Option<&Value>) -> Response {
    let name = body
        .and_then(|b| b.get("name"))
        .and_then(Value::as_str)
        .map(str::to_string);
    let mut aliases = shared.aliases.lock().unwrap();

    if *method == Method::GET {
        return envelope(StatusCode::OK, 0, "Success", json!(aliases.clone()));
    }

    if *method == Method::POST {
        return match name {
            None => envelope(StatusCode::BAD_REQUEST, 4050, "Alias name required", json!({})),
            Some(n) if aliases.contains(&n) => {
                envelope(StatusCode::BAD_REQUEST, 4056, "Alias name already in use", json!({}))
            }
            Some(n) => {
                aliases.push(n.clone());
                envelope(StatusCode::OK, 0, "Success", json!({"name": n}))
            }
        };
    }

    if *method != Method::PUT && *method != Method::DELETE {
        return envelope(StatusCode::METHOD_NOT_ALLOWED, 9, "Method not allowed", json!({}));
    }

    let id = body.and_then(|b| b.get("id")).and_then(Value::as_str);
    let Some(i) = id.and_then(|id| aliases.iter().position(|a| a == id)) else {
        return envelope(StatusCode::BAD_REQUEST, 4055, "Alias does not exist", json!({}));
    };
    if *method == Method::DELETE {
        let removed = aliases.remove(i);
        return envelope(StatusCode::OK, 0, "Success", json!({"name": removed}));
    }
    if let Some(n) = name {
        aliases[i] = n;
    }
    envelope(StatusCode::OK, 0, "Success", json!({"name": aliases[i]}))
}
