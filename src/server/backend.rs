//! Mock effect backend using rouille.
//!
//! Accepts the same two POST routes the real backend does and keeps what it
//! receives in memory:
//! - params route: latest full parameter set per node (400 without `node_id`)
//! - control route: latest action flag per node (400 unless apply/skip)
//! - `GET /health`
//!
//! Every response carries a permissive CORS header.
//!
//! Node ids are keyed as strings, whatever JSON type they arrive as.
//!
//! # Thread safety
//!
//! [`BackendState`] uses `RwLock` per field. Handlers write, tests and the
//! CLI read.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::mpsc;
use std::sync::{Arc, RwLock};
use std::thread;

use anyhow::{anyhow, Result};
use log::{debug, info};
use rouille::{Request, Response};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::config::Settings;
use crate::protocol::Action;

/// Route paths served by the mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendRoutes {
    pub params: String,
    pub control: String,
}

impl From<&Settings> for BackendRoutes {
    fn from(settings: &Settings) -> Self {
        Self {
            params: settings.params_route.clone(),
            control: settings.control_route.clone(),
        }
    }
}

impl Default for BackendRoutes {
    fn default() -> Self {
        Self::from(&Settings::default())
    }
}

/// Everything the mock has received.
#[derive(Debug, Default)]
pub struct BackendState {
    params: RwLock<HashMap<String, Map<String, Value>>>,
    flags: RwLock<HashMap<String, Action>>,
    history: RwLock<Vec<(String, Value)>>,
}

impl BackendState {
    /// Latest parameter message for a node.
    pub fn params(&self, node_id: &str) -> Option<Map<String, Value>> {
        self.params.read().unwrap_or_else(|e| e.into_inner()).get(node_id).cloned()
    }

    pub fn flag(&self, node_id: &str) -> Option<Action> {
        self.flags.read().unwrap_or_else(|e| e.into_inner()).get(node_id).copied()
    }

    /// Accepted requests in arrival order: (route, body).
    pub fn history(&self) -> Vec<(String, Value)> {
        self.history.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn record(&self, route: &str, body: &Value) {
        self.history
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push((route.to_string(), body.clone()));
    }
}

#[derive(Serialize)]
struct Reply {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
}

impl Reply {
    fn ok() -> Response {
        Response::json(&Reply { status: "ok", reason: None })
    }

    fn err(reason: &str) -> Response {
        Response::json(&Reply { status: "error", reason: Some(reason.to_string()) }).with_status_code(400)
    }
}

/// String key for a `node_id` field; `None` if missing, null or empty.
fn node_key(body: &Value) -> Option<String> {
    match body.get("node_id")? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn handle_request(request: &Request, routes: &BackendRoutes, state: &BackendState) -> Response {
    if request.method() == "OPTIONS" {
        return Response::empty_204()
            .with_additional_header("Access-Control-Allow-Origin", "*")
            .with_additional_header("Access-Control-Allow-Methods", "GET, POST, OPTIONS")
            .with_additional_header("Access-Control-Allow-Headers", "Content-Type");
    }
    route(request, routes, state).with_additional_header("Access-Control-Allow-Origin", "*")
}

fn route(request: &Request, routes: &BackendRoutes, state: &BackendState) -> Response {
    // Routes come from settings, so they are matched before the static router.
    if request.method() == "POST" {
        let url = request.url();
        if url == routes.params {
            return handle_params(request, &routes.params, state);
        }
        if url == routes.control {
            return handle_control(request, &routes.control, state);
        }
    }

    rouille::router!(request,
        (GET) ["/health"] => {
            Reply::ok()
        },
        _ => {
            Response::json(&Reply { status: "error", reason: Some("not found".into()) }).with_status_code(404)
        }
    )
}

fn handle_params(request: &Request, route: &str, state: &BackendState) -> Response {
    let body: Value = match rouille::input::json_input(request) {
        Ok(body) => body,
        Err(e) => return Reply::err(&format!("invalid JSON: {}", e)),
    };
    let (Some(key), Some(map)) = (node_key(&body), body.as_object()) else {
        return Reply::err("node_id missing");
    };
    debug!("mock backend: params for node {}: {}", key, body);
    state.record(route, &body);
    state
        .params
        .write()
        .unwrap_or_else(|e| e.into_inner())
        .insert(key, map.clone());
    Reply::ok()
}

fn handle_control(request: &Request, route: &str, state: &BackendState) -> Response {
    let body: Value = match rouille::input::json_input(request) {
        Ok(body) => body,
        Err(e) => return Reply::err(&format!("invalid JSON: {}", e)),
    };
    let action = body.get("action").and_then(Value::as_str).and_then(Action::parse);
    let Some(action) = action else {
        return Reply::err("invalid action");
    };
    let Some(key) = node_key(&body) else {
        return Reply::err("node_id missing");
    };
    debug!("mock backend: flag '{}' for node {}", action, key);
    state.record(route, &body);
    state.flags.write().unwrap_or_else(|e| e.into_inner()).insert(key, action);
    Reply::ok()
}

/// Running mock backend on a background thread. Stops when dropped.
pub struct MockBackend {
    addr: SocketAddr,
    state: Arc<BackendState>,
    stop: Option<mpsc::Sender<()>>,
    handle: Option<thread::JoinHandle<()>>,
}

impl MockBackend {
    /// Bind `addr` ("127.0.0.1:0" picks a free port) and serve in the background.
    pub fn start(addr: &str, routes: BackendRoutes) -> Result<Self> {
        let state = Arc::new(BackendState::default());
        let shared = Arc::clone(&state);
        let server = rouille::Server::new(addr, move |request| handle_request(request, &routes, &shared))
            .map_err(|e| anyhow!("Failed to bind mock backend on {}: {}", addr, e))?;
        let addr = server.server_addr();
        info!("Mock backend listening on http://{}", addr);
        let (handle, stop) = server.stoppable();
        Ok(Self {
            addr,
            state,
            stop: Some(stop),
            handle: Some(handle),
        })
    }

    /// Serve on the calling thread until the process exits.
    pub fn run(addr: &str, routes: BackendRoutes) -> Result<()> {
        let mut backend = Self::start(addr, routes)?;
        if let Some(handle) = backend.handle.take() {
            handle.join().map_err(|_| anyhow!("Mock backend thread panicked"))?;
        }
        Ok(())
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn state(&self) -> &Arc<BackendState> {
        &self.state
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::{HostEvent, NodeDescriptor, NodeLifecycleBridge};
    use crate::core::outbox::Outbox;
    use crate::entities::traits::NullCanvas;
    use crate::entities::widget::WidgetValue;
    use crate::protocol::{HttpTransport, Transport};
    use serde_json::json;
    use std::time::Duration;

    fn backend() -> MockBackend {
        MockBackend::start("127.0.0.1:0", BackendRoutes::default()).unwrap()
    }

    #[test]
    fn test_params_and_control_round_trip() {
        let backend = backend();
        let transport = HttpTransport::new(&backend.url()).unwrap();
        transport
            .post_json("/params", &json!({"node_id": 42, "node_type": "sat", "saturation": 1.2}))
            .unwrap();
        transport
            .post_json("/control", &json!({"node_id": "42", "node_type": "sat", "action": "SKIP"}))
            .unwrap();

        let params = backend.state().params("42").unwrap();
        assert_eq!(params["saturation"], json!(1.2));
        assert_eq!(backend.state().flag("42"), Some(Action::Skip));
        assert_eq!(backend.state().history().len(), 2);
    }

    #[test]
    fn test_rejects_bad_requests() {
        let backend = backend();
        let transport = HttpTransport::new(&backend.url()).unwrap();
        assert!(transport.post_json("/params", &json!({"saturation": 1.0})).is_err());
        assert!(transport.post_json("/control", &json!({"node_id": 1, "action": "commit"})).is_err());
        assert!(transport.post_json("/nope", &json!({})).is_err());
        assert!(backend.state().history().is_empty());
    }

    #[test]
    fn test_bridge_against_live_backend() {
        let backend = backend();
        let settings = Settings {
            backend_url: backend.url(),
            ..Settings::default()
        };
        let transport = Arc::new(HttpTransport::new(&settings.backend_url).unwrap());
        let outbox = Arc::new(Outbox::spawn().unwrap());
        let mut bridge = NodeLifecycleBridge::with_outbox(&settings, transport, Arc::new(NullCanvas), outbox);

        bridge.dispatch(HostEvent::Added { node: NodeDescriptor::new("Saturation", 42) });
        bridge.dispatch(HostEvent::SetValue {
            node_id: 42,
            widget: "saturation".into(),
            value: WidgetValue::Float(1.2),
        });
        assert!(bridge.flush(Duration::from_secs(10)));
        bridge.dispatch(HostEvent::Removed { node_id: 42 });
        bridge.dispatch(HostEvent::Removed { node_id: 42 });
        assert!(bridge.flush(Duration::from_secs(10)));

        let params = backend.state().params("42").unwrap();
        assert_eq!(params["node_type"], json!("sat"));
        assert_eq!(params["saturation"], json!(1.2));
        assert_eq!(backend.state().flag("42"), Some(Action::Skip));
        let controls = backend
            .state()
            .history()
            .into_iter()
            .filter(|(route, _)| route == "/control")
            .count();
        assert_eq!(controls, 1);
        assert_eq!(bridge.stats().failed, 0);
    }
}
