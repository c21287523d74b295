//! JSON POST transport to the backend.

use std::sync::Mutex;

use anyhow::{Context, Result};
use log::trace;
use reqwest::blocking::Client;
use serde_json::Value;

/// Sends one JSON body to a backend route.
pub trait Transport: Send + Sync {
    fn post_json(&self, route: &str, body: &Value) -> Result<()>;
}

/// HTTP transport over a blocking reqwest client.
///
/// Timeouts are reqwest's defaults; a lost request is repaired by the next
/// full-state message.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    base_url: String,
    client: Client,
}

impl HttpTransport {
    pub fn new(base_url: &str) -> Result<Self> {
        let parsed = reqwest::Url::parse(base_url)
            .with_context(|| format!("Invalid backend URL: {}", base_url))?;
        let mut builder = Client::builder();
        // Local backends are reached directly, never through a system proxy.
        if matches!(parsed.host_str(), Some("localhost" | "127.0.0.1" | "[::1]")) {
            builder = builder.no_proxy();
        }
        let client = builder.build().context("Failed to build HTTP client")?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for a route ("/params" or "params").
    pub fn url(&self, route: &str) -> String {
        format!("{}/{}", self.base_url, route.trim_start_matches('/'))
    }
}

impl Transport for HttpTransport {
    fn post_json(&self, route: &str, body: &Value) -> Result<()> {
        let url = self.url(route);
        trace!("POST {} {}", url, body);
        self.client
            .post(&url)
            .json(body)
            .send()
            .with_context(|| format!("POST {} failed", url))?
            .error_for_status()
            .with_context(|| format!("POST {} rejected", url))?;
        Ok(())
    }
}

/// Transport that keeps every post in memory (dry runs and tests).
#[derive(Debug, Default)]
pub struct RecordingTransport {
    posts: Mutex<Vec<(String, Value)>>,
    fail: bool,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records posts but reports every one as failed.
    pub fn failing() -> Self {
        Self { posts: Mutex::new(Vec::new()), fail: true }
    }

    pub fn posts(&self) -> Vec<(String, Value)> {
        self.posts.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Bodies posted to one route, in order.
    pub fn bodies(&self, route: &str) -> Vec<Value> {
        self.posts()
            .into_iter()
            .filter(|(r, _)| r == route)
            .map(|(_, b)| b)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.posts.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.posts.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }
}

impl Transport for RecordingTransport {
    fn post_json(&self, route: &str, body: &Value) -> Result<()> {
        self.posts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((route.to_string(), body.clone()));
        if self.fail {
            anyhow::bail!("connection refused");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_url_join() {
        let t = HttpTransport::new("http://127.0.0.1:8188/").unwrap();
        assert_eq!(t.url("/params"), "http://127.0.0.1:8188/params");
        assert_eq!(t.url("control"), "http://127.0.0.1:8188/control");
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(HttpTransport::new("not a url").is_err());
    }

    #[test]
    fn test_recording_transport() {
        let t = RecordingTransport::new();
        t.post_json("/params", &json!({"a": 1})).unwrap();
        t.post_json("/control", &json!({"b": 2})).unwrap();
        assert_eq!(t.bodies("/params"), vec![json!({"a": 1})]);
        assert_eq!(t.len(), 2);

        let f = RecordingTransport::failing();
        assert!(f.post_json("/params", &json!({})).is_err());
        assert_eq!(f.len(), 1);
    }

    #[test]
    fn test_unreachable_backend_is_an_error() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let t = HttpTransport::new(&format!("http://127.0.0.1:{}", port)).unwrap();
        assert!(t.post_json("/params", &json!({"node_id": 1})).is_err());
    }
}
