//! Scripted host sessions.
//!
//! A script is a JSON array of [`HostEvent`]s. Replaying feeds each one to
//! the bridge in order, then waits for the outbox to drain.

use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use log::{debug, info, warn};

use crate::bridge::{BridgeStats, HostEvent, NodeLifecycleBridge};
use crate::config::Settings;
use crate::entities::traits::Canvas;
use crate::protocol::Transport;

/// How long replay waits for queued sends after the last event.
pub const FLUSH_TIMEOUT: Duration = Duration::from_secs(10);

/// Outcome of one replay run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplaySummary {
    pub events: usize,
    /// Events that changed bridge state
    pub applied: usize,
    /// Outbox drained before the timeout
    pub drained: bool,
    pub stats: BridgeStats,
}

impl fmt::Display for ReplaySummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "events:        {} ({} applied)", self.events, self.applied)?;
        writeln!(f, "messages sent: {}", self.stats.sent)?;
        writeln!(f, "send failures: {}", self.stats.failed)?;
        writeln!(f, "skips sent:    {}", self.stats.skips_sent)?;
        writeln!(f, "nodes live:    {}", self.stats.live_nodes)?;
        write!(f, "cache entries: {}", self.stats.cache_entries)?;
        if !self.drained {
            write!(f, "\n{} sends still pending", self.stats.pending)?;
        }
        Ok(())
    }
}

pub fn parse_script(text: &str) -> Result<Vec<HostEvent>> {
    serde_json::from_str(text).context("Malformed event script")
}

pub fn load_script(path: &Path) -> Result<Vec<HostEvent>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read event script: {}", path.display()))?;
    parse_script(&text).with_context(|| format!("In {}", path.display()))
}

/// Dispatch every event, then flush.
pub fn run(bridge: &mut NodeLifecycleBridge, events: Vec<HostEvent>, flush_timeout: Duration) -> ReplaySummary {
    let total = events.len();
    let mut applied = 0;
    for (i, event) in events.into_iter().enumerate() {
        debug!("replay [{}/{}]: {:?}", i + 1, total, event);
        let target = event.node_id();
        if bridge.dispatch(event) {
            applied += 1;
        } else if let Some(id) = target {
            debug!("replay [{}/{}]: no effect on node {}", i + 1, total, id);
        }
    }
    let drained = bridge.flush(flush_timeout);
    if !drained {
        warn!("Outbox did not drain within {:?}", flush_timeout);
    }
    let summary = ReplaySummary {
        events: total,
        applied,
        drained,
        stats: bridge.stats(),
    };
    info!("Replay finished: {} events, {} messages sent", total, summary.stats.sent);
    summary
}

/// Load `path` and replay it on a fresh bridge.
pub fn replay_file(
    path: &Path,
    settings: &Settings,
    transport: Arc<dyn Transport>,
    canvas: Arc<dyn Canvas>,
) -> Result<ReplaySummary> {
    let events = load_script(path)?;
    info!("Replaying {} events from {}", events.len(), path.display());
    let mut bridge = NodeLifecycleBridge::new(settings, transport, canvas);
    Ok(run(&mut bridge, events, FLUSH_TIMEOUT))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::traits::NullCanvas;
    use crate::protocol::RecordingTransport;
    use serde_json::json;

    const SCRIPT: &str = r#"[
        {"event": "added", "node": {"type": "Saturation", "id": 42}},
        {"event": "set_value", "node_id": 42, "widget": "saturation", "value": 1.2},
        {"event": "set_value", "node_id": 99, "widget": "saturation", "value": 0.5},
        {"event": "removed", "node_id": 42},
        {"event": "removed", "node_id": 42}
    ]"#;

    #[test]
    fn test_replay_script_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, SCRIPT).unwrap();

        let transport = Arc::new(RecordingTransport::new());
        let settings = Settings {
            background_dispatch: false,
            ..Settings::default()
        };
        let summary = replay_file(&path, &settings, transport.clone(), Arc::new(NullCanvas)).unwrap();

        assert_eq!(summary.events, 5);
        // Unknown node and the second removal are no-ops.
        assert_eq!(summary.applied, 3);
        assert!(summary.drained);
        assert_eq!(summary.stats.skips_sent, 1);
        assert_eq!(summary.stats.live_nodes, 0);

        let params = transport.bodies("/params");
        assert_eq!(params, vec![json!({"node_id": 42, "node_type": "sat", "saturation": 1.2})]);
        let control = transport.bodies("/control");
        assert_eq!(control, vec![json!({"node_id": 42, "node_type": "sat", "action": "skip"})]);
        assert!(summary.to_string().contains("skips sent:    1"));
    }

    #[test]
    fn test_bad_script_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, r#"[{"event": "explode"}]"#).unwrap();
        let err = load_script(&path).unwrap_err();
        let msg = format!("{:#}", err);
        assert!(msg.contains("broken.json"));
        assert!(msg.contains("Malformed event script"));

        assert!(load_script(&dir.path().join("missing.json")).is_err());
    }
}
