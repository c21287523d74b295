//! Node lifecycle bridge.
//!
//! Wraps the host's node hooks and owns the session state behind them:
//! - **added**: build setup through the [`SetupRegistry`], register the node
//! - **removed**: send `skip` once for interactive nodes, tear down, drop cache
//! - **configured**: mark the preview cache stale (undo/redo rebuilt the node)
//! - **executed**: cache and display the images the backend produced
//! - pointer, value and button input routed to the node or its renderer
//!
//! A node counts as live while the bridge holds its [`SetupHandle`]. The
//! skip on removal is tied to taking that handle out of the map, so a host
//! that fires the removal hook twice still produces one skip. Re-adding a
//! live id (host rebuild) tears the old setup down without a skip.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, info, trace};
use serde_json::Value;

use super::events::{HostEvent, NodeDescriptor};
use super::payload::parse_images;
use super::setup::{SetupContext, SetupHandle, SetupRegistry};
use crate::config::Settings;
use crate::core::outbox::Outbox;
use crate::core::preview_cache::PreviewImageCache;
use crate::core::refresh::RefreshScheduler;
use crate::core::registry::NodeRegistry;
use crate::entities::image::decode_all;
use crate::entities::node::{lock, NodeHandle, NodeId};
use crate::entities::traits::Canvas;
use crate::entities::widget::WidgetValue;
use crate::protocol::{Action, ControlSignalClient, ParamSyncClient, Transport};
use crate::widgets::compare::{DrawOp, PointerKind};
use crate::widgets::visibility::VisibilityController;

struct LiveNode {
    key: &'static str,
    interactive: bool,
    setup: SetupHandle,
}

/// Counters for a session summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BridgeStats {
    pub live_nodes: usize,
    pub cache_entries: usize,
    pub skips_sent: u64,
    pub sent: u64,
    pub failed: u64,
    pub pending: usize,
}

pub struct NodeLifecycleBridge {
    setups: SetupRegistry,
    ctx: SetupContext,
    registry: NodeRegistry,
    cache: PreviewImageCache,
    scheduler: RefreshScheduler,
    outbox: Arc<Outbox>,
    live: HashMap<NodeId, LiveNode>,
    skips_sent: u64,
    started: Instant,
}

impl NodeLifecycleBridge {
    pub fn new(settings: &Settings, transport: Arc<dyn Transport>, canvas: Arc<dyn Canvas>) -> Self {
        let outbox = Arc::new(Outbox::new(settings.background_dispatch));
        Self::with_outbox(settings, transport, canvas, outbox)
    }

    pub fn with_outbox(
        settings: &Settings,
        transport: Arc<dyn Transport>,
        canvas: Arc<dyn Canvas>,
        outbox: Arc<Outbox>,
    ) -> Self {
        let ctx = SetupContext {
            params: ParamSyncClient::new(Arc::clone(&transport), Arc::clone(&outbox), &settings.params_route),
            control: ControlSignalClient::new(transport, Arc::clone(&outbox), &settings.control_route),
            visibility: VisibilityController::new(Arc::clone(&canvas)),
            canvas: Arc::clone(&canvas),
            presets: Arc::new(settings.resolution_presets.clone()),
        };
        let registry = NodeRegistry::new();
        let cache = PreviewImageCache::new();
        let scheduler = RefreshScheduler::new(
            settings.refresh_interval_ms,
            cache.clone(),
            registry.clone(),
            canvas,
        );
        Self {
            setups: SetupRegistry::with_catalog(),
            ctx,
            registry,
            cache,
            scheduler,
            outbox,
            live: HashMap::new(),
            skips_sent: 0,
            started: Instant::now(),
        }
    }

    pub fn registry(&self) -> &NodeRegistry {
        &self.registry
    }

    pub fn cache(&self) -> &PreviewImageCache {
        &self.cache
    }

    pub fn setups_mut(&mut self) -> &mut SetupRegistry {
        &mut self.setups
    }

    pub fn is_live(&self, id: NodeId) -> bool {
        self.live.contains_key(&id)
    }

    pub fn node(&self, id: NodeId) -> Option<NodeHandle> {
        self.registry.get(id)
    }

    // ========== Lifecycle hooks ==========

    /// Node created by the host (add, paste or rebuild).
    ///
    /// Returns false for types with no setup routine; those are not tracked.
    pub fn on_node_added(&mut self, handle: NodeHandle) -> bool {
        let (id, type_tag) = {
            let node = lock(&handle);
            (node.id(), node.type_tag().to_string())
        };
        let Some(spec) = self.setups.spec(&type_tag) else {
            trace!("node {} ({}): no setup routine", id, type_tag);
            return false;
        };

        if let Some(previous) = self.live.remove(&id) {
            debug!("node {} rebuilt, replacing setup", id);
            if let Some(old) = self.registry.get(id) {
                previous.setup.teardown(&mut lock(&old));
            }
        }

        let setup = {
            let mut node = lock(&handle);
            self.setups.setup(&mut node, &self.ctx)
        };
        let Some(setup) = setup else {
            return false;
        };
        self.registry.register(id, handle, spec.is_preview_capable());
        self.live.insert(
            id,
            LiveNode {
                key: spec.key,
                interactive: spec.is_interactive(),
                setup,
            },
        );
        info!("node {} added ({})", id, type_tag);
        true
    }

    /// Node removed from the graph. Returns true if this call removed it.
    pub fn on_node_removed(&mut self, id: NodeId) -> bool {
        let Some(live) = self.live.remove(&id) else {
            trace!("node {}: removal for unknown or removed node", id);
            return false;
        };
        if live.interactive {
            self.ctx.control.send_signal(id, live.key, Action::Skip);
            self.skips_sent += 1;
        }
        if let Some(handle) = self.registry.unregister(id) {
            live.setup.teardown(&mut lock(&handle));
        }
        self.cache.remove(id);
        info!("node {} removed", id);
        true
    }

    /// Node state deserialized (graph load, undo, redo).
    pub fn on_node_configured(&mut self, id: NodeId) {
        trace!("node {} configured, cache stale", id);
        self.cache.mark_stale();
    }

    /// Execution result delivered. Returns true if it carried images for a
    /// live preview node.
    pub fn on_node_executed(&mut self, id: NodeId, output: &Value) -> bool {
        let Some(handle) = self.registry.get_preview(id) else {
            trace!("node {}: execution result for untracked or non-preview node", id);
            return false;
        };
        let Some(slots) = parse_images(output) else {
            return false;
        };
        let images = decode_all(&slots);
        self.cache.save(id, slots);
        lock(&handle).set_images(images);
        self.ctx.canvas.request_redraw();
        true
    }

    // ========== Input ==========

    pub fn set_value(&mut self, id: NodeId, widget: &str, value: WidgetValue) -> bool {
        match self.registry.get(id) {
            Some(handle) => lock(&handle).set_value(widget, value),
            None => false,
        }
    }

    pub fn click(&mut self, id: NodeId, widget: &str) -> bool {
        match self.registry.get(id) {
            Some(handle) => lock(&handle).click(widget),
            None => false,
        }
    }

    /// Pointer event at node-local `x`. Returns true if a redraw was requested.
    pub fn on_pointer(&mut self, id: NodeId, kind: PointerKind, x: f32) -> bool {
        let Some(renderer) = self.live.get(&id).and_then(|l| l.setup.compare()) else {
            return false;
        };
        let changed = renderer
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .handle_pointer(kind, x);
        if changed {
            self.ctx.canvas.request_redraw();
        }
        changed
    }

    /// Current compare draw list for a node; empty for other nodes.
    pub fn compare_frame(&self, id: NodeId) -> Vec<DrawOp> {
        let (Some(live), Some(handle)) = (self.live.get(&id), self.registry.get(id)) else {
            return Vec::new();
        };
        let Some(renderer) = live.setup.compare() else {
            return Vec::new();
        };
        // Node before renderer: the compare_mode watcher locks in that order.
        let node = lock(&handle);
        let renderer = renderer.lock().unwrap_or_else(|e| e.into_inner());
        renderer.frame(&node)
    }

    // ========== Polling ==========

    pub fn tick(&mut self) -> Option<usize> {
        self.scheduler.tick()
    }

    pub fn tick_at(&mut self, now: Instant) -> Option<usize> {
        self.scheduler.tick_at(now)
    }

    // ========== Dispatch ==========

    /// Route one host event. Returns whether it had an effect.
    pub fn dispatch(&mut self, event: HostEvent) -> bool {
        match event {
            HostEvent::Added { node } => self.add_descriptor(&node),
            HostEvent::Removed { node_id } => self.on_node_removed(node_id),
            HostEvent::Configured { node_id } => {
                self.on_node_configured(node_id);
                true
            }
            HostEvent::Executed { node_id, output } => self.on_node_executed(node_id, &output),
            HostEvent::SetValue { node_id, widget, value } => self.set_value(node_id, &widget, value),
            HostEvent::Click { node_id, widget } => self.click(node_id, &widget),
            HostEvent::Pointer { node_id, kind, x, .. } => self.on_pointer(node_id, kind, x),
            HostEvent::Tick { elapsed_ms } => {
                let now = self.started + Duration::from_millis(elapsed_ms);
                self.tick_at(now).is_some()
            }
        }
    }

    fn add_descriptor(&mut self, desc: &NodeDescriptor) -> bool {
        self.on_node_added(desc.build().into_handle())
    }

    // ========== Shutdown ==========

    /// Wait for queued backend sends. Returns true if all finished.
    pub fn flush(&self, timeout: Duration) -> bool {
        self.outbox.wait_idle(timeout)
    }

    pub fn stats(&self) -> BridgeStats {
        BridgeStats {
            live_nodes: self.live.len(),
            cache_entries: self.cache.len(),
            skips_sent: self.skips_sent,
            sent: self.outbox.sent(),
            failed: self.outbox.failed(),
            pending: self.outbox.pending(),
        }
    }
}
