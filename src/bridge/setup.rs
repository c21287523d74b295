//! Per-type setup routines.
//!
//! A [`SetupRegistry`] maps a host type tag to the routine that decorates a
//! freshly created node: parameter-sync watchers, exclusive visibility
//! groups, Apply/Skip buttons, derived combo options or the compare
//! renderer. Each routine attaches through the node's public extension
//! points (`watch`, `add_button`) and returns a [`SetupHandle`] listing what
//! it attached, so teardown removes exactly that.
//!
//! Widgets a routine expects but the node lacks are skipped, not errors.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use log::{debug, trace};

use crate::entities::catalog::{Behavior, NodeSpec, CATALOG};
use crate::entities::node::{button_action, Node, NodeId, PreviewMode};
use crate::entities::traits::Canvas;
use crate::entities::watch::{reaction, WatchId};
use crate::protocol::{Action, ControlSignalClient, ParamSyncClient};
use crate::widgets::compare::{CompareMode, CompareRenderer};
use crate::widgets::visibility::{ExclusiveGroup, VisibilityController};

pub const APPLY_BUTTON: &str = "Apply";
pub const SKIP_BUTTON: &str = "Skip";

/// Ratio → resolution strings ("16:9" → ["1024x576", ...]).
pub type ResolutionPresets = BTreeMap<String, Vec<String>>;

/// Shared collaborators handed to every setup routine.
#[derive(Clone)]
pub struct SetupContext {
    pub params: ParamSyncClient,
    pub control: ControlSignalClient,
    pub visibility: VisibilityController,
    pub canvas: Arc<dyn Canvas>,
    pub presets: Arc<ResolutionPresets>,
}

// ============================================================================
// Handle
// ============================================================================

/// What one setup attached to one node.
#[derive(Debug, Default)]
pub struct SetupHandle {
    node_id: NodeId,
    watches: Vec<WatchId>,
    buttons: Vec<String>,
    compare: Option<Arc<Mutex<CompareRenderer>>>,
}

impl SetupHandle {
    pub fn new(node_id: NodeId) -> Self {
        Self { node_id, ..Default::default() }
    }

    pub fn node_id(&self) -> NodeId {
        self.node_id
    }

    pub fn watches(&self) -> &[WatchId] {
        &self.watches
    }

    pub fn buttons(&self) -> &[String] {
        &self.buttons
    }

    pub fn compare(&self) -> Option<&Arc<Mutex<CompareRenderer>>> {
        self.compare.as_ref()
    }

    fn push_watch(&mut self, id: Option<WatchId>) {
        if let Some(id) = id {
            self.watches.push(id);
        }
    }

    /// Detach everything this handle attached.
    pub fn teardown(self, node: &mut Node) {
        for id in &self.watches {
            node.unwatch(*id);
        }
        for name in &self.buttons {
            node.remove_widget(name);
        }
        if self.compare.is_some() {
            node.set_preview_mode(PreviewMode::Default);
        }
        debug!(
            "teardown node {}: {} watches, {} buttons",
            self.node_id,
            self.watches.len(),
            self.buttons.len()
        );
    }
}

// ============================================================================
// Registry
// ============================================================================

pub type SetupFn = fn(&'static NodeSpec, &mut Node, &SetupContext) -> SetupHandle;

#[derive(Default)]
pub struct SetupRegistry {
    routines: HashMap<&'static str, (&'static NodeSpec, SetupFn)>,
}

impl SetupRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the routine for every catalog type.
    pub fn with_catalog() -> Self {
        let mut registry = Self::new();
        for spec in CATALOG {
            registry.register(spec, routine_for(spec.behavior));
        }
        registry
    }

    /// Returns true if an earlier routine for the same type was replaced.
    pub fn register(&mut self, spec: &'static NodeSpec, setup: SetupFn) -> bool {
        self.routines.insert(spec.type_tag, (spec, setup)).is_some()
    }

    pub fn spec(&self, type_tag: &str) -> Option<&'static NodeSpec> {
        self.routines.get(type_tag).map(|(spec, _)| *spec)
    }

    pub fn len(&self) -> usize {
        self.routines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routines.is_empty()
    }

    /// Run the routine for the node's type. `None` for unknown types.
    pub fn setup(&self, node: &mut Node, ctx: &SetupContext) -> Option<SetupHandle> {
        let &(spec, setup) = self.routines.get(node.type_tag())?;
        let handle = setup(spec, node, ctx);
        debug!(
            "setup node {} as {}: {} watches, {} buttons",
            node.id(),
            spec.type_tag,
            handle.watches.len(),
            handle.buttons.len()
        );
        Some(handle)
    }
}

fn routine_for(behavior: Behavior) -> SetupFn {
    match behavior {
        Behavior::Effect => setup_effect,
        Behavior::Preview => setup_preview,
        Behavior::Compare => setup_compare,
        Behavior::Latent => setup_latent,
    }
}

// ============================================================================
// Routines
// ============================================================================

fn install_groups(spec: &NodeSpec, node: &mut Node, ctx: &SetupContext, handle: &mut SetupHandle) {
    for def in spec.exclusive {
        let id = ctx.visibility.install_exclusive(node, ExclusiveGroup::from(def));
        if id.is_none() {
            trace!("node {}: exclusive toggle '{}' absent", node.id(), def.toggle);
        }
        handle.push_watch(id);
    }
}

/// Interactive effect: full-state param sync on every watched widget,
/// exclusive groups, Apply/Skip buttons.
pub fn setup_effect(spec: &'static NodeSpec, node: &mut Node, ctx: &SetupContext) -> SetupHandle {
    let mut handle = SetupHandle::new(node.id());
    install_groups(spec, node, ctx, &mut handle);

    for name in spec.watched {
        let params = ctx.params.clone();
        let id = node.watch(name, reaction(move |node, _, _| {
            params.send_params(node.id(), spec.key, node.values_of(spec.watched));
        }));
        if id.is_none() {
            trace!("node {}: watched widget '{}' absent", node.id(), name);
        }
        handle.push_watch(id);
    }

    for (label, action) in [(APPLY_BUTTON, Action::Apply), (SKIP_BUTTON, Action::Skip)] {
        let control = ctx.control.clone();
        node.add_button(label, button_action(move |node| {
            control.send_signal(node.id(), spec.key, action);
        }));
        handle.buttons.push(label.to_string());
    }
    node.fit_to_widgets();
    handle
}

/// Preview-only node: images come through the execution hook.
pub fn setup_preview(_spec: &'static NodeSpec, node: &mut Node, _ctx: &SetupContext) -> SetupHandle {
    SetupHandle::new(node.id())
}

/// Compare node: custom renderer driven by `compare_mode`.
pub fn setup_compare(_spec: &'static NodeSpec, node: &mut Node, ctx: &SetupContext) -> SetupHandle {
    let mut handle = SetupHandle::new(node.id());
    let mode = node
        .value("compare_mode")
        .and_then(|v| v.as_str())
        .map(CompareMode::from_str)
        .unwrap_or_default();
    let renderer = CompareRenderer::new(mode);
    renderer.attach(node);
    let renderer = Arc::new(Mutex::new(renderer));

    let shared = Arc::clone(&renderer);
    let canvas = Arc::clone(&ctx.canvas);
    let id = node.watch("compare_mode", reaction(move |_, _, new| {
        let mode = new.as_str().map(CompareMode::from_str).unwrap_or_default();
        shared.lock().unwrap_or_else(|e| e.into_inner()).set_mode(mode);
        canvas.request_redraw();
    }));
    handle.push_watch(id);
    handle.compare = Some(renderer);
    handle
}

/// Empty latent: manual/ratio exclusive group and ratio → resolution options.
pub fn setup_latent(spec: &'static NodeSpec, node: &mut Node, ctx: &SetupContext) -> SetupHandle {
    let mut handle = SetupHandle::new(node.id());
    install_groups(spec, node, ctx, &mut handle);

    if !node.has_widget("ratio") || !node.has_widget("resolution") {
        return handle;
    }
    if ctx.presets.is_empty() {
        debug!("node {}: no resolution presets configured", node.id());
        return handle;
    }

    let presets = Arc::clone(&ctx.presets);
    apply_resolution_options(node, &presets);
    let canvas = Arc::clone(&ctx.canvas);
    let id = node.watch("ratio", reaction(move |node, _, _| {
        if apply_resolution_options(node, &presets) {
            canvas.request_redraw();
        }
    }));
    handle.push_watch(id);
    handle
}

/// Fill the resolution combo for the current ratio.
///
/// Keeps the selection when it is still offered, else picks the first.
/// Returns false when no preset list exists for the ratio.
pub fn apply_resolution_options(node: &mut Node, presets: &ResolutionPresets) -> bool {
    let Some(ratio) = node.value("ratio").and_then(|v| v.as_str()).map(str::to_string) else {
        return false;
    };
    let Some(options) = presets.get(&ratio).filter(|o| !o.is_empty()) else {
        trace!("node {}: no presets for ratio {}", node.id(), ratio);
        return false;
    };
    let current = node.value("resolution").and_then(|v| v.as_str()).map(str::to_string);
    let first = options[0].clone();
    let keep = current.as_ref().is_some_and(|c| options.contains(c));

    if let Some(widget) = node.widget_mut("resolution") {
        widget.set_options(options.clone());
    }
    if !keep {
        node.set_value("resolution", first.as_str());
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::outbox::Outbox;
    use crate::entities::catalog::{build_node, lookup};
    use crate::entities::traits::RedrawCounter;
    use crate::entities::widget::WidgetValue;
    use crate::protocol::{DEFAULT_CONTROL_ROUTE, DEFAULT_PARAMS_ROUTE, RecordingTransport};
    use serde_json::json;

    fn context(presets: ResolutionPresets) -> (SetupContext, Arc<RecordingTransport>, Arc<RedrawCounter>) {
        let transport = Arc::new(RecordingTransport::new());
        let outbox = Arc::new(Outbox::inline());
        let canvas = Arc::new(RedrawCounter::new());
        let ctx = SetupContext {
            params: ParamSyncClient::new(transport.clone(), outbox.clone(), DEFAULT_PARAMS_ROUTE),
            control: ControlSignalClient::new(transport.clone(), outbox, DEFAULT_CONTROL_ROUTE),
            visibility: VisibilityController::new(canvas.clone()),
            canvas: canvas.clone(),
            presets: Arc::new(presets),
        };
        (ctx, transport, canvas)
    }

    fn node_for(tag: &str, id: NodeId) -> Node {
        build_node(lookup(tag).unwrap(), id)
    }

    #[test]
    fn test_saturation_change_posts_params_only() {
        let (ctx, transport, _) = context(ResolutionPresets::new());
        let registry = SetupRegistry::with_catalog();
        let mut node = node_for("Saturation", 42);
        registry.setup(&mut node, &ctx).unwrap();
        node.set_value("saturation", 0.8);
        transport.clear();

        node.set_value("saturation", 1.2);
        assert_eq!(
            transport.bodies("/params"),
            vec![json!({"node_id": 42, "node_type": "sat", "saturation": 1.2})]
        );
        assert!(transport.bodies("/control").is_empty());
    }

    #[test]
    fn test_params_carry_full_watched_set() {
        let (ctx, transport, _) = context(ResolutionPresets::new());
        let mut node = node_for("DepthDOFNode", 5);
        SetupRegistry::with_catalog().setup(&mut node, &ctx).unwrap();
        node.set_value("edge_fix", 3);
        let bodies = transport.bodies("/params");
        assert_eq!(bodies.len(), 1);
        assert_eq!(
            bodies[0],
            json!({
                "node_id": 5, "node_type": "dof",
                "focus_depth": 0.5, "focus_range": 0.25, "edge_fix": 3, "hard_focus_range": 0.0
            })
        );
    }

    #[test]
    fn test_buttons_send_control_signals() {
        let (ctx, transport, _) = context(ResolutionPresets::new());
        let mut node = node_for("ImageZoom", 8);
        let handle = SetupRegistry::with_catalog().setup(&mut node, &ctx).unwrap();
        assert_eq!(handle.buttons(), &["Apply".to_string(), "Skip".to_string()]);

        assert!(node.click(APPLY_BUTTON));
        assert!(node.click(SKIP_BUTTON));
        assert_eq!(
            transport.bodies("/control"),
            vec![
                json!({"node_id": 8, "node_type": "img_zoom", "action": "apply"}),
                json!({"node_id": 8, "node_type": "img_zoom", "action": "skip"}),
            ]
        );
    }

    #[test]
    fn test_missing_widgets_are_skipped() {
        let (ctx, transport, _) = context(ResolutionPresets::new());
        // Partially configured node: only one of the watched widgets exists.
        let mut node = Node::new(2, "DepthDOFNode")
            .with_widget(lookup("DepthDOFNode").unwrap().widgets[0].build());
        let handle = SetupRegistry::with_catalog().setup(&mut node, &ctx).unwrap();
        assert_eq!(handle.watches().len(), 1);
        node.set_value("focus_depth", 0.9);
        assert_eq!(
            transport.bodies("/params"),
            vec![json!({"node_id": 2, "node_type": "dof", "focus_depth": 0.9})]
        );
    }

    #[test]
    fn test_teardown_detaches_everything() {
        let (ctx, transport, _) = context(ResolutionPresets::new());
        let mut node = node_for("ImageResize", 4);
        let before = node.widgets().len();
        let handle = SetupRegistry::with_catalog().setup(&mut node, &ctx).unwrap();
        assert!(node.watcher_count() > 0);

        handle.teardown(&mut node);
        assert_eq!(node.watcher_count(), 0);
        assert_eq!(node.widgets().len(), before);
        node.set_value("width", 1024);
        assert!(transport.is_empty());
    }

    #[test]
    fn test_unknown_type_has_no_routine() {
        let (ctx, _, _) = context(ResolutionPresets::new());
        let mut node = Node::new(1, "KSampler");
        assert!(SetupRegistry::with_catalog().setup(&mut node, &ctx).is_none());
    }

    #[test]
    fn test_compare_mode_follows_widget() {
        let (ctx, _, canvas) = context(ResolutionPresets::new());
        let mut node = node_for("RAMImageCompare", 6);
        let handle = SetupRegistry::with_catalog().setup(&mut node, &ctx).unwrap();
        assert_eq!(node.preview_mode(), PreviewMode::Custom);
        let renderer = Arc::clone(handle.compare().unwrap());
        assert_eq!(renderer.lock().unwrap().mode(), CompareMode::Slide);

        node.set_value("compare_mode", "click");
        assert_eq!(renderer.lock().unwrap().mode(), CompareMode::Click);
        assert!(canvas.count() >= 1);

        handle.teardown(&mut node);
        assert_eq!(node.preview_mode(), PreviewMode::Default);
    }

    #[test]
    fn test_latent_ratio_drives_resolution_options() {
        let mut presets = ResolutionPresets::new();
        presets.insert("1:1".into(), vec!["512x512".into(), "1024x1024".into()]);
        presets.insert("16:9".into(), vec!["1024x576".into(), "2048x1152".into()]);
        let (ctx, transport, _) = context(presets);

        let mut node = node_for("AdvancedEmptyLatent", 11);
        SetupRegistry::with_catalog().setup(&mut node, &ctx).unwrap();
        let options = node.widget("resolution").unwrap().options().unwrap().to_vec();
        assert_eq!(options, vec!["512x512".to_string(), "1024x1024".to_string()]);
        // 1024x1024 is offered for 1:1, so it stays selected.
        assert_eq!(node.value("resolution"), Some(&WidgetValue::from("1024x1024")));

        node.set_value("ratio", "16:9");
        assert_eq!(node.value("resolution"), Some(&WidgetValue::from("1024x576")));
        node.set_value("ratio", "21:9");
        assert_eq!(node.value("resolution"), Some(&WidgetValue::from("1024x576")));
        // Latent nodes never talk to the backend.
        assert!(transport.is_empty());
    }

    #[test]
    fn test_latent_without_presets_keeps_options() {
        let (ctx, _, _) = context(ResolutionPresets::new());
        let mut node = node_for("AdvancedEmptyLatent", 12);
        let handle = SetupRegistry::with_catalog().setup(&mut node, &ctx).unwrap();
        assert_eq!(handle.watches().len(), 1);
        assert_eq!(node.widget("resolution").unwrap().options().unwrap(), &["1024x1024".to_string()]);
    }
}
