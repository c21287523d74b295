//! Node model: the host-owned entity the control layer decorates.
//!
//! A node has a session-scoped integer id, a type tag, a user-resizable
//! size, an ordered widget list and the image slots the host previews.
//! The control layer never owns node identity; it attaches watchers and
//! buttons through the methods here and tracks nodes by id elsewhere.
//!
//! Nodes are shared as [`NodeHandle`] (`Arc<Mutex<Node>>`), matching how the
//! host hands the same object to every lifecycle callback.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use indexmap::IndexMap;
use log::{trace, warn};

use super::image::PreviewImage;
use super::watch::{Reaction, WatchId, Watchers};
use super::widget::{WIDGET_SPACING, Widget, WidgetValue};

/// Session-scoped node identifier, valid for one graph load.
pub type NodeId = i64;

/// Shared node reference handed out by the host.
pub type NodeHandle = Arc<Mutex<Node>>;

/// Button callback, invoked with the owning node.
pub type ButtonAction = Arc<dyn Fn(&mut Node) + Send + Sync>;

/// Wrap a closure as a [`ButtonAction`].
pub fn button_action<F>(f: F) -> ButtonAction
where
    F: Fn(&mut Node) + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Minimum node width in canvas units.
pub const NODE_MIN_WIDTH: f32 = 140.0;
/// Padding above the first widget row.
pub const NODE_WIDGET_TOP: f32 = 6.0;

/// Lock a node handle, recovering from poisoning.
pub fn lock(handle: &NodeHandle) -> std::sync::MutexGuard<'_, Node> {
    handle.lock().unwrap_or_else(|e| e.into_inner())
}

/// Which renderer draws the node's image slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PreviewMode {
    /// Host draws the image list
    #[default]
    Default,
    /// A custom renderer owns the images; the host list is suppressed
    Custom,
}

pub struct Node {
    id: NodeId,
    type_tag: String,
    size: [f32; 2],
    widgets: Vec<Widget>,
    watchers: Watchers,
    buttons: HashMap<String, ButtonAction>,
    images: Vec<Option<PreviewImage>>,
    preview_mode: PreviewMode,
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("type_tag", &self.type_tag)
            .field("size", &self.size)
            .field("widgets", &self.widgets.iter().map(|w| w.name()).collect::<Vec<_>>())
            .field("watchers", &self.watchers)
            .field("images", &self.images.len())
            .field("preview_mode", &self.preview_mode)
            .finish()
    }
}

impl Node {
    pub fn new(id: NodeId, type_tag: impl Into<String>) -> Self {
        Self {
            id,
            type_tag: type_tag.into(),
            size: [NODE_MIN_WIDTH, NODE_WIDGET_TOP],
            widgets: Vec::new(),
            watchers: Watchers::new(),
            buttons: HashMap::new(),
            images: Vec::new(),
            preview_mode: PreviewMode::Default,
        }
    }

    pub fn with_size(mut self, width: f32, height: f32) -> Self {
        self.size = [width, height];
        self
    }

    pub fn with_widget(mut self, widget: Widget) -> Self {
        self.widgets.push(widget);
        self
    }

    pub fn into_handle(self) -> NodeHandle {
        Arc::new(Mutex::new(self))
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn type_tag(&self) -> &str {
        &self.type_tag
    }

    // ========== Widgets ==========

    pub fn add_widget(&mut self, widget: Widget) {
        self.widgets.push(widget);
    }

    /// Remove a widget and any button action bound to it.
    pub fn remove_widget(&mut self, name: &str) -> Option<Widget> {
        self.buttons.remove(name);
        let idx = self.widgets.iter().position(|w| w.name() == name)?;
        Some(self.widgets.remove(idx))
    }

    pub fn widget(&self, name: &str) -> Option<&Widget> {
        self.widgets.iter().find(|w| w.name() == name)
    }

    pub(crate) fn widget_mut(&mut self, name: &str) -> Option<&mut Widget> {
        self.widgets.iter_mut().find(|w| w.name() == name)
    }

    pub fn widgets(&self) -> &[Widget] {
        &self.widgets
    }

    pub fn has_widget(&self, name: &str) -> bool {
        self.widget(name).is_some()
    }

    pub fn value(&self, name: &str) -> Option<&WidgetValue> {
        self.widget(name).map(|w| w.value())
    }

    /// Current values of the named widgets, in the given order.
    /// Absent widgets are left out.
    pub fn values_of(&self, names: &[&str]) -> IndexMap<String, WidgetValue> {
        names
            .iter()
            .filter_map(|n| self.value(n).map(|v| (n.to_string(), v.clone())))
            .collect()
    }

    /// Write a widget value.
    ///
    /// The value is stored first. If it differs from the previous one, every
    /// watcher on this widget runs before this returns. Returns `true` when
    /// the value changed, `false` when unchanged, the widget is absent or
    /// the value does not fit the widget kind.
    pub fn set_value(&mut self, name: &str, value: impl Into<WidgetValue>) -> bool {
        let id = self.id;
        let Some(widget) = self.widget_mut(name) else {
            trace!("set_value: node {} has no widget '{}'", id, name);
            return false;
        };
        let value = value.into();
        let Some(new) = widget.coerce(value.clone()) else {
            warn!("set_value: node {} rejected {:?} for widget '{}'", id, value, name);
            return false;
        };
        let old = widget.replace_value(new.clone());
        if old == new {
            return false;
        }

        for reaction in self.watchers.for_widget(name) {
            reaction(self, &old, &new);
        }
        true
    }

    // ========== Watchers ==========

    /// Attach a reaction to a widget. Returns `None` if the widget is absent.
    pub fn watch(&mut self, name: &str, reaction: Reaction) -> Option<WatchId> {
        if !self.has_widget(name) {
            return None;
        }
        Some(self.watchers.add(name, reaction))
    }

    pub fn unwatch(&mut self, id: WatchId) -> bool {
        self.watchers.remove(id)
    }

    pub fn watcher_count(&self) -> usize {
        self.watchers.len()
    }

    // ========== Buttons ==========

    /// Add a push button. Replaces any widget of the same name.
    pub fn add_button(&mut self, name: &str, action: ButtonAction) {
        self.remove_widget(name);
        self.widgets.push(Widget::button(name));
        self.buttons.insert(name.to_string(), action);
    }

    /// Press a button. Returns false if no such button or it is hidden.
    pub fn click(&mut self, name: &str) -> bool {
        let clickable = self.widget(name).map(|w| w.is_interactive()).unwrap_or(false);
        let Some(action) = self.buttons.get(name).cloned().filter(|_| clickable) else {
            return false;
        };
        action(self);
        true
    }

    // ========== Geometry ==========

    pub fn size(&self) -> [f32; 2] {
        self.size
    }

    /// Host-side resize (user drag or deserialization).
    pub fn set_size(&mut self, size: [f32; 2]) {
        self.size = size;
    }

    /// Height taken by the widget rows, from the top of the node body.
    pub fn widgets_height(&self) -> f32 {
        let width = self.size[0];
        NODE_WIDGET_TOP
            + self
                .widgets
                .iter()
                .map(|w| w.computed_size(width)[1] + WIDGET_SPACING)
                .sum::<f32>()
    }

    /// Size implied by the current widgets alone.
    pub fn compute_size(&self) -> [f32; 2] {
        let width = self
            .widgets
            .iter()
            .map(|w| w.computed_size(NODE_MIN_WIDTH)[0])
            .fold(NODE_MIN_WIDTH, f32::max);
        [width, self.widgets_height()]
    }

    /// Grow to fit visible widgets. Never shrinks below the current size.
    pub fn fit_to_widgets(&mut self) {
        let [cw, ch] = self.compute_size();
        self.size = [self.size[0].max(cw), self.size[1].max(ch)];
    }

    // ========== Preview images ==========

    pub fn images(&self) -> &[Option<PreviewImage>] {
        &self.images
    }

    pub fn set_images(&mut self, images: Vec<Option<PreviewImage>>) {
        self.images = images;
    }

    pub fn preview_mode(&self) -> PreviewMode {
        self.preview_mode
    }

    pub fn set_preview_mode(&mut self, mode: PreviewMode) {
        self.preview_mode = mode;
    }

    /// Images the host's default renderer should draw.
    /// Empty when a custom renderer owns the slots.
    pub fn default_preview_images(&self) -> &[Option<PreviewImage>] {
        match self.preview_mode {
            PreviewMode::Default => &self.images,
            PreviewMode::Custom => &[],
        }
    }
}
