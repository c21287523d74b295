//! Widget visibility controller.
//!
//! Hiding a widget makes it non-interactive and collapses its layout
//! footprint; showing it restores the kind and size rule captured the first
//! time it was touched. Linked widgets follow their parent, recursively.
//!
//! After a change the node grows to fit its visible widgets (never shrinks
//! below a manual resize) and one redraw is requested. Batched changes
//! ([`VisibilityController::apply`]) request a single redraw for the whole
//! batch, so an exclusive group never paints a half-switched state.

use std::collections::HashSet;
use std::sync::Arc;

use log::trace;

use crate::entities::catalog::ExclusiveDef;
use crate::entities::node::Node;
use crate::entities::traits::Canvas;
use crate::entities::watch::{reaction, WatchId};

/// Two widget sets switched by one boolean toggle.
#[derive(Debug, Clone, PartialEq)]
pub struct ExclusiveGroup {
    pub toggle: String,
    /// Visible while the toggle is on
    pub when_on: Vec<String>,
    /// Visible while the toggle is off
    pub when_off: Vec<String>,
}

impl ExclusiveGroup {
    pub fn new(toggle: &str, when_on: &[&str], when_off: &[&str]) -> Self {
        Self {
            toggle: toggle.to_string(),
            when_on: when_on.iter().map(|s| s.to_string()).collect(),
            when_off: when_off.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Target visibility per member for a toggle state.
    pub fn targets(&self, on: bool) -> Vec<(&str, bool)> {
        self.when_on
            .iter()
            .map(|w| (w.as_str(), on))
            .chain(self.when_off.iter().map(|w| (w.as_str(), !on)))
            .collect()
    }
}

impl From<&ExclusiveDef> for ExclusiveGroup {
    fn from(def: &ExclusiveDef) -> Self {
        Self::new(def.toggle, def.when_on, def.when_off)
    }
}

#[derive(Clone)]
pub struct VisibilityController {
    canvas: Arc<dyn Canvas>,
}

impl VisibilityController {
    pub fn new(canvas: Arc<dyn Canvas>) -> Self {
        Self { canvas }
    }

    /// Show, hide or flip (`force == None`) one widget and its linked set.
    ///
    /// Returns the new visibility, or `None` if the widget does not exist.
    pub fn set_visible(&self, node: &mut Node, name: &str, force: Option<bool>) -> Option<bool> {
        let state = change_visibility(node, name, force)?;
        self.finish(node);
        Some(state)
    }

    /// Apply several visibility changes, then fit and redraw once.
    ///
    /// Absent widgets are skipped. Returns how many widgets were found.
    pub fn apply(&self, node: &mut Node, changes: &[(&str, bool)]) -> usize {
        let applied = changes
            .iter()
            .filter(|(name, visible)| change_visibility(node, name, Some(*visible)).is_some())
            .count();
        self.finish(node);
        applied
    }

    /// Switch an exclusive group to match its toggle's current value.
    ///
    /// Returns false when the toggle widget is absent or not boolean.
    pub fn apply_exclusive(&self, node: &mut Node, group: &ExclusiveGroup) -> bool {
        let Some(on) = node.value(&group.toggle).and_then(|v| v.as_bool()) else {
            return false;
        };
        trace!("node {}: exclusive '{}' -> {}", node.id(), group.toggle, on);
        self.apply(node, &group.targets(on));
        true
    }

    /// Apply the group now and keep it in sync with its toggle.
    pub fn install_exclusive(&self, node: &mut Node, group: ExclusiveGroup) -> Option<WatchId> {
        if !self.apply_exclusive(node, &group) {
            return None;
        }
        let controller = self.clone();
        let toggle = group.toggle.clone();
        node.watch(&toggle, reaction(move |node, _, _| {
            controller.apply_exclusive(node, &group);
        }))
    }

    fn finish(&self, node: &mut Node) {
        node.fit_to_widgets();
        self.canvas.request_redraw();
    }
}

/// Change one widget and everything linked to it, without layout or redraw.
fn change_visibility(node: &mut Node, name: &str, force: Option<bool>) -> Option<bool> {
    let current = node.widget(name)?.is_visible();
    let target = force.unwrap_or(!current);
    let mut visited = HashSet::new();
    set_recursive(node, name, target, &mut visited);
    Some(target)
}

fn set_recursive(node: &mut Node, name: &str, visible: bool, visited: &mut HashSet<String>) {
    if !visited.insert(name.to_string()) {
        return;
    }
    let Some(widget) = node.widget_mut(name) else {
        return;
    };
    widget.capture_origin();
    if visible {
        widget.restore();
    } else {
        widget.collapse();
    }
    let linked = widget.linked().to_vec();
    for other in linked {
        set_recursive(node, &other, visible, visited);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::catalog::{build_node, lookup};
    use crate::entities::traits::RedrawCounter;
    use crate::entities::widget::{SizeRule, Widget, WidgetKind};

    fn controller() -> (VisibilityController, Arc<RedrawCounter>) {
        let canvas = Arc::new(RedrawCounter::new());
        (VisibilityController::new(canvas.clone()), canvas)
    }

    fn visible(node: &Node, name: &str) -> bool {
        node.widget(name).unwrap().is_visible()
    }

    #[test]
    fn test_toggle_flips() {
        let (vc, _) = controller();
        let mut node = Node::new(1, "T").with_widget(Widget::slider("a", 0.0, 0.0, 1.0, 0.1));
        assert_eq!(vc.set_visible(&mut node, "a", None), Some(false));
        assert!(!node.widget("a").unwrap().is_interactive());
        assert_eq!(vc.set_visible(&mut node, "a", None), Some(true));
        assert_eq!(vc.set_visible(&mut node, "missing", None), None);
    }

    #[test]
    fn test_hide_show_round_trip_exact() {
        let (vc, _) = controller();
        let original = Widget::slider("zoom", 1.0, 0.1, 5.0, 0.01).with_size(SizeRule::Fixed {
            width: 180.0,
            height: 30.0,
        });
        let mut node = Node::new(1, "T").with_widget(original.clone());

        vc.set_visible(&mut node, "zoom", Some(true));
        let shown = node.widget("zoom").unwrap().clone();

        vc.set_visible(&mut node, "zoom", Some(false));
        vc.set_visible(&mut node, "zoom", Some(false));
        assert_eq!(node.widget("zoom").unwrap().kind(), &WidgetKind::Hidden);
        assert_eq!(node.widget("zoom").unwrap().size_rule(), SizeRule::Collapsed);

        vc.set_visible(&mut node, "zoom", Some(true));
        let restored = node.widget("zoom").unwrap();
        assert_eq!(restored, &shown);
        assert_eq!(restored.kind(), original.kind());
        assert_eq!(restored.size_rule(), original.size_rule());
    }

    #[test]
    fn test_linked_widgets_follow_and_cycles_terminate() {
        let (vc, _) = controller();
        let mut node = Node::new(1, "T")
            .with_widget(Widget::toggle("parent", true, "on", "off").with_linked(&["label"]))
            .with_widget(Widget::slider("label", 0.0, 0.0, 1.0, 0.1).with_linked(&["parent"]));

        vc.set_visible(&mut node, "parent", Some(false));
        assert!(!visible(&node, "parent"));
        assert!(!visible(&node, "label"));

        vc.set_visible(&mut node, "label", Some(true));
        assert!(visible(&node, "parent"));
        assert!(visible(&node, "label"));
    }

    #[test]
    fn test_exclusive_sides_never_agree() {
        let (vc, _) = controller();
        let spec = lookup("ImageResize").unwrap();
        let mut node = build_node(spec, 5);
        let group = ExclusiveGroup::from(&spec.exclusive[0]);
        vc.install_exclusive(&mut node, group).unwrap();

        for value in [true, false, true, true, false] {
            node.set_value("resize_by", value);
            let multiplier = visible(&node, "multiplier");
            assert_eq!(multiplier, value);
            assert_eq!(visible(&node, "width"), !multiplier);
            assert_eq!(visible(&node, "height"), !multiplier);
        }
    }

    #[test]
    fn test_use_ratio_switch_is_one_step() {
        let (vc, canvas) = controller();
        let spec = lookup("AdvancedEmptyLatent").unwrap();
        let mut node = build_node(spec, 9);
        node.set_value("use_ratio", true);
        vc.install_exclusive(&mut node, ExclusiveGroup::from(&spec.exclusive[0])).unwrap();
        assert!(visible(&node, "width") && visible(&node, "height"));
        canvas.reset();

        node.set_value("use_ratio", false);
        // State is final by the time set_value returns, with one redraw.
        assert!(!visible(&node, "width"));
        assert!(!visible(&node, "height"));
        assert!(visible(&node, "ratio"));
        assert!(visible(&node, "resolution"));
        assert_eq!(canvas.count(), 1);
    }

    #[test]
    fn test_size_grows_but_never_shrinks() {
        let (vc, _) = controller();
        let spec = lookup("ImageResize").unwrap();
        let mut node = build_node(spec, 3);
        let fitted = node.size();

        vc.set_visible(&mut node, "width", Some(false));
        vc.set_visible(&mut node, "height", Some(false));
        assert_eq!(node.size(), fitted);

        node.set_size([90.0, 20.0]);
        vc.set_visible(&mut node, "width", Some(true));
        let [w, h] = node.size();
        assert!(w >= 90.0 && h > 20.0);
        assert!(h <= node.compute_size()[1]);
    }

    #[test]
    fn test_batch_requests_one_redraw() {
        let (vc, canvas) = controller();
        let spec = lookup("MaskResize").unwrap();
        let mut node = build_node(spec, 3);
        let n = vc.apply(&mut node, &[("width", false), ("height", false), ("nope", true)]);
        assert_eq!(n, 2);
        assert_eq!(canvas.count(), 1);
    }
}
