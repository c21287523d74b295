//! Value watchers: synchronous reactions to widget writes.
//!
//! Watchers sit at the value-storage level. Every write goes through
//! [`Node::set_value`](super::node::Node::set_value), so host UI input,
//! undo/redo and deserialization all trigger them alike. A reaction runs
//! only when the new value differs from the old one, and it runs before
//! `set_value` returns.
//!
//! Reactions receive `&mut Node` and may write other widgets; nested writes
//! dispatch their own watchers recursively.

use std::fmt;
use std::sync::Arc;

use super::node::Node;
use super::widget::WidgetValue;

/// Reaction signature: `(node, old, new)`.
pub type Reaction = Arc<dyn Fn(&mut Node, &WidgetValue, &WidgetValue) + Send + Sync>;

/// Wrap a closure as a [`Reaction`].
pub fn reaction<F>(f: F) -> Reaction
where
    F: Fn(&mut Node, &WidgetValue, &WidgetValue) + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Handle returned by [`Node::watch`](super::node::Node::watch), used to unwatch on teardown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WatchId(u64);

struct WatchEntry {
    id: WatchId,
    widget: String,
    reaction: Reaction,
}

/// Subscriber list for one node, keyed by widget name.
#[derive(Default)]
pub struct Watchers {
    next_id: u64,
    entries: Vec<WatchEntry>,
}

impl fmt::Debug for Watchers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Watchers")
            .field("count", &self.entries.len())
            .field("widgets", &self.entries.iter().map(|e| e.widget.as_str()).collect::<Vec<_>>())
            .finish()
    }
}

impl Watchers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, widget: &str, reaction: Reaction) -> WatchId {
        let id = WatchId(self.next_id);
        self.next_id += 1;
        self.entries.push(WatchEntry {
            id,
            widget: widget.to_string(),
            reaction,
        });
        id
    }

    pub fn remove(&mut self, id: WatchId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        self.entries.len() != before
    }

    /// Snapshot of reactions for a widget, in subscription order.
    ///
    /// Cloned out so reactions can borrow the node mutably.
    pub fn for_widget(&self, widget: &str) -> Vec<Reaction> {
        self.entries
            .iter()
            .filter(|e| e.widget == widget)
            .map(|e| Arc::clone(&e.reaction))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
