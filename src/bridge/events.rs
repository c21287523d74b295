//! Host events fed to the lifecycle bridge.
//!
//! One enum covers every hook the host exposes, so a live host adapter and
//! a scripted replay go through the same
//! [`NodeLifecycleBridge::dispatch`](super::NodeLifecycleBridge::dispatch).
//!
//! JSON form (`event` tag, snake_case):
//! ```text
//! {"event": "added", "node": {"type": "Saturation", "id": 42}}
//! {"event": "set_value", "node_id": 42, "widget": "saturation", "value": 1.2}
//! {"event": "removed", "node_id": 42}
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::entities::catalog::{build_node, lookup};
use crate::entities::node::{Node, NodeId};
use crate::entities::widget::WidgetValue;
use crate::widgets::compare::PointerKind;

/// A node as the host creates it: type, id, optional size and values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDescriptor {
    #[serde(rename = "type")]
    pub type_tag: String,
    pub id: NodeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<[f32; 2]>,
    /// Deserialized widget values, applied before setup
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub values: IndexMap<String, WidgetValue>,
}

impl NodeDescriptor {
    pub fn new(type_tag: &str, id: NodeId) -> Self {
        Self {
            type_tag: type_tag.to_string(),
            id,
            size: None,
            values: IndexMap::new(),
        }
    }

    pub fn with_value(mut self, name: &str, value: impl Into<WidgetValue>) -> Self {
        self.values.insert(name.to_string(), value.into());
        self
    }

    /// Build the node with catalog widgets. Unknown types get a bare node.
    pub fn build(&self) -> Node {
        let mut node = match lookup(&self.type_tag) {
            Some(spec) => build_node(spec, self.id),
            None => Node::new(self.id, self.type_tag.as_str()),
        };
        if let Some(size) = self.size {
            node.set_size(size);
        }
        for (name, value) in &self.values {
            node.set_value(name, value.clone());
        }
        node
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum HostEvent {
    Added {
        node: NodeDescriptor,
    },
    Removed {
        node_id: NodeId,
    },
    /// Node rebuilt from serialized state (load, undo, redo)
    Configured {
        node_id: NodeId,
    },
    Executed {
        node_id: NodeId,
        output: Value,
    },
    SetValue {
        node_id: NodeId,
        widget: String,
        value: WidgetValue,
    },
    Click {
        node_id: NodeId,
        widget: String,
    },
    Pointer {
        node_id: NodeId,
        kind: PointerKind,
        x: f32,
        #[serde(default)]
        y: f32,
    },
    /// Host frame tick, milliseconds since the session started
    Tick {
        elapsed_ms: u64,
    },
}

impl HostEvent {
    /// Node the event targets, if any.
    pub fn node_id(&self) -> Option<NodeId> {
        match self {
            HostEvent::Added { node } => Some(node.id),
            HostEvent::Removed { node_id }
            | HostEvent::Configured { node_id }
            | HostEvent::Executed { node_id, .. }
            | HostEvent::SetValue { node_id, .. }
            | HostEvent::Click { node_id, .. }
            | HostEvent::Pointer { node_id, .. } => Some(*node_id),
            HostEvent::Tick { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_script_events() {
        let script = json!([
            {"event": "added", "node": {"type": "Saturation", "id": 42, "values": {"saturation": 0.8}}},
            {"event": "set_value", "node_id": 42, "widget": "saturation", "value": 1.2},
            {"event": "pointer", "node_id": 3, "kind": "move", "x": 100.0},
            {"event": "tick", "elapsed_ms": 250},
            {"event": "removed", "node_id": 42}
        ]);
        let events: Vec<HostEvent> = serde_json::from_value(script).unwrap();
        assert_eq!(events.len(), 5);
        assert_eq!(
            events[1],
            HostEvent::SetValue {
                node_id: 42,
                widget: "saturation".into(),
                value: WidgetValue::Float(1.2)
            }
        );
        assert_eq!(
            events[2],
            HostEvent::Pointer { node_id: 3, kind: PointerKind::Move, x: 100.0, y: 0.0 }
        );
        assert_eq!(events[3].node_id(), None);
        assert_eq!(events[4].node_id(), Some(42));
    }

    #[test]
    fn test_descriptor_builds_catalog_node() {
        let desc = NodeDescriptor::new("ImageZoom", 5).with_value("zoom", 2);
        let node = desc.build();
        assert_eq!(node.type_tag(), "ImageZoom");
        // Integer from serialized state is coerced for the float slider.
        assert_eq!(node.value("zoom"), Some(&WidgetValue::Float(2.0)));

        let bare = NodeDescriptor::new("KSampler", 6).build();
        assert!(bare.widgets().is_empty());
    }
}
