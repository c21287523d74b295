//! Wire messages for the backend preview loop.
//!
//! ```text
//! POST /params   {"node_id": 42, "node_type": "sat", "saturation": 1.2}
//! POST /control  {"node_id": 42, "node_type": "sat", "action": "skip"}
//! ```
//!
//! Parameter messages always carry every watched widget of the node, never
//! a delta.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::entities::node::NodeId;
use crate::entities::widget::WidgetValue;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterMessage {
    pub node_id: NodeId,
    pub node_type: String,
    /// Widget values, flattened into the top-level object in widget order
    #[serde(flatten)]
    pub values: IndexMap<String, WidgetValue>,
}

/// Terminal preview-loop actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Apply,
    Skip,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Apply => "apply",
            Action::Skip => "skip",
        }
    }

    /// Case-insensitive parse, as the backend accepts it.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "apply" => Some(Action::Apply),
            "skip" => Some(Action::Skip),
            _ => None,
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlSignal {
    pub node_id: NodeId,
    pub node_type: String,
    pub action: Action,
}
