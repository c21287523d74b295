//! Parameter sync and control signal clients.
//!
//! Both serialize a message and hand the POST to the [`Outbox`]; the caller
//! never waits and never sees a failure.

use std::sync::Arc;

use indexmap::IndexMap;
use log::{debug, warn};
use serde::Serialize;

use super::messages::{Action, ControlSignal, ParameterMessage};
use super::transport::Transport;
use crate::core::outbox::Outbox;
use crate::entities::node::NodeId;
use crate::entities::widget::WidgetValue;

pub const DEFAULT_PARAMS_ROUTE: &str = "/params";
pub const DEFAULT_CONTROL_ROUTE: &str = "/control";

/// Shared send path: serialize, then post through the outbox.
#[derive(Clone)]
struct Sender {
    transport: Arc<dyn Transport>,
    outbox: Arc<Outbox>,
    route: String,
}

impl Sender {
    fn send<T: Serialize>(&self, label: &str, message: &T) {
        let body = match serde_json::to_value(message) {
            Ok(body) => body,
            Err(e) => {
                warn!("Failed to serialize {}: {}", label, e);
                return;
            }
        };
        let transport = Arc::clone(&self.transport);
        let route = self.route.clone();
        self.outbox.submit(label, move || transport.post_json(&route, &body));
    }
}

#[derive(Clone)]
pub struct ParamSyncClient {
    sender: Sender,
}

impl ParamSyncClient {
    pub fn new(transport: Arc<dyn Transport>, outbox: Arc<Outbox>, route: &str) -> Self {
        Self {
            sender: Sender { transport, outbox, route: route.to_string() },
        }
    }

    /// Send the full current parameter set of a node.
    pub fn send_params(&self, node_id: NodeId, node_type: &str, values: IndexMap<String, WidgetValue>) {
        debug!("params node {} ({}): {} values", node_id, node_type, values.len());
        let message = ParameterMessage {
            node_id,
            node_type: node_type.to_string(),
            values,
        };
        self.sender.send("params", &message);
    }
}

#[derive(Clone)]
pub struct ControlSignalClient {
    sender: Sender,
}

impl ControlSignalClient {
    pub fn new(transport: Arc<dyn Transport>, outbox: Arc<Outbox>, route: &str) -> Self {
        Self {
            sender: Sender { transport, outbox, route: route.to_string() },
        }
    }

    pub fn send_signal(&self, node_id: NodeId, node_type: &str, action: Action) {
        debug!("control node {} ({}): {}", node_id, node_type, action);
        let signal = ControlSignal {
            node_id,
            node_type: node_type.to_string(),
            action,
        };
        self.sender.send("control", &signal);
    }
}
