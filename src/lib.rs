//! wtl-live - interactive preview control layer for node-graph image effects
//!
//! Re-exports all modules for use by the binary target.

// Engine (cache, refresh, registry, outbox)
pub mod core;

// Data model and node-side behaviour
pub mod entities;
pub mod widgets;

// Backend protocol and host integration
pub mod bridge;
pub mod protocol;

// App modules
pub mod cli;
pub mod config;
pub mod replay;
pub mod server;

pub use bridge::{HostEvent, NodeDescriptor, NodeLifecycleBridge};
pub use config::Settings;
pub use self::core::{NodeRegistry, Outbox, PreviewImageCache, RefreshScheduler};
pub use entities::{Node, NodeHandle, NodeId, WidgetValue};
pub use protocol::{Action, ControlSignalClient, ParamSyncClient};
