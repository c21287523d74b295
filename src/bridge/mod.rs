//! Host integration: lifecycle bridge, per-type setup, host events.

pub mod events;
pub mod lifecycle;
pub mod payload;
pub mod setup;

pub use events::{HostEvent, NodeDescriptor};
pub use lifecycle::{BridgeStats, NodeLifecycleBridge};
pub use payload::parse_images;
pub use setup::{ResolutionPresets, SetupContext, SetupFn, SetupHandle, SetupRegistry};
