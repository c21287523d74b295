//! Core engine modules - cache, refresh, registry, outbox
//!
//! These modules hold the session state behind the lifecycle bridge,
//! independent of any host UI.

pub mod outbox;
pub mod preview_cache;
pub mod refresh;
pub mod registry;

pub use outbox::Outbox;
pub use preview_cache::{CacheStats, ImageSlots, PreviewImageCache};
pub use refresh::{RefreshScheduler, DEFAULT_REFRESH_MS};
pub use registry::NodeRegistry;
