//! Entities module - the data model the control layer operates on
//!
//! - [`Node`] / [`NodeHandle`]: host-owned node with widgets and image slots
//! - [`Widget`]: one control, its value and its layout state
//! - [`watch`]: value watchers attached at the storage level
//! - [`catalog`]: static node-type descriptions
//! - [`image`]: encoded preview blobs and decoded rasters
//! - [`traits`]: host canvas interface

pub mod catalog;
pub mod image;
pub mod node;
pub mod traits;
pub mod watch;
pub mod widget;

pub use catalog::{Behavior, NodeSpec, CATALOG};
pub use image::{ImageBlob, PreviewImage};
pub use node::{lock, Node, NodeHandle, NodeId, PreviewMode};
pub use traits::{Canvas, NullCanvas, RedrawCounter};
pub use watch::{reaction, Reaction, WatchId};
pub use widget::{SizeRule, Widget, WidgetKind, WidgetOrigin, WidgetValue};
