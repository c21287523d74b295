//! Node-side UI behaviour
//!
//! - [`visibility`]: show/hide with exact restore and exclusive groups
//! - [`compare`]: dual-image slide/click compare renderer
//! - [`coords`]: node-local rects and letterboxing

pub mod compare;
pub mod coords;
pub mod visibility;

pub use compare::{CompareMode, CompareRenderer, CompareState, DrawOp, PointerKind};
pub use coords::{letterbox, Rect};
pub use visibility::{ExclusiveGroup, VisibilityController};
