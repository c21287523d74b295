//! Dual-image compare renderer.
//!
//! Draws the node's first two image slots on top of each other inside the
//! node's content area (below the widget rows). Image A is always drawn;
//! image B is revealed either left of the pointer (slide mode) or entirely
//! while the button is held (click mode).
//!
//! State machine:
//! ```text
//! slide: Idle --enter/move--> Sliding{x} --move--> Sliding{x'}
//! click: Idle --enter/move--> Hover --down--> Holding
//! leave: any -> Idle    up: Holding -> Idle
//! ```
//!
//! The renderer owns the node's images: attaching it switches the node to
//! [`PreviewMode::Custom`] so the host's default list is not drawn as well.
//! Frames are recomputed from the node's current size on every call.

use log::trace;
use serde::{Deserialize, Serialize};

use super::coords::{letterbox, Rect};
use crate::entities::node::{Node, PreviewMode};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompareMode {
    #[default]
    Slide,
    Click,
}

impl CompareMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompareMode::Slide => "slide",
            CompareMode::Click => "click",
        }
    }

    /// Parse a combo value. Unknown strings fall back to slide.
    pub fn from_str(s: &str) -> Self {
        match s {
            "click" => CompareMode::Click,
            _ => CompareMode::Slide,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum CompareState {
    #[default]
    Idle,
    Hover,
    /// Reveal boundary at node-local x
    Sliding { x: f32 },
    Holding,
}

/// Pointer events scoped to a node's screen region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerKind {
    Enter,
    Leave,
    Move,
    Down,
    Up,
}

/// One image blit: slot index, letterboxed destination, clip rect.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawOp {
    pub slot: usize,
    pub dest: Rect,
    pub clip: Rect,
}

#[derive(Debug, Clone, Default)]
pub struct CompareRenderer {
    mode: CompareMode,
    state: CompareState,
}

impl CompareRenderer {
    pub fn new(mode: CompareMode) -> Self {
        Self { mode, state: CompareState::Idle }
    }

    /// Take over image drawing for `node`.
    pub fn attach(&self, node: &mut Node) {
        node.set_preview_mode(PreviewMode::Custom);
    }

    pub fn mode(&self) -> CompareMode {
        self.mode
    }

    /// Switch mode; any reveal in progress is dropped.
    pub fn set_mode(&mut self, mode: CompareMode) {
        if self.mode != mode {
            self.mode = mode;
            self.state = CompareState::Idle;
        }
    }

    pub fn state(&self) -> CompareState {
        self.state
    }

    /// Feed a pointer event at node-local `x`. Returns true if a redraw is needed.
    pub fn handle_pointer(&mut self, kind: PointerKind, x: f32) -> bool {
        use CompareState::*;
        let next = match (self.mode, kind, self.state) {
            (_, PointerKind::Leave, _) => Idle,
            (CompareMode::Slide, PointerKind::Enter | PointerKind::Move, _) => Sliding { x },
            (CompareMode::Click, PointerKind::Enter, Idle) => Hover,
            (CompareMode::Click, PointerKind::Move, Idle) => Hover,
            (CompareMode::Click, PointerKind::Down, _) => Holding,
            (CompareMode::Click, PointerKind::Up, Holding) => Idle,
            (_, _, s) => s,
        };
        let changed = next != self.state;
        if changed {
            trace!("compare: {:?} --{:?}--> {:?}", self.state, kind, next);
        }
        self.state = next;
        changed
    }

    /// Content area of the node: full width, below the widget rows.
    pub fn content_rect(node: &Node) -> Rect {
        let [w, h] = node.size();
        let top = node.widgets_height().min(h);
        Rect::new(0.0, top, w, h - top)
    }

    /// Draw list for the current frame.
    ///
    /// Empty unless both of the first two slots hold an image.
    pub fn frame(&self, node: &Node) -> Vec<DrawOp> {
        let images = node.images();
        let (Some(Some(a)), Some(Some(b))) = (images.first(), images.get(1)) else {
            return Vec::new();
        };
        let content = Self::content_rect(node);
        if content.is_empty() {
            return Vec::new();
        }

        let mut ops = vec![DrawOp {
            slot: 0,
            dest: letterbox(a.width, a.height, content),
            clip: content,
        }];
        let reveal = match self.state {
            CompareState::Sliding { x } => Some(content.left_of(x)),
            CompareState::Holding => Some(content),
            CompareState::Idle | CompareState::Hover => None,
        };
        if let Some(clip) = reveal.filter(|r| !r.is_empty()) {
            ops.push(DrawOp {
                slot: 1,
                dest: letterbox(b.width, b.height, content),
                clip,
            });
        }
        ops
    }
}
