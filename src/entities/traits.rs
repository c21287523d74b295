//! Abstract traits for the host collaborator.
//!
//! The node-graph host owns the canvas. The control layer only asks it to
//! redraw; everything else about rendering stays on the host side.

use std::sync::atomic::{AtomicUsize, Ordering};

/// Host canvas invalidation.
pub trait Canvas: Send + Sync {
    /// Ask the host to repaint on its next frame.
    fn request_redraw(&self);
}

/// Canvas that ignores redraw requests (headless replay).
#[derive(Debug, Default, Clone, Copy)]
pub struct NullCanvas;

impl Canvas for NullCanvas {
    fn request_redraw(&self) {}
}

/// Canvas that counts redraw requests.
#[derive(Debug, Default)]
pub struct RedrawCounter {
    count: AtomicUsize,
}

impl RedrawCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.count.store(0, Ordering::SeqCst);
    }
}

impl Canvas for RedrawCounter {
    fn request_redraw(&self) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }
}
