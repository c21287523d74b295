//! Refresh scheduler - restores cached preview images after undo/redo.
//!
//! The host rebuilds nodes on undo/redo and the rebuilt nodes come back
//! without their images. There is no single "graph settled" event, so the
//! bridge marks the cache stale on every configure and this scheduler polls:
//! 1. Between intervals, `tick()` returns immediately
//! 2. On an interval boundary with the flag unset, nothing happens
//! 3. With the flag set, every registered preview node gets its cached
//!    images back, then one redraw is requested and the flag is cleared
//!
//! # Usage
//! ```ignore
//! // In the host's frame/update loop:
//! if let Some(n) = scheduler.tick() {
//!     log::debug!("restored {} nodes", n);
//! }
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, trace};

use super::preview_cache::PreviewImageCache;
use super::registry::NodeRegistry;
use crate::entities::image::decode_all;
use crate::entities::node::lock;
use crate::entities::traits::Canvas;

pub const DEFAULT_REFRESH_MS: u64 = 100;

pub struct RefreshScheduler {
    interval: Duration,
    last_tick: Option<Instant>,
    cache: PreviewImageCache,
    registry: NodeRegistry,
    canvas: Arc<dyn Canvas>,
}

impl RefreshScheduler {
    pub fn new(interval_ms: u64, cache: PreviewImageCache, registry: NodeRegistry, canvas: Arc<dyn Canvas>) -> Self {
        Self {
            interval: Duration::from_millis(interval_ms),
            last_tick: None,
            cache,
            registry,
            canvas,
        }
    }

    pub fn interval_ms(&self) -> u64 {
        self.interval.as_millis() as u64
    }

    /// Poll with the wall clock.
    pub fn tick(&mut self) -> Option<usize> {
        self.tick_at(Instant::now())
    }

    /// Poll at `now`. Returns the number of nodes restored when a pass ran.
    pub fn tick_at(&mut self, now: Instant) -> Option<usize> {
        if let Some(last) = self.last_tick
            && now.saturating_duration_since(last) < self.interval
        {
            return None;
        }
        self.last_tick = Some(now);

        if !self.cache.is_stale() {
            return None;
        }
        Some(self.restore_pass())
    }

    /// Restore every registered preview node from the cache.
    ///
    /// Nodes without an entry keep whatever they show. Exactly one redraw is
    /// requested for the whole pass.
    pub fn restore_pass(&self) -> usize {
        let mut restored = 0;
        for (id, handle) in self.registry.preview_nodes() {
            let Some(blobs) = self.cache.get(id) else {
                trace!("RefreshScheduler: no cache entry for node {}", id);
                continue;
            };
            let images = decode_all(&blobs);
            lock(&handle).set_images(images);
            restored += 1;
        }
        self.canvas.request_redraw();
        self.cache.clear_stale();
        debug!("RefreshScheduler: restore pass, {} nodes", restored);
        restored
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::image::{encode_png, ImageBlob};
    use crate::entities::node::Node;
    use crate::entities::traits::RedrawCounter;

    struct Fixture {
        cache: PreviewImageCache,
        registry: NodeRegistry,
        canvas: Arc<RedrawCounter>,
        scheduler: RefreshScheduler,
    }

    fn fixture(interval_ms: u64) -> Fixture {
        let cache = PreviewImageCache::new();
        let registry = NodeRegistry::new();
        let canvas = Arc::new(RedrawCounter::new());
        let scheduler = RefreshScheduler::new(interval_ms, cache.clone(), registry.clone(), canvas.clone());
        Fixture { cache, registry, canvas, scheduler }
    }

    fn png(w: u32, h: u32) -> ImageBlob {
        encode_png(w, h, [10, 20, 30, 255]).unwrap()
    }

    #[test]
    fn test_no_pass_without_stale_flag() {
        let mut f = fixture(100);
        f.registry.register(1, Node::new(1, "RAMPreviewImage").into_handle(), true);
        f.cache.save(1, vec![Some(png(2, 2))]);
        assert_eq!(f.scheduler.tick_at(Instant::now()), None);
        assert_eq!(f.canvas.count(), 0);
    }

    #[test]
    fn test_restore_pass_one_redraw_for_batch() {
        let mut f = fixture(100);
        let a = Node::new(1, "RAMPreviewImage").into_handle();
        let b = Node::new(2, "ImageZoom").into_handle();
        let c = Node::new(3, "ImageZoom").into_handle();
        f.registry.register(1, a.clone(), true);
        f.registry.register(2, b.clone(), true);
        f.registry.register(3, c.clone(), true);
        f.cache.save(1, vec![Some(png(4, 2)), None]);
        f.cache.save(2, vec![Some(png(3, 3))]);

        f.cache.mark_stale();
        assert_eq!(f.scheduler.tick_at(Instant::now()), Some(2));
        assert_eq!(f.canvas.count(), 1);
        assert!(!f.cache.is_stale());

        let a = lock(&a);
        assert_eq!(a.images().len(), 2);
        assert_eq!(a.images()[0].as_ref().unwrap().resolution(), (4, 2));
        assert!(a.images()[1].is_none());
        assert_eq!(lock(&b).images()[0].as_ref().unwrap().resolution(), (3, 3));
        // Cache miss leaves the node untouched.
        assert!(lock(&c).images().is_empty());
    }

    #[test]
    fn test_interval_gates_passes() {
        let mut f = fixture(100);
        let t0 = Instant::now();
        assert_eq!(f.scheduler.tick_at(t0), None);

        f.cache.mark_stale();
        assert_eq!(f.scheduler.tick_at(t0 + Duration::from_millis(50)), None);
        assert!(f.cache.is_stale());
        assert_eq!(f.scheduler.tick_at(t0 + Duration::from_millis(100)), Some(0));
        assert_eq!(f.canvas.count(), 1);
    }
}
