//! Session cache of the latest preview images per node.
//!
//! Structure: HashMap<NodeId, Vec<Option<ImageBlob>>>
//! - Written whenever backend execution delivers images for a node
//! - Read by the refresh scheduler to restore images after undo/redo
//! - Entry removed when the node is removed
//!
//! Memory only. Nothing here is written to disk; entries live for one
//! session. Blobs are kept encoded and decoded on restore.
//!
//! The staleness flag is process-wide: any configure event sets it and the
//! next restore pass clears it.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use log::debug;

use crate::entities::image::ImageBlob;
use crate::entities::node::NodeId;

/// Image slots as delivered; `None` keeps a slot that had no image.
pub type ImageSlots = Vec<Option<ImageBlob>>;

/// Hit/miss counters for restore lookups.
#[derive(Debug, Default)]
pub struct CacheStats {
    hits: AtomicU64,
    misses: AtomicU64,
}

impl CacheStats {
    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }
}

/// Cloning yields another handle to the same store.
#[derive(Debug, Clone, Default)]
pub struct PreviewImageCache {
    entries: Arc<Mutex<HashMap<NodeId, ImageSlots>>>,
    stale: Arc<AtomicBool>,
    stats: Arc<CacheStats>,
}

impl PreviewImageCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store images for a node, replacing any previous entry.
    pub fn save(&self, node_id: NodeId, images: ImageSlots) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        debug!("PreviewImageCache: save node {} ({} slots)", node_id, images.len());
        entries.insert(node_id, images);
    }

    /// Last saved images for a node, or `None` if absent.
    pub fn get(&self, node_id: NodeId) -> Option<ImageSlots> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let result = entries.get(&node_id).cloned();
        match result {
            Some(_) => self.stats.record_hit(),
            None => self.stats.record_miss(),
        }
        result
    }

    pub fn contains(&self, node_id: NodeId) -> bool {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.contains_key(&node_id)
    }

    /// Drop a node's entry. Returns true if one existed.
    pub fn remove(&self, node_id: NodeId) -> bool {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let removed = entries.remove(&node_id).is_some();
        if removed {
            debug!("PreviewImageCache: removed node {}", node_id);
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // ========== Staleness ==========

    /// Displayed images may no longer match the cache.
    pub fn mark_stale(&self) {
        self.stale.store(true, Ordering::SeqCst);
    }

    pub fn is_stale(&self) -> bool {
        self.stale.load(Ordering::SeqCst)
    }

    /// Clear the flag. Returns whether it was set.
    pub fn clear_stale(&self) -> bool {
        self.stale.swap(false, Ordering::SeqCst)
    }

    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blob(b: u8) -> Option<ImageBlob> {
        Some(ImageBlob::new(vec![b, b, b]))
    }

    #[test]
    fn test_save_get_round_trip() {
        let cache = PreviewImageCache::new();
        let imgs = vec![blob(1), None, blob(3)];
        cache.save(42, imgs.clone());
        assert_eq!(cache.get(42), Some(imgs));
        assert_eq!(cache.get(7), None);
        assert_eq!(cache.stats().hits(), 1);
        assert_eq!(cache.stats().misses(), 1);
    }

    #[test]
    fn test_save_overwrites() {
        let cache = PreviewImageCache::new();
        cache.save(1, vec![blob(1), blob(2)]);
        cache.save(1, vec![blob(9)]);
        assert_eq!(cache.get(1), Some(vec![blob(9)]));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_remove() {
        let cache = PreviewImageCache::new();
        cache.save(5, vec![blob(5)]);
        assert!(cache.remove(5));
        assert!(!cache.remove(5));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_stale_flag_shared_between_clones() {
        let cache = PreviewImageCache::new();
        let other = cache.clone();
        assert!(!cache.is_stale());
        other.mark_stale();
        assert!(cache.is_stale());
        assert!(cache.clear_stale());
        assert!(!other.clear_stale());
    }
}
