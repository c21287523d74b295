//! Live node registry.
//!
//! The only place that holds host node handles. Entries are added on the
//! host's node-added hook and removed on node-removed, both driven by the
//! lifecycle bridge; no other component keeps a node past its removal.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use log::debug;

use crate::entities::node::{NodeHandle, NodeId};

#[derive(Debug, Clone)]
struct Entry {
    handle: NodeHandle,
    preview_capable: bool,
}

/// Cloning yields another handle to the same registry.
#[derive(Debug, Clone, Default)]
pub struct NodeRegistry {
    nodes: Arc<RwLock<BTreeMap<NodeId, Entry>>>,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a node. Returns the handle previously registered under `id`.
    pub fn register(&self, id: NodeId, handle: NodeHandle, preview_capable: bool) -> Option<NodeHandle> {
        let mut nodes = self.nodes.write().unwrap_or_else(|e| e.into_inner());
        debug!("NodeRegistry: register {} (preview={})", id, preview_capable);
        nodes
            .insert(id, Entry { handle, preview_capable })
            .map(|e| e.handle)
    }

    /// Stop tracking a node. Returns its handle if it was registered.
    pub fn unregister(&self, id: NodeId) -> Option<NodeHandle> {
        let mut nodes = self.nodes.write().unwrap_or_else(|e| e.into_inner());
        let removed = nodes.remove(&id).map(|e| e.handle);
        if removed.is_some() {
            debug!("NodeRegistry: unregister {}", id);
        }
        removed
    }

    pub fn get(&self, id: NodeId) -> Option<NodeHandle> {
        let nodes = self.nodes.read().unwrap_or_else(|e| e.into_inner());
        nodes.get(&id).map(|e| Arc::clone(&e.handle))
    }

    /// Nodes that display backend preview images, in id order.
    pub fn preview_nodes(&self) -> Vec<(NodeId, NodeHandle)> {
        let nodes = self.nodes.read().unwrap_or_else(|e| e.into_inner());
        nodes
            .iter()
            .filter(|(_, e)| e.preview_capable)
            .map(|(id, e)| (*id, Arc::clone(&e.handle)))
            .collect()
    }

    /// Handle for `id` only if it was registered as preview-capable.
    pub fn get_preview(&self, id: NodeId) -> Option<NodeHandle> {
        let nodes = self.nodes.read().unwrap_or_else(|e| e.into_inner());
        nodes
            .get(&id)
            .filter(|e| e.preview_capable)
            .map(|e| Arc::clone(&e.handle))
    }

    pub fn len(&self) -> usize {
        self.nodes.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::node::Node;

    #[test]
    fn test_register_unregister() {
        let reg = NodeRegistry::new();
        let a = Node::new(1, "Saturation").into_handle();
        assert!(reg.register(1, a.clone(), true).is_none());
        assert!(Arc::ptr_eq(&reg.get(1).unwrap(), &a));

        let b = Node::new(1, "Saturation").into_handle();
        let prev = reg.register(1, b, true).unwrap();
        assert!(Arc::ptr_eq(&prev, &a));
        assert_eq!(reg.len(), 1);

        assert!(reg.unregister(1).is_some());
        assert!(reg.unregister(1).is_none());
        assert!(reg.get(1).is_none());
    }

    #[test]
    fn test_preview_nodes_filtered_and_ordered() {
        let reg = NodeRegistry::new();
        reg.register(9, Node::new(9, "RAMPreviewImage").into_handle(), true);
        reg.register(2, Node::new(2, "AdvancedEmptyLatent").into_handle(), false);
        reg.register(4, Node::new(4, "ImageZoom").into_handle(), true);
        let ids: Vec<_> = reg.preview_nodes().into_iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![4, 9]);
        assert_eq!(reg.len(), 3);
        assert!(reg.get_preview(4).is_some());
        assert!(reg.get_preview(2).is_none());
        assert!(reg.get(2).is_some());
    }
}
