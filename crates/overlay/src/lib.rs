//! Overlay view composing several volume subtrees into one virtual tree.
//!
//! A [`StorageNode`] presents an ordered stack of [`VolumeNode`] layers as a
//! single logical node: children are the union of co-named children across
//! layers and the data map is the merged key-space with top-layer priority.
//! The layer list is frozen when a node materializes (on `mount`, `find`,
//! `create`, or `enumerate`); mounts and unmounts become visible only through
//! freshly materialized nodes at the same path, which share one per-path
//! [metadata record](meta::MetadataRecord). A mount stays globally visible
//! for exactly as long as its token remains alive; the token is held by the
//! node `mount` returned and by anything mounted over it.

mod data;
mod error;
mod meta;

use std::collections::HashMap;
use std::sync::Arc;

use common::{Node, NodeData, NodeError};
use volume::VolumeNode;

use meta::{MetadataRecord, MountPoint};

pub use data::StorageData;
pub use error::MountError;

/// Virtual node overlaying one or more volume nodes at a logical path.
///
/// Handles are cheap to clone; the layer stack is immutable for the life of
/// the handle.
#[derive(Clone)]
pub struct StorageNode {
    meta: Arc<MetadataRecord>,
    layers: Vec<VolumeNode>,
    mount: Option<Arc<MountPoint>>,
}

impl StorageNode {
    fn new(
        meta: Arc<MetadataRecord>,
        layers: Vec<VolumeNode>,
        mount: Option<Arc<MountPoint>>,
    ) -> Self {
        debug_assert!(!layers.is_empty());
        Self {
            meta,
            layers,
            mount,
        }
    }

    fn top_layer(&self) -> &VolumeNode {
        self.layers
            .last()
            .expect("storage node always has at least one layer")
    }

    /// Stacks `node` as the new top layer at this path.
    ///
    /// The mount is registered with this path's metadata record and stays
    /// visible to future lookups while the returned node, or any node
    /// mounted over it, is alive. The current node is not affected.
    #[must_use = "the mount is released as soon as the returned node is dropped"]
    pub fn mount(&self, node: &VolumeNode) -> StorageNode {
        let token = MetadataRecord::add_mount(&self.meta, node.clone(), self.mount.clone());
        let mut layers = self.layers.clone();
        layers.push(node.clone());
        StorageNode::new(self.meta.clone(), layers, Some(token))
    }

    /// Left-fold of [`mount`](Self::mount) over `nodes`, bottom first.
    pub fn mount_all(&self, nodes: &[VolumeNode]) -> Result<StorageNode, MountError> {
        let (first, rest) = nodes.split_first().ok_or(MountError::NoVolumes)?;
        let mut mounted = self.mount(first);
        for node in rest {
            mounted = mounted.mount(node);
        }

        Ok(mounted)
    }
}

impl Node for StorageNode {
    fn create(&self, name: &str) -> Result<StorageNode, NodeError> {
        if let Some(existing) = self.find(name) {
            return Ok(existing);
        }

        let layer = self.top_layer().create(name)?;
        let child_meta = self.meta.child(name);
        // Mount points were already consulted by the find above.
        Ok(StorageNode::new(child_meta, vec![layer], None))
    }

    fn find(&self, name: &str) -> Option<StorageNode> {
        let mut child_layers: Vec<VolumeNode> = self
            .layers
            .iter()
            .filter_map(|layer| layer.find(name))
            .collect();

        let child_meta = self.meta.child(name);
        child_meta.collect_mounts(&mut child_layers);
        if child_layers.is_empty() {
            self.meta.remove_child(name);
            return None;
        }

        Some(StorageNode::new(child_meta, child_layers, None))
    }

    fn unlink(&self, name: &str) -> bool {
        let mut unlinked = false;
        for layer in &self.layers {
            unlinked = layer.unlink(name) || unlinked;
        }

        self.meta.remove_child(name);
        unlinked
    }

    fn enumerate(&self) -> Vec<StorageNode> {
        let mut groups: HashMap<String, Vec<VolumeNode>> = HashMap::new();
        for layer in &self.layers {
            for child in layer.enumerate() {
                groups.entry(child.name()).or_default().push(child);
            }
        }

        groups
            .into_iter()
            .map(|(name, mut child_layers)| {
                let child_meta = self.meta.child(&name);
                child_meta.collect_mounts(&mut child_layers);
                StorageNode::new(child_meta, child_layers, None)
            })
            .collect()
    }

    fn name(&self) -> String {
        self.meta.name().to_owned()
    }

    fn open(&self) -> Arc<dyn NodeData> {
        let layer_data = self.layers.iter().map(|layer| layer.open()).collect();
        Arc::new(StorageData::new(layer_data))
    }
}

/// Wraps a single volume into a storage overlay rooted at `"/"`.
pub fn mount_storage(node: &VolumeNode) -> StorageNode {
    StorageNode::new(
        MetadataRecord::new(volume::ROOT_NAME),
        vec![node.clone()],
        None,
    )
}

/// Overlays `nodes` bottom→top into a storage root; the set must be
/// non-empty. Later entries shadow earlier ones.
pub fn mount_storage_all(nodes: &[VolumeNode]) -> Result<StorageNode, MountError> {
    let (first, rest) = nodes.split_first().ok_or(MountError::NoVolumes)?;
    let root = mount_storage(first);
    if rest.is_empty() {
        return Ok(root);
    }

    root.mount_all(rest)
}
