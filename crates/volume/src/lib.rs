//! Authoritative hierarchical key–value tree.
//!
//! A volume is a tree of [`VolumeNode`]s rooted at `"/"`. Every node owns a
//! name, a [`VolumeData`] map, and a set of uniquely named children. The
//! parent holds the only structural reference to a child: unlinking removes
//! that reference while any outstanding handle keeps the subtree alive and
//! fully operational.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use common::{Node, NodeData, NodeError, Value};

/// Reserved name carried by every volume root.
pub const ROOT_NAME: &str = "/";

/// The lock-protected key→value map owned by a single volume node.
///
/// Reads and enumeration share the lock; writes, updates, and removals take
/// it exclusively. Enumeration copies entries under the shared lock.
#[derive(Default)]
pub struct VolumeData {
    entries: RwLock<HashMap<String, Value>>,
}

impl NodeData for VolumeData {
    fn read(&self, key: &str) -> Option<Value> {
        self.entries.read().unwrap().get(key).cloned()
    }

    fn write(&self, key: &str, value: Value) {
        self.entries.write().unwrap().insert(key.to_owned(), value);
    }

    fn update(&self, key: &str, value: Value) -> bool {
        let mut entries = self.entries.write().unwrap();
        match entries.get_mut(key) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    fn remove(&self, key: &str) -> bool {
        self.entries.write().unwrap().remove(key).is_some()
    }

    fn enumerate(&self) -> Vec<(String, Value)> {
        self.entries
            .read()
            .unwrap()
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }
}

struct Inner {
    name: String,
    data: Arc<VolumeData>,
    children: RwLock<HashMap<String, VolumeNode>>,
}

/// A node in an authoritative volume tree.
///
/// Cloning a handle is cheap and yields a reference to the same node. The
/// data handle is fixed at construction; the child map is guarded by its own
/// reader/writer lock.
#[derive(Clone)]
pub struct VolumeNode {
    inner: Arc<Inner>,
}

impl VolumeNode {
    fn with_name(name: &str) -> Self {
        VolumeNode {
            inner: Arc::new(Inner {
                name: name.to_owned(),
                data: Arc::new(VolumeData::default()),
                children: RwLock::new(HashMap::new()),
            }),
        }
    }

    /// True when both handles refer to the same underlying node.
    pub fn ptr_eq(&self, other: &VolumeNode) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Node for VolumeNode {
    fn create(&self, name: &str) -> Result<VolumeNode, NodeError> {
        if name.is_empty() {
            return Err(NodeError::EmptyName);
        }

        let mut children = self.inner.children.write().unwrap();
        Ok(children
            .entry(name.to_owned())
            .or_insert_with(|| VolumeNode::with_name(name))
            .clone())
    }

    fn find(&self, name: &str) -> Option<VolumeNode> {
        self.inner.children.read().unwrap().get(name).cloned()
    }

    fn unlink(&self, name: &str) -> bool {
        self.inner.children.write().unwrap().remove(name).is_some()
    }

    fn enumerate(&self) -> Vec<VolumeNode> {
        self.inner
            .children
            .read()
            .unwrap()
            .values()
            .cloned()
            .collect()
    }

    fn name(&self) -> String {
        self.inner.name.clone()
    }

    fn open(&self) -> Arc<dyn NodeData> {
        self.inner.data.clone()
    }
}

/// Creates an empty volume and returns its root node.
pub fn create_volume() -> VolumeNode {
    VolumeNode::with_name(ROOT_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_carries_reserved_name() {
        let root = create_volume();
        assert_eq!(root.name(), ROOT_NAME);
        assert!(root.enumerate().is_empty());
    }

    #[test]
    fn create_rejects_empty_name() {
        let root = create_volume();
        assert!(matches!(root.create(""), Err(NodeError::EmptyName)));
        assert!(root.find("").is_none());
    }

    #[test]
    fn concurrent_handles_share_one_child() {
        let root = create_volume();
        let first = root.create("child").unwrap();
        let second = root.create("child").unwrap();
        assert!(first.ptr_eq(&second));
    }
}
