use std::collections::HashSet;
use std::sync::Arc;

use common::{NodeData, Value};

/// Stacked view over the data maps of every layer of a storage node.
///
/// Layers run bottom→top; higher layers shadow lower ones on reads, while
/// writes keep each key on the layer it originated from so that unmounting
/// restores the pre-mount view.
pub struct StorageData {
    layers: Vec<Arc<dyn NodeData>>,
}

impl StorageData {
    pub(crate) fn new(layers: Vec<Arc<dyn NodeData>>) -> Self {
        debug_assert!(!layers.is_empty());
        Self { layers }
    }

    fn top(&self) -> &dyn NodeData {
        self.layers
            .last()
            .expect("storage data always has at least one layer")
            .as_ref()
    }
}

impl NodeData for StorageData {
    fn read(&self, key: &str) -> Option<Value> {
        self.layers.iter().rev().find_map(|layer| layer.read(key))
    }

    fn write(&self, key: &str, value: Value) {
        // An existing key stays on its (topmost) origin layer; a new key
        // lands on the freshest layer.
        if !self.update(key, value.clone()) {
            self.top().write(key, value);
        }
    }

    fn update(&self, key: &str, value: Value) -> bool {
        self.layers
            .iter()
            .rev()
            .any(|layer| layer.update(key, value.clone()))
    }

    fn remove(&self, key: &str) -> bool {
        let mut removed = false;
        for layer in self.layers.iter().rev() {
            removed = layer.remove(key) || removed;
        }
        removed
    }

    fn enumerate(&self) -> Vec<(String, Value)> {
        let mut seen = HashSet::new();
        let mut entries = Vec::new();
        for layer in self.layers.iter().rev() {
            for (key, value) in layer.enumerate() {
                if seen.insert(key.clone()) {
                    entries.push((key, value));
                }
            }
        }

        entries
    }
}
