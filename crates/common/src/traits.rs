use std::sync::Arc;

use crate::{FromValue, NodeError, Value};

/// The key→value map attached to every tree node.
///
/// Implementations are internally synchronized: every method is safe to call
/// concurrently from any number of threads. Operations on one instance are
/// linearizable; no ordering holds across distinct instances.
pub trait NodeData: Send + Sync {
    /// Returns the value stored under `key`, or `None`.
    fn read(&self, key: &str) -> Option<Value>;

    /// Inserts or overwrites the entry for `key`.
    fn write(&self, key: &str, value: Value);

    /// Overwrites the entry for `key` only if it already exists.
    ///
    /// Returns `false`, leaving the map untouched, when the key is absent.
    fn update(&self, key: &str, value: Value) -> bool;

    /// Drops the entry for `key`. Returns `false` when the key was absent.
    fn remove(&self, key: &str) -> bool;

    /// Copied snapshot of all live entries. Order is unspecified but stable
    /// within one call; holding the result across mutations is unsupported.
    fn enumerate(&self) -> Vec<(String, Value)>;
}

/// Typed read sugar available on any [`NodeData`], trait objects included.
pub trait NodeDataExt {
    /// Reads `key` and extracts the payload when the alternative matches `T`.
    fn read_as<T: FromValue>(&self, key: &str) -> Option<T>;
}

impl<D: NodeData + ?Sized> NodeDataExt for D {
    fn read_as<T: FromValue>(&self, key: &str) -> Option<T> {
        self.read(key).and_then(|value| value.try_as::<T>())
    }
}

/// The shape shared by the two node families: authoritative volume nodes and
/// virtual storage nodes. Handles are cheap to clone and refer to the same
/// underlying node.
pub trait Node: Clone + Send + Sync {
    /// Returns the existing child named `name`, creating it first if needed.
    /// Concurrent creates for one name converge on the same child.
    fn create(&self, name: &str) -> Result<Self, NodeError>;

    /// Returns the child named `name`, or `None`. Never inserts.
    ///
    /// A `None` observed at one instant does not preclude a concurrent
    /// create from landing right after; callers needing the child must retry.
    fn find(&self, name: &str) -> Option<Self>;

    /// Drops this node's structural reference to the child. The child stays
    /// fully functional through any outstanding handle.
    fn unlink(&self, name: &str) -> bool;

    /// Snapshot of the current children.
    fn enumerate(&self) -> Vec<Self>;

    /// The name fixed at construction; roots are named "/".
    fn name(&self) -> String;

    /// The data map of this node.
    fn open(&self) -> Arc<dyn NodeData>;
}
