use std::collections::HashMap;
use std::sync::{Arc, RwLock, Weak};

use tracing::debug;
use uuid::Uuid;
use volume::VolumeNode;

/// Identity of one live mount registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct MountId(Uuid);

impl MountId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

/// Token whose lifetime governs one mount's visibility.
///
/// Holds the mounted volume node plus the token of the mount below it, so a
/// node derived by stacking mounts keeps every overlapping mount alive.
/// Dropping the last handle deregisters the mount from its metadata record.
pub(crate) struct MountPoint {
    id: MountId,
    node: VolumeNode,
    _next: Option<Arc<MountPoint>>,
    owner: Weak<MetadataRecord>,
}

impl MountPoint {
    pub(crate) fn node(&self) -> &VolumeNode {
        &self.node
    }
}

impl Drop for MountPoint {
    fn drop(&mut self) {
        if let Some(owner) = self.owner.upgrade() {
            owner.remove_mount(self.id);
        }
    }
}

#[derive(Default)]
struct MetaState {
    children: HashMap<String, Arc<MetadataRecord>>,
    mounts: Vec<(MountId, Weak<MountPoint>)>,
}

/// Shared per-path bookkeeping for a storage tree.
///
/// Two storage nodes at the same logical path share one record. The record
/// lazily links child records and tracks the mounts registered at its path
/// through weak references, so a record never keeps a mount alive by itself.
pub(crate) struct MetadataRecord {
    name: String,
    state: RwLock<MetaState>,
}

impl MetadataRecord {
    pub(crate) fn new(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_owned(),
            state: RwLock::new(MetaState::default()),
        })
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    /// Returns the child record for `name`, creating it on first use.
    pub(crate) fn child(&self, name: &str) -> Arc<MetadataRecord> {
        if let Some(child) = self.state.read().unwrap().children.get(name) {
            return child.clone();
        }

        let mut state = self.state.write().unwrap();
        state
            .children
            .entry(name.to_owned())
            .or_insert_with(|| MetadataRecord::new(name))
            .clone()
    }

    /// Forgets the child record at `name`. A later lookup rebuilds it.
    pub(crate) fn remove_child(&self, name: &str) {
        self.state.write().unwrap().children.remove(name);
    }

    /// Registers `node` as a live mount at this path and returns its token,
    /// chained onto `next`. Expired registrations are pruned on the way in.
    pub(crate) fn add_mount(
        this: &Arc<Self>,
        node: VolumeNode,
        next: Option<Arc<MountPoint>>,
    ) -> Arc<MountPoint> {
        let mount = Arc::new(MountPoint {
            id: MountId::new(),
            node,
            _next: next,
            owner: Arc::downgrade(this),
        });

        let mut state = this.state.write().unwrap();
        state.mounts.retain(|(_, weak)| weak.strong_count() > 0);
        state.mounts.push((mount.id, Arc::downgrade(&mount)));
        debug!(path = %this.name, "mount registered");
        mount
    }

    fn remove_mount(&self, id: MountId) {
        let mut state = self.state.write().unwrap();
        state.mounts.retain(|(mount_id, _)| *mount_id != id);
        debug!(path = %self.name, "mount released");
    }

    /// Appends the volume node of every live mount, in registration order.
    pub(crate) fn collect_mounts(&self, layers: &mut Vec<VolumeNode>) {
        // Upgrade under the shared lock, but let the upgraded handles drop
        // only after it is released: a final drop re-enters this record to
        // deregister itself.
        let mounts: Vec<Arc<MountPoint>> = {
            let state = self.state.read().unwrap();
            state
                .mounts
                .iter()
                .filter_map(|(_, weak)| weak.upgrade())
                .collect()
        };

        for mount in &mounts {
            layers.push(mount.node().clone());
        }
    }
}
