//! Identity-keyed bookkeeping of element → resource instance.

use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::warn;

use veneer_core_types::NodeId;
use veneer_dom::Element;

use crate::api::ResourceInstance;
use crate::metrics;

struct RegisteredInstance {
    element: Element,
    resource: Mutex<Box<dyn ResourceInstance>>,
}

/// Mapping from element identity to its live resource instance.
pub struct InstanceRegistry {
    entries: DashMap<NodeId, RegisteredInstance>,
}

impl InstanceRegistry {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn insert(&self, element: Element, resource: Box<dyn ResourceInstance>) {
        self.entries.insert(
            element.id(),
            RegisteredInstance {
                element,
                resource: Mutex::new(resource),
            },
        );
        metrics::set_instance_count(self.len());
    }

    /// Tears down and removes every entry whose element is no longer
    /// connected. Safe no-op on an already-pruned registry.
    pub fn prune(&self) -> usize {
        let stale: Vec<NodeId> = self
            .entries
            .iter()
            .filter(|entry| !entry.value().element.is_connected())
            .map(|entry| *entry.key())
            .collect();
        let mut removed = 0;
        for id in stale {
            if let Some((_, entry)) = self.entries.remove(&id) {
                teardown_entry(entry);
                removed += 1;
            }
        }
        if removed > 0 {
            metrics::record_pruned(removed);
            metrics::set_instance_count(self.len());
        }
        removed
    }

    /// Tears down and removes every entry; the shutdown path.
    pub fn clear(&self) -> usize {
        let ids: Vec<NodeId> = self.entries.iter().map(|entry| *entry.key()).collect();
        let mut removed = 0;
        for id in ids {
            if let Some((_, entry)) = self.entries.remove(&id) {
                teardown_entry(entry);
                removed += 1;
            }
        }
        metrics::set_instance_count(0);
        removed
    }
}

impl Default for InstanceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Teardown is best effort: a failing resource is still dropped from the
/// registry so a permanently broken element cannot cause a retry loop.
fn teardown_entry(entry: RegisteredInstance) {
    if let Err(err) = entry.resource.lock().teardown() {
        warn!(element = %entry.element.id(), %err, "resource teardown failed; entry removed anyway");
    }
}
