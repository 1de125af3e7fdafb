//! Mutation observation over the fabricated tree.
//!
//! Mutators enqueue records into each interested observer's buffer;
//! nothing is delivered synchronously from inside a mutator. The owner
//! of the document pumps [`Document::deliver_mutations`] to flush the
//! buffers, emulating end-of-task delivery of the platform mechanism.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use veneer_core_types::NodeId;

use crate::model::{Document, DocumentInner, Element, Node};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MutationKind {
    ChildList,
    Attributes,
}

#[derive(Clone, Debug)]
pub struct MutationRecord {
    pub kind: MutationKind,
    pub target: Node,
    pub added: Vec<Node>,
    pub removed: Vec<Node>,
    pub attribute: Option<String>,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct ObserveOptions {
    pub child_list: bool,
    pub subtree: bool,
    pub attributes: bool,
}

impl ObserveOptions {
    pub fn all() -> Self {
        Self {
            child_list: true,
            subtree: true,
            attributes: true,
        }
    }
}

pub type MutationCallback = Arc<dyn Fn(Vec<MutationRecord>) + Send + Sync>;

pub(crate) struct ObserverEntry {
    pub id: u64,
    pub root: NodeId,
    pub options: ObserveOptions,
    pub callback: MutationCallback,
    pub buffer: Vec<MutationRecord>,
}

impl ObserverEntry {
    fn wants(&self, record: &MutationRecord, ancestors_of_target: &[NodeId]) -> bool {
        let kind_ok = match record.kind {
            MutationKind::ChildList => self.options.child_list,
            MutationKind::Attributes => self.options.attributes,
        };
        if !kind_ok {
            return false;
        }
        record.target.id() == self.root
            || (self.options.subtree && ancestors_of_target.contains(&self.root))
    }
}

impl DocumentInner {
    pub(crate) fn enqueue(&self, record: MutationRecord, ancestors_of_target: &[NodeId]) {
        let mut observers = self.observers.lock();
        for entry in observers.iter_mut() {
            if entry.wants(&record, ancestors_of_target) {
                entry.buffer.push(record.clone());
            }
        }
    }
}

/// Registration handle; dropping it does not disconnect.
pub struct MutationObserverHandle {
    doc: Document,
    id: u64,
}

impl MutationObserverHandle {
    pub fn disconnect(&self) {
        self.doc.inner.observers.lock().retain(|o| o.id != self.id);
    }
}

impl Document {
    /// Registers an observer over `root`. Records are buffered until the
    /// next [`Document::deliver_mutations`] call.
    pub fn observe(
        &self,
        root: &Element,
        options: ObserveOptions,
        callback: MutationCallback,
    ) -> MutationObserverHandle {
        let id = self.inner.next_observer.fetch_add(1, Ordering::Relaxed);
        self.inner.observers.lock().push(ObserverEntry {
            id,
            root: root.id(),
            options,
            callback,
            buffer: Vec::new(),
        });
        MutationObserverHandle {
            doc: self.clone(),
            id,
        }
    }

    /// Flushes every observer buffer, invoking callbacks outside any
    /// internal lock. Returns the number of records delivered. Records
    /// produced while a callback runs stay buffered for the next pump.
    pub fn deliver_mutations(&self) -> usize {
        let batches: Vec<(MutationCallback, Vec<MutationRecord>)> = {
            let mut observers = self.inner.observers.lock();
            observers
                .iter_mut()
                .filter(|entry| !entry.buffer.is_empty())
                .map(|entry| (Arc::clone(&entry.callback), std::mem::take(&mut entry.buffer)))
                .collect()
        };
        let mut delivered = 0;
        for (callback, records) in batches {
            delivered += records.len();
            callback(records);
        }
        if delivered > 0 {
            tracing::debug!(delivered, "mutation records delivered");
        }
        delivered
    }
}
