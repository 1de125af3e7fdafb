//! Change watcher: one subscription, coalesced passes.
//!
//! Mutation callbacks never scan synchronously. Candidate roots collect
//! into one pending frame; a burst of notifications inside a scheduling
//! window merges into that frame and yields exactly one scan-plus-prune
//! pass when it fires.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;

use veneer_core_types::NodeId;
use veneer_dom::{Element, FrameToken, MutationCallback, MutationRecord, Node};

use crate::controller::ControllerCore;
use crate::events;
use crate::ports::{ChangeSource, ChangeSubscription, FrameScheduler};

#[derive(Default)]
struct PendingPass {
    token: Option<FrameToken>,
    candidates: Vec<Node>,
    seen: HashSet<NodeId>,
}

impl PendingPass {
    fn push(&mut self, node: Node) {
        if self.seen.insert(node.id()) {
            self.candidates.push(node);
        }
    }
}

pub(crate) struct WatcherShared {
    core: Arc<ControllerCore>,
    scheduler: Arc<dyn FrameScheduler>,
    pending: Mutex<PendingPass>,
}

impl WatcherShared {
    fn on_records(this: &Arc<Self>, records: Vec<MutationRecord>) {
        if this.core.is_shut_down() || records.is_empty() {
            return;
        }
        let mut pending = this.pending.lock();
        for record in records {
            pending.push(record.target.clone());
            for node in &record.added {
                pending.push(node.clone());
            }
        }
        if pending.token.is_none() {
            let fire = Arc::clone(this);
            pending.token = Some(this.scheduler.schedule(Box::new(move || fire.run_pass())));
        } else {
            events::emit_coalesced(pending.candidates.len());
        }
    }

    fn run_pass(&self) {
        let candidates = {
            let mut pending = self.pending.lock();
            pending.token = None;
            pending.seen.clear();
            std::mem::take(&mut pending.candidates)
        };
        if self.core.is_shut_down() {
            return;
        }
        self.core.run_pass(&candidates);
    }
}

/// Owns the change subscription for one controller.
pub(crate) struct ChangeWatcher {
    shared: Arc<WatcherShared>,
    subscription: Mutex<Option<Box<dyn ChangeSubscription>>>,
}

impl ChangeWatcher {
    pub fn start(
        core: Arc<ControllerCore>,
        scheduler: Arc<dyn FrameScheduler>,
        changes: &dyn ChangeSource,
        root: &Element,
    ) -> Self {
        let shared = Arc::new(WatcherShared {
            core,
            scheduler,
            pending: Mutex::new(PendingPass::default()),
        });
        let for_callback = Arc::clone(&shared);
        let callback: MutationCallback = Arc::new(move |records| {
            WatcherShared::on_records(&for_callback, records);
        });
        let subscription = changes.subscribe(root, callback);
        Self {
            shared,
            subscription: Mutex::new(Some(subscription)),
        }
    }

    /// Disconnects the subscription and cancels a pending pass, if any.
    /// Idempotent.
    pub fn stop(&self) {
        if let Some(mut subscription) = self.subscription.lock().take() {
            subscription.disconnect();
        }
        let mut pending = self.shared.pending.lock();
        if let Some(token) = pending.token.take() {
            self.shared.scheduler.cancel(token);
        }
        pending.candidates.clear();
        pending.seen.clear();
    }
}
