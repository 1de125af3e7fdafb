//! Injected host capabilities.
//!
//! The change-notification mechanism and the frame-scheduling primitive
//! are ports rather than hard-wired platform calls, so the controller can
//! run against the fabricated document in tests. The adapters over
//! `veneer-dom` live here next to the traits.

use std::sync::Arc;

use veneer_dom::{
    Element, FrameFn, FrameQueue, FrameToken, MutationCallback, MutationObserverHandle,
    ObserveOptions,
};

/// Frame-scheduling capability: at most one controller pass is ever
/// pending through this at a time.
pub trait FrameScheduler: Send + Sync {
    fn schedule(&self, callback: FrameFn) -> FrameToken;
    fn cancel(&self, token: FrameToken);
}

/// Live change subscription; disconnecting stops all future callbacks.
pub trait ChangeSubscription: Send {
    fn disconnect(&mut self);
}

/// Change-notification capability over a document subtree.
pub trait ChangeSource: Send + Sync {
    fn subscribe(&self, root: &Element, callback: MutationCallback)
        -> Box<dyn ChangeSubscription>;
}

/// [`FrameScheduler`] over the fabricated frame queue.
pub struct QueueScheduler {
    queue: Arc<FrameQueue>,
}

impl QueueScheduler {
    pub fn new(queue: Arc<FrameQueue>) -> Arc<Self> {
        Arc::new(Self { queue })
    }
}

impl FrameScheduler for QueueScheduler {
    fn schedule(&self, callback: FrameFn) -> FrameToken {
        self.queue.request(callback)
    }

    fn cancel(&self, token: FrameToken) {
        self.queue.cancel(token);
    }
}

/// [`ChangeSource`] over the fabricated document's mutation observers,
/// watching child-list, subtree and attribute changes.
pub struct DocumentChanges;

impl DocumentChanges {
    pub fn new() -> Arc<Self> {
        Arc::new(Self)
    }
}

impl ChangeSource for DocumentChanges {
    fn subscribe(
        &self,
        root: &Element,
        callback: MutationCallback,
    ) -> Box<dyn ChangeSubscription> {
        let handle = root
            .document()
            .observe(root, ObserveOptions::all(), callback);
        Box::new(DocumentSubscription {
            handle: Some(handle),
        })
    }
}

struct DocumentSubscription {
    handle: Option<MutationObserverHandle>,
}

impl ChangeSubscription for DocumentSubscription {
    fn disconnect(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.disconnect();
        }
    }
}
