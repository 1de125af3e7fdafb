//! Deterministic frame-callback queue.
//!
//! Stand-in for the host's frame-scheduling primitive. Callbacks queue up
//! until the owner pumps [`FrameQueue::run_frame`]; callbacks requested
//! while a frame is running land in the next frame.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

pub type FrameFn = Box<dyn FnOnce() + Send>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameToken(u64);

pub struct FrameQueue {
    entries: Mutex<Vec<(u64, FrameFn)>>,
    next: AtomicU64,
}

impl FrameQueue {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            entries: Mutex::new(Vec::new()),
            next: AtomicU64::new(1),
        })
    }

    pub fn request(&self, callback: FrameFn) -> FrameToken {
        let id = self.next.fetch_add(1, Ordering::Relaxed);
        self.entries.lock().push((id, callback));
        FrameToken(id)
    }

    /// Returns whether the token was still pending.
    pub fn cancel(&self, token: FrameToken) -> bool {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|(id, _)| *id != token.0);
        entries.len() != before
    }

    /// Runs every callback queued so far and returns how many ran.
    pub fn run_frame(&self) -> usize {
        let batch: Vec<(u64, FrameFn)> = std::mem::take(&mut *self.entries.lock());
        let count = batch.len();
        for (_, callback) in batch {
            callback();
        }
        if count > 0 {
            tracing::debug!(count, "frame callbacks ran");
        }
        count
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn run_frame_drains_current_batch_only() {
        let queue = FrameQueue::new();
        let fired = Arc::new(AtomicUsize::new(0));

        let inner = Arc::clone(&queue);
        let fired_outer = Arc::clone(&fired);
        queue.request(Box::new(move || {
            fired_outer.fetch_add(1, Ordering::SeqCst);
            let fired_inner = Arc::clone(&fired_outer);
            inner.request(Box::new(move || {
                fired_inner.fetch_add(1, Ordering::SeqCst);
            }));
        }));

        assert_eq!(queue.run_frame(), 1);
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.run_frame(), 1);
        assert_eq!(fired.load(Ordering::SeqCst), 2);
        assert!(queue.is_empty());
    }

    #[test]
    fn cancelled_callbacks_never_run() {
        let queue = FrameQueue::new();
        let fired = Arc::new(AtomicUsize::new(0));
        let fired_cb = Arc::clone(&fired);
        let token = queue.request(Box::new(move || {
            fired_cb.fetch_add(1, Ordering::SeqCst);
        }));

        assert!(queue.cancel(token));
        assert!(!queue.cancel(token));
        assert_eq!(queue.run_frame(), 0);
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }
}
