//! Controller facade and lifecycle.
//!
//! One controller is typically installed per running page by a top-level
//! composition root. Phase machine: Observing (after initialize) →
//! Shutdown (terminal). After shutdown no new instance is ever created.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde_json::Value;
use tracing::info;

use veneer_dom::{Element, Node};

use crate::api::ResourceFactory;
use crate::events;
use crate::policy::{AttachPolicy, CompiledPolicy};
use crate::ports::{ChangeSource, FrameScheduler};
use crate::registry::InstanceRegistry;
use crate::scanner::{self, ScanOutcome};
use crate::watcher::ChangeWatcher;

#[derive(Clone, Debug, Default)]
pub struct AttachConfig {
    pub policy: AttachPolicy,
    /// Opaque factory configuration, forwarded verbatim.
    pub options: Value,
}

pub(crate) struct ControllerCore {
    registry: InstanceRegistry,
    policy: CompiledPolicy,
    factory: Arc<dyn ResourceFactory>,
    options: Value,
    shut_down: AtomicBool,
}

impl ControllerCore {
    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::SeqCst)
    }

    pub fn scan_root(&self, root: &Node) -> ScanOutcome {
        scanner::scan(
            root,
            &self.policy,
            &self.registry,
            self.factory.as_ref(),
            &self.options,
        )
    }

    /// One scheduled pass: scan every candidate root, then prune.
    pub fn run_pass(&self, candidates: &[Node]) {
        let mut created = 0;
        for candidate in candidates {
            created += self.scan_root(candidate).created;
        }
        let pruned = self.registry.prune();
        events::emit_pass(candidates.len(), created, pruned);
    }
}

/// Keeps a one-to-one correspondence between policy-matching elements of
/// a live document subtree and factory-created resource instances.
pub struct AttachController {
    core: Arc<ControllerCore>,
    watcher: ChangeWatcher,
}

impl AttachController {
    /// Scans `root` once synchronously, then observes it for changes.
    pub fn initialize(
        root: &Element,
        config: AttachConfig,
        factory: Arc<dyn ResourceFactory>,
        changes: Arc<dyn ChangeSource>,
        scheduler: Arc<dyn FrameScheduler>,
    ) -> Self {
        let core = Arc::new(ControllerCore {
            registry: InstanceRegistry::new(),
            policy: CompiledPolicy::compile(&config.policy),
            factory,
            options: config.options,
            shut_down: AtomicBool::new(false),
        });
        let outcome = core.scan_root(&root.node());
        let watcher = ChangeWatcher::start(
            Arc::clone(&core),
            scheduler,
            changes.as_ref(),
            root,
        );
        info!(
            root = %root.id(),
            created = outcome.created,
            "attach controller observing"
        );
        Self { core, watcher }
    }

    /// Synchronous scan for callers that changed a subtree outside
    /// observed mutations. No-op after shutdown.
    pub fn rescan(&self, root: &Node) {
        if self.core.is_shut_down() {
            return;
        }
        self.core.scan_root(root);
    }

    /// Tears down instances for disconnected elements; returns how many
    /// were removed.
    pub fn prune(&self) -> usize {
        self.core.registry.prune()
    }

    pub fn instance_count(&self) -> usize {
        self.core.registry.len()
    }

    /// Cancels a pending pass, stops observing and tears down every
    /// registered instance. Idempotent; terminal.
    pub fn shutdown(&self) {
        if self.core.shut_down.swap(true, Ordering::SeqCst) {
            return;
        }
        self.watcher.stop();
        let torn_down = self.core.registry.clear();
        events::emit_shutdown(torn_down);
    }
}

impl Drop for AttachController {
    fn drop(&mut self) {
        self.shutdown();
    }
}
