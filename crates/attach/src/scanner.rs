//! Scan pass: apply the policy to a subtree and create missing instances.

use std::time::Instant;

use serde_json::Value;
use tracing::warn;

use veneer_dom::Node;

use crate::api::ResourceFactory;
use crate::events;
use crate::policy::CompiledPolicy;
use crate::registry::InstanceRegistry;

#[derive(Clone, Copy, Debug, Default)]
pub struct ScanOutcome {
    pub visited: usize,
    pub created: usize,
}

/// Applies the policy to `root` (if it is an element) and every
/// descendant, creating an instance for each eligible element not already
/// registered. Idempotent; a factory failure skips that element and the
/// pass continues. Non-element roots are skipped silently.
pub fn scan(
    root: &Node,
    policy: &CompiledPolicy,
    registry: &InstanceRegistry,
    factory: &dyn ResourceFactory,
    options: &Value,
) -> ScanOutcome {
    let mut outcome = ScanOutcome::default();
    let Some(root_el) = root.as_element() else {
        return outcome;
    };
    let started = Instant::now();

    let mut candidates = vec![root_el.clone()];
    candidates.extend(root_el.descendants());
    for element in candidates {
        outcome.visited += 1;
        if !policy.is_eligible(&element) {
            continue;
        }
        if registry.contains(element.id()) {
            continue;
        }
        // An element detached between notification and scan is left to
        // the connectivity check rather than treated as an error.
        if !element.is_connected() {
            continue;
        }
        match factory.create_instance(&element, options) {
            Ok(resource) => {
                registry.insert(element.clone(), resource);
                outcome.created += 1;
            }
            Err(err) => {
                warn!(element = %element.id(), %err, "resource creation failed; skipping element");
            }
        }
    }

    events::emit_scan(root.id(), &outcome, started.elapsed());
    outcome
}
