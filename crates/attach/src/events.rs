use std::time::Duration;

use tracing::debug;

use veneer_core_types::NodeId;

use crate::metrics;
use crate::scanner::ScanOutcome;

pub fn emit_scan(root: NodeId, outcome: &ScanOutcome, duration: Duration) {
    metrics::record_scan(outcome.created, duration);
    debug!(
        target: "attach.events",
        %root,
        visited = outcome.visited,
        created = outcome.created,
        "attach.scan.completed"
    );
}

pub fn emit_pass(candidate_count: usize, created: usize, pruned: usize) {
    metrics::record_pass();
    debug!(
        target: "attach.events",
        candidate_count,
        created,
        pruned,
        "attach.pass.completed"
    );
}

pub fn emit_coalesced(pending_candidates: usize) {
    metrics::record_coalesced();
    debug!(
        target: "attach.events",
        pending_candidates,
        "attach.pass.coalesced"
    );
}

pub fn emit_shutdown(torn_down: usize) {
    debug!(
        target: "attach.events",
        torn_down,
        "attach.controller.shutdown"
    );
}
