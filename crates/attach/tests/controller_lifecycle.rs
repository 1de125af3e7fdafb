//! Lifecycle tests for the attach controller against the fabricated
//! document: policy matching, coalesced passes, pruning and shutdown.

use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;

use veneer_attach::{
    AttachConfig, AttachController, AttachError, DocumentChanges, QueueScheduler, ResourceFactory,
    ResourceInstance,
};
use veneer_core_types::NodeId;
use veneer_dom::{Document, Element, FrameQueue};

#[derive(Default)]
struct FactoryState {
    created: Vec<NodeId>,
    torn_down: usize,
}

struct TestResource {
    state: Arc<Mutex<FactoryState>>,
    fail_teardown: bool,
}

impl ResourceInstance for TestResource {
    fn teardown(&mut self) -> Result<(), AttachError> {
        self.state.lock().torn_down += 1;
        if self.fail_teardown {
            Err(AttachError::teardown("broken resource"))
        } else {
            Ok(())
        }
    }
}

struct TestFactory {
    state: Arc<Mutex<FactoryState>>,
}

impl TestFactory {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Arc::new(Mutex::new(FactoryState::default())),
        })
    }

    fn created(&self) -> usize {
        self.state.lock().created.len()
    }

    fn created_for(&self, id: NodeId) -> usize {
        self.state.lock().created.iter().filter(|c| **c == id).count()
    }

    fn torn_down(&self) -> usize {
        self.state.lock().torn_down
    }
}

impl ResourceFactory for TestFactory {
    fn create_instance(
        &self,
        element: &Element,
        _options: &Value,
    ) -> Result<Box<dyn ResourceInstance>, AttachError> {
        if element.has_attribute("data-fail-create") {
            return Err(AttachError::factory("creation rejected by test"));
        }
        self.state.lock().created.push(element.id());
        Ok(Box::new(TestResource {
            state: Arc::clone(&self.state),
            fail_teardown: element.has_attribute("data-fail-teardown"),
        }))
    }
}

struct Fixture {
    doc: Document,
    queue: Arc<FrameQueue>,
    factory: Arc<TestFactory>,
    controller: AttachController,
}

impl Fixture {
    fn new() -> Self {
        let doc = Document::new();
        Self::over(doc)
    }

    fn over(doc: Document) -> Self {
        let queue = FrameQueue::new();
        let factory = TestFactory::new();
        let controller = AttachController::initialize(
            &doc.body(),
            AttachConfig::default(),
            Arc::clone(&factory) as Arc<dyn ResourceFactory>,
            DocumentChanges::new(),
            QueueScheduler::new(Arc::clone(&queue)),
        );
        Self {
            doc,
            queue,
            factory,
            controller,
        }
    }

    /// Delivers buffered mutations, then runs one frame. Returns the
    /// number of frame callbacks that ran.
    fn pump(&self) -> usize {
        self.doc.deliver_mutations();
        self.queue.run_frame()
    }

    fn attach_matching(&self, tag: &str) -> Element {
        let el = self.doc.create_element(tag);
        el.add_class("overflow-auto");
        self.doc.body().append_child(&el.node()).unwrap();
        el
    }
}

#[test]
fn initial_scan_attaches_matching_elements() {
    let doc = Document::new();
    let scrollable = doc.create_element("div");
    scrollable.add_class("overflow-auto");
    let textarea = doc.create_element("textarea");
    let plain = doc.create_element("div");
    doc.body().append_child(&scrollable.node()).unwrap();
    doc.body().append_child(&textarea.node()).unwrap();
    doc.body().append_child(&plain.node()).unwrap();

    let fx = Fixture::over(doc);
    assert_eq!(fx.controller.instance_count(), 2);
    assert_eq!(fx.factory.created_for(scrollable.id()), 1);
    assert_eq!(fx.factory.created_for(textarea.id()), 1);
    assert_eq!(fx.factory.created_for(plain.id()), 0);
}

#[test]
fn rescan_is_idempotent() {
    let fx = Fixture::new();
    let el = fx.attach_matching("div");
    fx.pump();
    assert_eq!(fx.controller.instance_count(), 1);

    fx.controller.rescan(&fx.doc.body().node());
    fx.controller.rescan(&fx.doc.body().node());
    assert_eq!(fx.controller.instance_count(), 1);
    assert_eq!(fx.factory.created_for(el.id()), 1);
}

#[test]
fn appended_matching_element_gains_instance_after_one_pass() {
    let fx = Fixture::new();
    assert_eq!(fx.controller.instance_count(), 0);

    let el = fx.attach_matching("div");
    // Nothing happens until the scheduled pass fires.
    assert_eq!(fx.controller.instance_count(), 0);
    assert_eq!(fx.pump(), 1);
    assert_eq!(fx.controller.instance_count(), 1);
    assert_eq!(fx.factory.created_for(el.id()), 1);
}

#[test]
fn detached_element_is_pruned_with_one_teardown() {
    let fx = Fixture::new();
    let el = fx.attach_matching("div");
    fx.pump();
    assert_eq!(fx.controller.instance_count(), 1);

    el.detach();
    fx.pump();
    assert_eq!(fx.controller.instance_count(), 0);
    assert_eq!(fx.factory.torn_down(), 1);
}

#[test]
fn burst_of_mutations_coalesces_into_one_pass() {
    let fx = Fixture::new();
    for _ in 0..5 {
        fx.attach_matching("div");
    }

    fx.doc.deliver_mutations();
    // Five attachments, one pending frame.
    assert_eq!(fx.queue.len(), 1);
    assert_eq!(fx.queue.run_frame(), 1);
    assert_eq!(fx.controller.instance_count(), 5);
    assert_eq!(fx.queue.run_frame(), 0);
}

#[test]
fn excluded_subtrees_never_gain_instances() {
    let fx = Fixture::new();

    let dialog = fx.doc.create_element("div");
    dialog.set_attribute("role", "dialog");
    let in_dialog = fx.doc.create_element("textarea");
    dialog.append_child(&in_dialog.node()).unwrap();
    fx.doc.body().append_child(&dialog.node()).unwrap();

    let portal = fx.doc.create_element("div");
    portal.set_attribute("data-portal-root", "");
    let in_portal = fx.doc.create_element("div");
    in_portal.add_class("overflow-auto");
    portal.append_child(&in_portal.node()).unwrap();
    fx.doc.body().append_child(&portal.node()).unwrap();

    let opted_out = fx.doc.create_element("textarea");
    opted_out.set_attribute("data-scrollbar-ignore", "");
    fx.doc.body().append_child(&opted_out.node()).unwrap();

    fx.pump();
    fx.controller.rescan(&fx.doc.body().node());
    fx.pump();
    assert_eq!(fx.controller.instance_count(), 0);
    assert_eq!(fx.factory.created(), 0);
}

#[test]
fn shutdown_is_final_and_idempotent() {
    let fx = Fixture::new();
    fx.attach_matching("div");
    fx.attach_matching("textarea");
    fx.pump();
    assert_eq!(fx.controller.instance_count(), 2);

    fx.controller.shutdown();
    assert_eq!(fx.controller.instance_count(), 0);
    assert_eq!(fx.factory.torn_down(), 2);

    // New matching elements never acquire a resource again.
    fx.attach_matching("div");
    fx.pump();
    fx.controller.rescan(&fx.doc.body().node());
    assert_eq!(fx.controller.instance_count(), 0);
    assert_eq!(fx.factory.created(), 2);

    fx.controller.shutdown();
    assert_eq!(fx.factory.torn_down(), 2);
}

#[test]
fn shutdown_cancels_a_pending_pass() {
    let fx = Fixture::new();
    fx.attach_matching("div");
    fx.doc.deliver_mutations();
    assert_eq!(fx.queue.len(), 1);

    fx.controller.shutdown();
    assert_eq!(fx.queue.run_frame(), 0);
    assert_eq!(fx.controller.instance_count(), 0);
}

#[test]
fn factory_failure_skips_the_element_and_continues() {
    let fx = Fixture::new();
    let broken = fx.doc.create_element("textarea");
    broken.set_attribute("data-fail-create", "");
    fx.doc.body().append_child(&broken.node()).unwrap();
    let good = fx.attach_matching("div");

    fx.pump();
    assert_eq!(fx.controller.instance_count(), 1);
    assert_eq!(fx.factory.created_for(good.id()), 1);
    assert_eq!(fx.factory.created_for(broken.id()), 0);
}

#[test]
fn failing_teardown_still_removes_the_entry() {
    let fx = Fixture::new();
    let el = fx.attach_matching("div");
    el.set_attribute("data-fail-teardown", "");
    fx.pump();
    assert_eq!(fx.controller.instance_count(), 1);

    el.detach();
    fx.pump();
    assert_eq!(fx.controller.instance_count(), 0);
    assert_eq!(fx.factory.torn_down(), 1);
    // No retry loop on the broken element.
    assert_eq!(fx.controller.prune(), 0);
    assert_eq!(fx.factory.torn_down(), 1);
}

#[test]
fn element_detached_before_the_pass_never_attaches() {
    let fx = Fixture::new();
    let el = fx.attach_matching("div");
    el.detach();

    fx.pump();
    assert_eq!(fx.controller.instance_count(), 0);
    assert_eq!(fx.factory.created(), 0);
}

#[test]
fn text_node_candidates_are_skipped_silently() {
    let fx = Fixture::new();
    let text = fx.doc.create_text("hello");
    fx.doc.body().append_child(&text).unwrap();

    fx.pump();
    assert_eq!(fx.controller.instance_count(), 0);
}

#[test]
fn class_change_on_a_connected_element_drives_attachment() {
    let fx = Fixture::new();
    let el = fx.doc.create_element("div");
    fx.doc.body().append_child(&el.node()).unwrap();
    fx.pump();
    assert_eq!(fx.controller.instance_count(), 0);

    el.add_class("overflow-auto");
    assert_eq!(fx.pump(), 1);
    assert_eq!(fx.controller.instance_count(), 1);
    assert_eq!(fx.factory.created_for(el.id()), 1);
}

#[test]
fn removing_the_opt_out_marker_drives_attachment() {
    let fx = Fixture::new();
    let el = fx.doc.create_element("textarea");
    el.set_attribute("data-scrollbar-ignore", "");
    fx.doc.body().append_child(&el.node()).unwrap();
    fx.pump();
    assert_eq!(fx.controller.instance_count(), 0);

    el.remove_attribute("data-scrollbar-ignore");
    fx.pump();
    assert_eq!(fx.controller.instance_count(), 1);
}

#[test]
fn attribute_change_toward_exclusion_withholds_attachment() {
    let fx = Fixture::new();
    let el = fx.doc.create_element("div");
    fx.doc.body().append_child(&el.node()).unwrap();
    fx.pump();

    el.set_attribute("data-toast-viewport", "");
    el.add_class("overflow-auto");
    fx.pump();
    assert_eq!(fx.controller.instance_count(), 0);
    assert_eq!(fx.factory.created(), 0);
}

#[test]
fn prune_is_a_safe_noop_when_nothing_detached() {
    let fx = Fixture::new();
    fx.attach_matching("div");
    fx.pump();
    assert_eq!(fx.controller.prune(), 0);
    assert_eq!(fx.controller.prune(), 0);
    assert_eq!(fx.controller.instance_count(), 1);
}

/// Default-policy walkthrough: opt-in marker and overflow utility class
/// are enhanced, a dialog descendant is skipped, and removing the marker
/// element restores the count.
#[test]
fn default_policy_walkthrough() {
    let fx = Fixture::new();
    let baseline = fx.controller.instance_count();

    let marked = fx.doc.create_element("div");
    marked.set_attribute("data-scrollbar", "");
    fx.doc.body().append_child(&marked.node()).unwrap();

    let sibling = fx.doc.create_element("div");
    sibling.add_class("overflow-auto");
    fx.doc.body().append_child(&sibling.node()).unwrap();

    let dialog = fx.doc.create_element("div");
    dialog.set_attribute("role", "dialog");
    let nested = fx.doc.create_element("div");
    nested.add_class("overflow-auto");
    dialog.append_child(&nested.node()).unwrap();
    fx.doc.body().append_child(&dialog.node()).unwrap();

    fx.pump();
    assert_eq!(fx.controller.instance_count(), baseline + 2);
    assert_eq!(fx.factory.created_for(nested.id()), 0);

    marked.detach();
    fx.pump();
    assert_eq!(fx.controller.instance_count(), baseline + 1);
}
