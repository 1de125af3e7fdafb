//! Fabricated document tree.
//!
//! A small in-memory stand-in for a live host document: elements carry a
//! tag name, an attribute bag and a class set; nodes link to parents and
//! children; connectivity is defined as reachability from the document
//! root. Structural and attribute mutators emit records to registered
//! observers (see `mutation.rs`), buffered until the owner pumps delivery.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::sync::atomic::AtomicU64;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use veneer_core_types::NodeId;

use crate::errors::DomError;
use crate::mutation::{MutationKind, MutationRecord, ObserverEntry};
use crate::selector::Selector;

pub(crate) struct ElementData {
    pub tag: String,
    pub attrs: BTreeMap<String, String>,
    pub classes: BTreeSet<String>,
}

pub(crate) enum NodeKind {
    Element(ElementData),
    Text(String),
}

pub(crate) struct NodeState {
    pub kind: NodeKind,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

pub(crate) struct Tree {
    pub nodes: HashMap<NodeId, NodeState>,
}

impl Tree {
    fn state(&self, id: NodeId) -> &NodeState {
        self.nodes.get(&id).expect("node handle outlived arena")
    }

    fn state_mut(&mut self, id: NodeId) -> &mut NodeState {
        self.nodes.get_mut(&id).expect("node handle outlived arena")
    }

    /// Strict ancestor chain, nearest first.
    fn ancestor_ids(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut cursor = self.state(id).parent;
        while let Some(parent) = cursor {
            out.push(parent);
            cursor = self.state(parent).parent;
        }
        out
    }
}

pub(crate) struct DocumentInner {
    pub tree: RwLock<Tree>,
    pub observers: Mutex<Vec<ObserverEntry>>,
    pub next_observer: AtomicU64,
    pub html: NodeId,
    pub body: NodeId,
}

/// Handle to a fabricated document. Cheap to clone; all handles share the
/// same arena.
#[derive(Clone)]
pub struct Document {
    pub(crate) inner: Arc<DocumentInner>,
}

impl Document {
    /// Creates a document with its two outermost container elements
    /// (`html` with a `body` child) already connected.
    pub fn new() -> Self {
        let html = NodeId::new();
        let body = NodeId::new();
        let mut nodes = HashMap::new();
        nodes.insert(
            html,
            NodeState {
                kind: NodeKind::Element(ElementData {
                    tag: "html".to_string(),
                    attrs: BTreeMap::new(),
                    classes: BTreeSet::new(),
                }),
                parent: None,
                children: vec![body],
            },
        );
        nodes.insert(
            body,
            NodeState {
                kind: NodeKind::Element(ElementData {
                    tag: "body".to_string(),
                    attrs: BTreeMap::new(),
                    classes: BTreeSet::new(),
                }),
                parent: Some(html),
                children: Vec::new(),
            },
        );
        Self {
            inner: Arc::new(DocumentInner {
                tree: RwLock::new(Tree { nodes }),
                observers: Mutex::new(Vec::new()),
                next_observer: AtomicU64::new(1),
                html,
                body,
            }),
        }
    }

    pub fn html(&self) -> Element {
        Element {
            node: Node {
                doc: self.clone(),
                id: self.inner.html,
            },
        }
    }

    pub fn body(&self) -> Element {
        Element {
            node: Node {
                doc: self.clone(),
                id: self.inner.body,
            },
        }
    }

    /// Creates a detached element.
    pub fn create_element(&self, tag: impl Into<String>) -> Element {
        let id = NodeId::new();
        let state = NodeState {
            kind: NodeKind::Element(ElementData {
                tag: tag.into(),
                attrs: BTreeMap::new(),
                classes: BTreeSet::new(),
            }),
            parent: None,
            children: Vec::new(),
        };
        self.inner.tree.write().nodes.insert(id, state);
        Element {
            node: Node {
                doc: self.clone(),
                id,
            },
        }
    }

    /// Creates a detached text node.
    pub fn create_text(&self, text: impl Into<String>) -> Node {
        let id = NodeId::new();
        let state = NodeState {
            kind: NodeKind::Text(text.into()),
            parent: None,
            children: Vec::new(),
        };
        self.inner.tree.write().nodes.insert(id, state);
        Node {
            doc: self.clone(),
            id,
        }
    }

    pub(crate) fn same_document(&self, other: &Document) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Document(html={})", self.inner.html)
    }
}

/// Handle to any node in the tree. Text nodes offer no attribute or
/// descendant-query capability; use [`Node::as_element`] to downcast.
#[derive(Clone)]
pub struct Node {
    pub(crate) doc: Document,
    pub(crate) id: NodeId,
}

impl Node {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn document(&self) -> Document {
        self.doc.clone()
    }

    pub fn is_element(&self) -> bool {
        let tree = self.doc.inner.tree.read();
        matches!(tree.state(self.id).kind, NodeKind::Element(_))
    }

    pub fn as_element(&self) -> Option<Element> {
        if self.is_element() {
            Some(Element { node: self.clone() })
        } else {
            None
        }
    }

    pub fn text(&self) -> Option<String> {
        let tree = self.doc.inner.tree.read();
        match &tree.state(self.id).kind {
            NodeKind::Text(text) => Some(text.clone()),
            NodeKind::Element(_) => None,
        }
    }

    pub fn parent(&self) -> Option<Element> {
        let parent = self.doc.inner.tree.read().state(self.id).parent?;
        Some(Element {
            node: Node {
                doc: self.doc.clone(),
                id: parent,
            },
        })
    }

    /// A node is connected when its topmost ancestor is the document root.
    pub fn is_connected(&self) -> bool {
        let tree = self.doc.inner.tree.read();
        let mut cursor = self.id;
        while let Some(parent) = tree.state(cursor).parent {
            cursor = parent;
        }
        cursor == self.doc.inner.html
    }

    /// Detaches this node (and its subtree) from its parent. No-op when
    /// already detached.
    pub fn detach(&self) {
        let record = {
            let mut tree = self.doc.inner.tree.write();
            let Some(parent) = tree.state(self.id).parent else {
                return;
            };
            tree.state_mut(parent).children.retain(|c| *c != self.id);
            tree.state_mut(self.id).parent = None;
            let ancestors = tree.ancestor_ids(parent);
            let target = Node {
                doc: self.doc.clone(),
                id: parent,
            };
            (
                MutationRecord {
                    kind: MutationKind::ChildList,
                    target,
                    added: Vec::new(),
                    removed: vec![self.clone()],
                    attribute: None,
                },
                ancestors,
            )
        };
        self.doc.inner.enqueue(record.0, &record.1);
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.doc.same_document(&other.doc)
    }
}

impl Eq for Node {}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node({})", self.id)
    }
}

/// Handle to an element node.
#[derive(Clone)]
pub struct Element {
    pub(crate) node: Node,
}

impl Element {
    pub fn id(&self) -> NodeId {
        self.node.id
    }

    pub fn node(&self) -> Node {
        self.node.clone()
    }

    pub fn document(&self) -> Document {
        self.node.doc.clone()
    }

    pub fn is_connected(&self) -> bool {
        self.node.is_connected()
    }

    pub fn parent(&self) -> Option<Element> {
        self.node.parent()
    }

    pub fn detach(&self) {
        self.node.detach();
    }

    fn with_data<R>(&self, f: impl FnOnce(&ElementData) -> R) -> R {
        let tree = self.node.doc.inner.tree.read();
        match &tree.state(self.node.id).kind {
            NodeKind::Element(data) => f(data),
            NodeKind::Text(_) => unreachable!("element handle over text node"),
        }
    }

    pub fn tag_name(&self) -> String {
        self.with_data(|data| data.tag.clone())
    }

    pub fn attribute(&self, name: &str) -> Option<String> {
        self.with_data(|data| data.attrs.get(name).cloned())
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.with_data(|data| data.attrs.contains_key(name))
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.with_data(|data| data.classes.contains(class))
    }

    pub fn classes(&self) -> Vec<String> {
        self.with_data(|data| data.classes.iter().cloned().collect())
    }

    pub fn set_attribute(&self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        let record_name = name.clone();
        self.mutate_attribute(&record_name, |data| {
            data.attrs.insert(name, value);
            true
        });
    }

    pub fn remove_attribute(&self, name: &str) {
        self.mutate_attribute(name, |data| data.attrs.remove(name).is_some());
    }

    pub fn add_class(&self, class: impl Into<String>) {
        self.mutate_attribute("class", |data| data.classes.insert(class.into()));
    }

    pub fn remove_class(&self, class: &str) {
        self.mutate_attribute("class", |data| data.classes.remove(class));
    }

    fn mutate_attribute(&self, name: &str, apply: impl FnOnce(&mut ElementData) -> bool) {
        let queued = {
            let mut tree = self.node.doc.inner.tree.write();
            let changed = match &mut tree.state_mut(self.node.id).kind {
                NodeKind::Element(data) => apply(data),
                NodeKind::Text(_) => unreachable!("element handle over text node"),
            };
            if !changed {
                return;
            }
            let ancestors = tree.ancestor_ids(self.node.id);
            (
                MutationRecord {
                    kind: MutationKind::Attributes,
                    target: self.node.clone(),
                    added: Vec::new(),
                    removed: Vec::new(),
                    attribute: Some(name.to_string()),
                },
                ancestors,
            )
        };
        self.node.doc.inner.enqueue(queued.0, &queued.1);
    }

    /// Appends `child` as the last child of this element. An attached
    /// child is moved, emitting a removal from its old parent first.
    pub fn append_child(&self, child: &Node) -> Result<(), DomError> {
        if !self.node.doc.same_document(&child.doc) {
            return Err(DomError::ForeignDocument);
        }
        if child.id == self.node.id {
            return Err(DomError::Cycle);
        }

        let mut queued = Vec::new();
        {
            let mut tree = self.node.doc.inner.tree.write();
            if tree.ancestor_ids(self.node.id).contains(&child.id) {
                return Err(DomError::Cycle);
            }
            if let Some(old_parent) = tree.state(child.id).parent {
                tree.state_mut(old_parent).children.retain(|c| *c != child.id);
                let ancestors = tree.ancestor_ids(old_parent);
                queued.push((
                    MutationRecord {
                        kind: MutationKind::ChildList,
                        target: Node {
                            doc: self.node.doc.clone(),
                            id: old_parent,
                        },
                        added: Vec::new(),
                        removed: vec![child.clone()],
                        attribute: None,
                    },
                    ancestors,
                ));
            }
            tree.state_mut(child.id).parent = Some(self.node.id);
            tree.state_mut(self.node.id).children.push(child.id);
            let ancestors = tree.ancestor_ids(self.node.id);
            queued.push((
                MutationRecord {
                    kind: MutationKind::ChildList,
                    target: self.node.clone(),
                    added: vec![child.clone()],
                    removed: Vec::new(),
                    attribute: None,
                },
                ancestors,
            ));
        }
        for (record, ancestors) in queued {
            self.node.doc.inner.enqueue(record, &ancestors);
        }
        Ok(())
    }

    pub fn children(&self) -> Vec<Node> {
        let tree = self.node.doc.inner.tree.read();
        tree.state(self.node.id)
            .children
            .iter()
            .map(|id| Node {
                doc: self.node.doc.clone(),
                id: *id,
            })
            .collect()
    }

    /// Strict ancestors, nearest first. The element itself is excluded.
    pub fn ancestors(&self) -> Vec<Element> {
        let ids = {
            let tree = self.node.doc.inner.tree.read();
            tree.ancestor_ids(self.node.id)
        };
        ids.into_iter()
            .map(|id| Element {
                node: Node {
                    doc: self.node.doc.clone(),
                    id,
                },
            })
            .collect()
    }

    /// Descendant elements in document order (depth first), excluding
    /// this element and any text nodes.
    pub fn descendants(&self) -> Vec<Element> {
        let ids = {
            let tree = self.node.doc.inner.tree.read();
            let mut out = Vec::new();
            let mut stack: Vec<NodeId> = tree
                .state(self.node.id)
                .children
                .iter()
                .rev()
                .copied()
                .collect();
            while let Some(id) = stack.pop() {
                let state = tree.state(id);
                if matches!(state.kind, NodeKind::Element(_)) {
                    out.push(id);
                }
                stack.extend(state.children.iter().rev().copied());
            }
            out
        };
        ids.into_iter()
            .map(|id| Element {
                node: Node {
                    doc: self.node.doc.clone(),
                    id,
                },
            })
            .collect()
    }

    pub fn matches(&self, selector: &Selector) -> bool {
        selector.matches(self)
    }

    pub fn query_all(&self, selector: &Selector) -> Vec<Element> {
        self.descendants()
            .into_iter()
            .filter(|el| selector.matches(el))
            .collect()
    }
}

impl PartialEq for Element {
    fn eq(&self, other: &Self) -> bool {
        self.node == other.node
    }
}

impl Eq for Element {}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Element(<{}> {})", self.tag_name(), self.node.id)
    }
}
