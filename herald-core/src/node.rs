//! # Scene Graph (Node)
//!
//! A [`Node`] is a shared handle to a scene-graph entity. Cloning a node is
//! cheap and every clone refers to the same entity, the way a game object
//! reference does in a component engine.
//!
//! A node owns its attached behaviors (in attachment order) and its
//! children (in child-list order). Parents are held weakly.
//!
//! A destroyed node stays valid as a handle but behaves like a null
//! reference: it has no behaviors, no children, and is never active.

use crate::{
    behavior::{Behavior, BehaviorCell, EnabledHandle},
    error::NodeError,
    sync::lock,
};
use std::{
    fmt,
    sync::{
        Arc, Mutex, PoisonError, Weak,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
};
use tracing::warn;

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);

/// Unique identifier of a node for the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

struct NodeInner {
    id: NodeId,
    name: String,
    active: AtomicBool,
    destroyed: AtomicBool,
    parent: Mutex<Weak<NodeInner>>,
    children: Mutex<Vec<Node>>,
    behaviors: Mutex<Vec<Arc<BehaviorCell>>>,
}

/// A shared handle to a scene-graph entity.
#[derive(Clone)]
pub struct Node {
    inner: Arc<NodeInner>,
}

impl Node {
    /// Create a new active root node.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(NodeInner {
                id: NodeId(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed)),
                name: name.into(),
                active: AtomicBool::new(true),
                destroyed: AtomicBool::new(false),
                parent: Mutex::new(Weak::new()),
                children: Mutex::new(Vec::new()),
                behaviors: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Create a node and parent it under `self`.
    pub fn spawn_child(&self, name: impl Into<String>) -> Result<Node, NodeError> {
        let child = Node::new(name);
        self.add_child(&child)?;
        Ok(child)
    }

    /// The node's identifier.
    pub fn id(&self) -> NodeId {
        self.inner.id
    }

    /// The node's name.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Whether two handles refer to the same node.
    pub fn ptr_eq(&self, other: &Node) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    // ------------------------------------------------------------------
    // Activation
    // ------------------------------------------------------------------

    /// The node's own active flag, ignoring its ancestors.
    pub fn is_active_self(&self) -> bool {
        self.inner.active.load(Ordering::Acquire) && !self.is_destroyed()
    }

    /// Set the node's own active flag.
    pub fn set_active(&self, active: bool) {
        self.inner.active.store(active, Ordering::Release);
    }

    /// Whether the node and every ancestor are active.
    pub fn is_active_in_hierarchy(&self) -> bool {
        let mut current = Some(self.clone());
        while let Some(node) = current {
            if !node.is_active_self() {
                return false;
            }
            current = node.parent();
        }
        true
    }

    /// Whether [`destroy`](Node::destroy) has been called.
    pub fn is_destroyed(&self) -> bool {
        self.inner.destroyed.load(Ordering::Acquire)
    }

    /// Destroy the node and its whole subtree.
    ///
    /// Behaviors are dropped, children are destroyed and the node is removed
    /// from its parent. Handles held elsewhere keep the node alive as an
    /// empty, inactive shell.
    pub fn destroy(&self) {
        if self.inner.destroyed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.detach();
        let mut pending = vec![self.clone()];
        while let Some(node) = pending.pop() {
            let children = std::mem::take(&mut *lock(&node.inner.children));
            lock(&node.inner.behaviors).clear();
            for child in children {
                *lock(&child.inner.parent) = Weak::new();
                if !child.inner.destroyed.swap(true, Ordering::AcqRel) {
                    pending.push(child);
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Hierarchy
    // ------------------------------------------------------------------

    /// The node's parent, if any.
    pub fn parent(&self) -> Option<Node> {
        lock(&self.inner.parent)
            .upgrade()
            .map(|inner| Node { inner })
    }

    /// Snapshot of the node's children in child-list order.
    pub fn children(&self) -> Vec<Node> {
        lock(&self.inner.children).clone()
    }

    /// Number of direct children.
    pub fn child_count(&self) -> usize {
        lock(&self.inner.children).len()
    }

    /// Whether `self` is `other` or one of its ancestors.
    pub fn is_ancestor_of(&self, other: &Node) -> bool {
        let mut current = Some(other.clone());
        while let Some(node) = current {
            if node.ptr_eq(self) {
                return true;
            }
            current = node.parent();
        }
        false
    }

    /// Parent `child` under `self`, removing it from its previous parent.
    ///
    /// The child is appended to the end of the child list.
    pub fn add_child(&self, child: &Node) -> Result<(), NodeError> {
        if self.is_destroyed() {
            return Err(NodeError::Destroyed(self.to_string()));
        }
        if child.is_destroyed() {
            return Err(NodeError::Destroyed(child.to_string()));
        }
        if child.is_ancestor_of(self) {
            return Err(NodeError::Cycle {
                parent: self.to_string(),
                child: child.to_string(),
            });
        }
        if child.parent().is_some_and(|parent| parent.ptr_eq(self)) {
            return Ok(());
        }
        child.detach();
        *lock(&child.inner.parent) = Arc::downgrade(&self.inner);
        lock(&self.inner.children).push(child.clone());
        Ok(())
    }

    /// Remove the node from its parent, making it a root.
    pub fn detach(&self) {
        let previous = std::mem::take(&mut *lock(&self.inner.parent));
        if let Some(parent) = previous.upgrade() {
            lock(&parent.children).retain(|sibling| !Arc::ptr_eq(&sibling.inner, &self.inner));
        }
    }

    // ------------------------------------------------------------------
    // Behaviors
    // ------------------------------------------------------------------

    /// Attach a behavior, returning the handle that controls its enabled flag.
    pub fn attach<B: Behavior>(&self, behavior: B) -> EnabledHandle {
        let cell = Arc::new(BehaviorCell::new(behavior));
        let handle = cell.enabled_handle();
        if self.is_destroyed() {
            warn!(node = %self, behavior = cell.type_name(), "attach to destroyed node ignored");
            return handle;
        }
        lock(&self.inner.behaviors).push(cell);
        handle
    }

    /// Number of attached behaviors.
    pub fn behavior_count(&self) -> usize {
        lock(&self.inner.behaviors).len()
    }

    /// Snapshot of the attached behaviors in attachment order.
    pub fn behaviors(&self) -> Vec<Arc<BehaviorCell>> {
        lock(&self.inner.behaviors).clone()
    }

    /// Visit each attached behavior in attachment order.
    ///
    /// The behavior list is locked for the duration of the visit, so `f`
    /// must not attach behaviors to this node.
    pub fn visit_behaviors(&self, mut f: impl FnMut(&Arc<BehaviorCell>)) {
        for cell in lock(&self.inner.behaviors).iter() {
            f(cell);
        }
    }

    /// Run `f` on the first attached behavior of concrete type `B`.
    pub fn with_behavior<B: Behavior, R>(&self, f: impl FnOnce(&mut B) -> R) -> Option<R> {
        let cell = self.behaviors().into_iter().find(|cell| cell.is::<B>())?;
        cell.with_concrete(f)
    }
}

// Unlinks children one level at a time so dropping a deep chain does not
// recurse once per level.
impl Drop for NodeInner {
    fn drop(&mut self) {
        let mut orphans =
            std::mem::take(self.children.get_mut().unwrap_or_else(PoisonError::into_inner));
        while let Some(node) = orphans.pop() {
            if let Some(mut inner) = Arc::into_inner(node.inner) {
                orphans.append(inner.children.get_mut().unwrap_or_else(PoisonError::into_inner));
            }
        }
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Node {}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.inner.name, self.inner.id)
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.inner.id)
            .field("name", &self.inner.name)
            .field("active", &self.is_active_self())
            .field("destroyed", &self.is_destroyed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::behavior::Capabilities;

    struct Marker(u8);

    impl Behavior for Marker {
        fn register_capabilities(_capabilities: &mut Capabilities<Self>) {}
    }

    #[test]
    fn test_active_in_hierarchy() {
        let root = Node::new("root");
        let child = root.spawn_child("child").unwrap();
        let grandchild = child.spawn_child("grandchild").unwrap();

        assert!(grandchild.is_active_in_hierarchy());
        child.set_active(false);
        assert!(grandchild.is_active_self());
        assert!(!grandchild.is_active_in_hierarchy());
        child.set_active(true);
        assert!(grandchild.is_active_in_hierarchy());
    }

    #[test]
    fn test_reparent_moves_child() {
        let a = Node::new("a");
        let b = Node::new("b");
        let child = a.spawn_child("child").unwrap();

        b.add_child(&child).unwrap();
        assert_eq!(a.child_count(), 0);
        assert_eq!(b.children(), vec![child.clone()]);
        assert_eq!(child.parent(), Some(b));
    }

    #[test]
    fn test_cycle_rejected() {
        let root = Node::new("root");
        let child = root.spawn_child("child").unwrap();
        assert!(matches!(child.add_child(&root), Err(NodeError::Cycle { .. })));
        assert!(matches!(root.add_child(&root), Err(NodeError::Cycle { .. })));
    }

    #[test]
    fn test_destroy_clears_subtree() {
        let root = Node::new("root");
        let child = root.spawn_child("child").unwrap();
        let grandchild = child.spawn_child("grandchild").unwrap();
        child.attach(Marker(1));

        child.destroy();
        assert!(child.is_destroyed());
        assert!(grandchild.is_destroyed());
        assert_eq!(child.behavior_count(), 0);
        assert_eq!(root.child_count(), 0);
        assert!(!child.is_active_in_hierarchy());

        child.attach(Marker(2));
        assert_eq!(child.behavior_count(), 0);
    }

    // Built bottom-up so each cycle check stays shallow.
    fn chain(depth: usize) -> (Node, Node) {
        let tail = Node::new("tail");
        let mut root = tail.clone();
        for _ in 0..depth {
            let parent = Node::new("link");
            parent.add_child(&root).unwrap();
            root = parent;
        }
        (root, tail)
    }

    #[test]
    fn test_destroy_deep_chain() {
        let (root, tail) = chain(100_000);
        tail.attach(Marker(1));

        root.destroy();
        assert!(tail.is_destroyed());
        assert_eq!(tail.behavior_count(), 0);
        assert_eq!(tail.parent(), None);
        assert_eq!(root.child_count(), 0);
    }

    #[test]
    fn test_drop_deep_chain() {
        let (root, tail) = chain(100_000);
        drop(tail);
        drop(root);
    }

    #[test]
    fn test_with_behavior_finds_concrete_type() {
        let node = Node::new("node");
        node.attach(Marker(7));
        assert_eq!(node.with_behavior::<Marker, _>(|m| m.0), Some(7));
    }
}
