//! Subtree and ancestor traversal.
//!
//! [`walk`] yields a node followed by its active descendants in depth-first
//! pre-order, following each node's child-list order. Inactive and destroyed
//! nodes are skipped together with their subtrees.

use crate::node::Node;

/// Depth-first iterator over a node and its active descendants.
#[derive(Debug, Clone)]
pub struct Walk {
    stack: Vec<Node>,
}

impl Iterator for Walk {
    type Item = Node;

    fn next(&mut self) -> Option<Node> {
        let node = self.stack.pop()?;
        let children = node.children();
        self.stack.extend(
            children
                .into_iter()
                .rev()
                .filter(Node::is_active_self),
        );
        Some(node)
    }
}

/// Walk `node` and its active descendants.
///
/// Yields nothing if `node` itself is not active in the hierarchy.
pub fn walk(node: &Node) -> Walk {
    let stack = if node.is_active_in_hierarchy() {
        vec![node.clone()]
    } else {
        Vec::new()
    };
    Walk { stack }
}

/// Walk the active descendants of `node`, excluding `node` itself.
pub fn descendants(node: &Node) -> std::iter::Skip<Walk> {
    walk(node).skip(1)
}

/// Iterator over a node followed by each of its ancestors.
#[derive(Debug, Clone)]
pub struct Ancestors {
    next: Option<Node>,
}

impl Iterator for Ancestors {
    type Item = Node;

    fn next(&mut self) -> Option<Node> {
        let node = self.next.take()?;
        self.next = node.parent();
        Some(node)
    }
}

/// Iterate from `node` up to the root, starting with `node` itself.
pub fn ancestors(node: &Node) -> Ancestors {
    Ancestors {
        next: Some(node.clone()),
    }
}
