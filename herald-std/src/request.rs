//! Request resolution: dispatch that returns a value.
//!
//! A request asks a node for an answer. The result type's
//! [`Default`] value is the sentinel meaning "nobody answered"; use
//! `Option<T>` when zero or `false` are legitimate answers.
//!
//! # Example
//!
//! ```rust,ignore
//! let health = request::<dyn Armor, Option<i32>, _>(&target, |armor| Some(armor.health()));
//! ```

use crate::dispatch::{invoke, report};
use herald_core::{
    DispatchError, Node, descendants,
    registry::{acquire_list, collect_handlers, release_list},
};
use std::any::type_name;
use tracing::{debug, trace};

/// Ask `node` for a value, falling back to its active descendants.
///
/// Returns the node's own answer if it is not the sentinel, otherwise the
/// first non-sentinel answer among its descendants in walk order, otherwise
/// the sentinel. Each node is asked at most once.
pub fn request<C, R, F>(node: &Node, mut action: F) -> R
where
    C: ?Sized + 'static,
    R: Default + PartialEq,
    F: FnMut(&mut C) -> R,
{
    let sentinel = R::default();
    let result = request_node::<C, R, _>(node, &mut action);
    if result != sentinel {
        return result;
    }
    descendants(node)
        .map(|descendant| request_node::<C, R, _>(&descendant, &mut action))
        .find(|value| *value != sentinel)
        .unwrap_or(result)
}

/// Ask `node` only, never its descendants.
pub fn request_local<C, R, F>(node: &Node, mut action: F) -> R
where
    C: ?Sized + 'static,
    R: Default,
    F: FnMut(&mut C) -> R,
{
    request_node::<C, R, _>(node, &mut action)
}

/// Ask every matching behavior of `node`; the last successful answer wins.
///
/// A handler that panics aborts resolution for this node and yields the
/// sentinel. Handlers that fail their capability cast or are already
/// executing are skipped.
pub fn request_node<C, R, F>(node: &Node, action: &mut F) -> R
where
    C: ?Sized + 'static,
    R: Default,
    F: FnMut(&mut C) -> R,
{
    let mut handlers = acquire_list();
    collect_handlers::<C>(node, &mut handlers);
    if handlers.len() > 1 {
        debug!(
            node = %node,
            capability = type_name::<C>(),
            handlers = handlers.len(),
            "multiple handlers answered a request; keeping the last"
        );
    }

    let mut result = R::default();
    for cell in &handlers {
        trace!(node = %node, capability = type_name::<C>(), handler = cell.type_name(), "request");
        match invoke::<C, R>(cell, &mut *action) {
            Ok(value) => result = value,
            Err(err @ DispatchError::HandlerPanicked { .. }) => {
                report(node, &err);
                result = R::default();
                break;
            }
            Err(err) => report(node, &err),
        }
    }

    release_list(handlers);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{CallLog, Probe, ProbeBehavior};

    #[test]
    fn test_own_answer_wins() {
        let log = CallLog::new();
        let root = Node::new("root");
        root.attach(ProbeBehavior::new("root", &log).with_value(1));
        root.spawn_child("child")
            .unwrap()
            .attach(ProbeBehavior::new("child", &log).with_value(2));

        assert_eq!(request::<dyn Probe, _, _>(&root, |p| p.value()), Some(1));
        assert_eq!(log.entries(), ["root:value"]);
    }

    #[test]
    fn test_first_descendant_answer_in_walk_order() {
        let log = CallLog::new();
        let root = Node::new("root");
        let a = root.spawn_child("a").unwrap();
        let a1 = a.spawn_child("a1").unwrap();
        let b = root.spawn_child("b").unwrap();
        a.attach(ProbeBehavior::new("a", &log));
        a1.attach(ProbeBehavior::new("a1", &log).with_value(11));
        b.attach(ProbeBehavior::new("b", &log).with_value(20));

        assert_eq!(request::<dyn Probe, _, _>(&root, |p| p.value()), Some(11));
        assert_eq!(log.entries(), ["a:value", "a1:value"]);
    }

    #[test]
    fn test_local_request_ignores_children() {
        let log = CallLog::new();
        let root = Node::new("root");
        root.spawn_child("child")
            .unwrap()
            .attach(ProbeBehavior::new("child", &log).with_value(2));

        assert_eq!(request_local::<dyn Probe, _, _>(&root, |p| p.value()), None);
        assert!(log.is_empty());
    }

    #[test]
    fn test_last_handler_wins() {
        let log = CallLog::new();
        let node = Node::new("node");
        node.attach(ProbeBehavior::new("first", &log).with_value(1));
        node.attach(ProbeBehavior::new("second", &log).with_value(2));
        assert_eq!(request_local::<dyn Probe, _, _>(&node, |p| p.value()), Some(2));
    }

    #[test]
    fn test_panic_resets_to_sentinel() {
        let log = CallLog::new();
        let node = Node::new("node");
        node.attach(ProbeBehavior::new("first", &log).with_value(1));
        node.attach(ProbeBehavior::new("boom", &log).panicking());
        node.attach(ProbeBehavior::new("third", &log).with_value(3));

        assert_eq!(request_local::<dyn Probe, _, _>(&node, |p| p.value()), None);
        assert_eq!(log.entries(), ["first:value", "boom:value"]);
    }

    #[test]
    fn test_sentinel_when_nobody_answers() {
        let root = Node::new("root");
        root.spawn_child("child").unwrap();
        assert_eq!(request::<dyn Probe, _, _>(&root, |p| p.value()), None);
        assert_eq!(request::<dyn Probe, u32, _>(&root, |_| 7), 0);
    }
}
