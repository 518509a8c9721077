//! Synchronous and step-awaiting dispatch to the behaviors of one node.
//!
//! Every handler runs in isolation: a panic, a failed capability cast or a
//! re-entrant call into a behavior that is already executing is logged and
//! the remaining handlers still run. Nothing here returns an error to the
//! caller; the `bool` results only report whether a handler existed.

use futures::FutureExt;
use herald_core::{
    BehaviorCell, DispatchError, Node, Steps, ancestors,
    registry::{acquire_list, collect_handlers, release_list},
};
use std::{
    any::type_name,
    panic::{AssertUnwindSafe, catch_unwind},
};
use tracing::{error, trace, warn};

/// Invoke `action` on every behavior of `node` that handles capability `C`.
///
/// Returns whether at least one matching handler was found, regardless of
/// whether the handlers succeeded.
///
/// # Example
///
/// ```rust,ignore
/// let hit = execute::<dyn Armor, _>(&target, |armor| {
///     armor.absorb(10);
/// });
/// ```
pub fn execute<C, F>(node: &Node, mut action: F) -> bool
where
    C: ?Sized + 'static,
    F: FnMut(&mut C),
{
    let mut handlers = acquire_list();
    collect_handlers::<C>(node, &mut handlers);
    let found = !handlers.is_empty();

    for cell in &handlers {
        trace!(node = %node, capability = type_name::<C>(), handler = cell.type_name(), "execute");
        if let Err(err) = invoke::<C, ()>(cell, &mut action) {
            report(node, &err);
        }
    }

    release_list(handlers);
    found
}

/// Execute on `node`, then on each ancestor in turn, stopping at the first
/// node that had a handler for `C`.
///
/// Returns that node, or `None` if no node up to the root handled `C`.
pub fn execute_hierarchy<C, F>(node: &Node, mut action: F) -> Option<Node>
where
    C: ?Sized + 'static,
    F: FnMut(&mut C),
{
    ancestors(node).find(|current| execute::<C, _>(current, &mut action))
}

/// Whether any enabled behavior on `node` handles capability `C`.
pub fn can_handle<C: ?Sized + 'static>(node: &Node) -> bool {
    let mut handlers = acquire_list();
    collect_handlers::<C>(node, &mut handlers);
    let found = !handlers.is_empty();
    release_list(handlers);
    found
}

/// The first node, starting at `node` and moving up through its ancestors,
/// that can handle capability `C`.
pub fn event_handler<C: ?Sized + 'static>(node: &Node) -> Option<Node> {
    ancestors(node).find(can_handle::<C>)
}

/// Invoke `action` on each matching behavior of `node` and await the
/// returned [`Steps`] before moving on to the next behavior.
///
/// Returns whether at least one matching handler was found.
pub async fn execute_steps<C, F>(node: &Node, action: &F) -> bool
where
    C: ?Sized + 'static,
    F: Fn(&mut C) -> Steps + Sync,
{
    let mut handlers = acquire_list();
    collect_handlers::<C>(node, &mut handlers);
    let found = !handlers.is_empty();

    for cell in &handlers {
        trace!(node = %node, capability = type_name::<C>(), handler = cell.type_name(), "send");
        let steps = match begin_steps::<C, F>(cell, action) {
            Ok(steps) => steps,
            Err(err) => {
                report(node, &err);
                continue;
            }
        };
        let outcome = match AssertUnwindSafe(steps).catch_unwind().await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(source)) => Err(DispatchError::HandlerFailed {
                handler: cell.type_name(),
                source,
            }),
            Err(payload) => Err(DispatchError::panicked(cell.type_name(), &*payload)),
        };
        if let Err(err) = outcome {
            report(node, &err);
        }
    }

    release_list(handlers);
    found
}

fn begin_steps<C, F>(cell: &BehaviorCell, action: &F) -> Result<Steps, DispatchError>
where
    C: ?Sized + 'static,
    F: Fn(&mut C) -> Steps,
{
    invoke::<C, Steps>(cell, |target| action(target))
}

/// Run `action` against one behavior, converting a panic into an error.
pub(crate) fn invoke<C, R>(
    cell: &BehaviorCell,
    action: impl FnOnce(&mut C) -> R,
) -> Result<R, DispatchError>
where
    C: ?Sized + 'static,
{
    match catch_unwind(AssertUnwindSafe(|| cell.with_capability::<C, R>(action))) {
        Ok(result) => result,
        Err(payload) => Err(DispatchError::panicked(cell.type_name(), &*payload)),
    }
}

/// Log a handler failure without interrupting the dispatch.
pub(crate) fn report(node: &Node, err: &DispatchError) {
    match err {
        DispatchError::HandlerBusy { .. } => {
            warn!(node = %node, error = %err, "skipping re-entrant handler");
        }
        DispatchError::HandlerFailed { source, .. } => {
            error!(node = %node, error = %err, cause = %source, "handler failed");
        }
        _ => error!(node = %node, error = %err, "handler failed"),
    }
}
