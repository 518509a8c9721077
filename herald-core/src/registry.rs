//! Component registry lookup.
//!
//! Resolves which behaviors on a node should receive a message for
//! capability `C`: the node must be active in the hierarchy, and each
//! behavior must both provide `C` and be enabled. Results keep attachment
//! order.
//!
//! Dispatch draws its handler lists from a thread-local [`ListPool`]
//! through [`acquire_list`] and [`release_list`], so it does not allocate
//! once the pool is warm. [`handlers`] is the allocating convenience for
//! callers that keep the list.

use crate::{behavior::BehaviorCell, node::Node, pool::ListPool};
use std::{cell::RefCell, sync::Arc};

/// A list of behaviors matched for one dispatch.
pub type HandlerList = Vec<Arc<BehaviorCell>>;

thread_local! {
    static HANDLER_LISTS: RefCell<ListPool<Arc<BehaviorCell>>> =
        RefCell::new(ListPool::for_lists());
}

/// Take an empty handler list from this thread's pool.
pub fn acquire_list() -> HandlerList {
    HANDLER_LISTS.with(|pool| pool.borrow_mut().get())
}

/// Give a handler list back to this thread's pool.
///
/// A double release is reported by the pool and otherwise ignored.
pub fn release_list(list: HandlerList) {
    HANDLER_LISTS.with(|pool| {
        let _ = pool.borrow_mut().release(list);
    });
}

/// `(count_all, count_inactive)` of this thread's handler list pool.
pub fn pool_stats() -> (usize, usize) {
    HANDLER_LISTS.with(|pool| {
        let pool = pool.borrow();
        (pool.count_all(), pool.count_inactive())
    })
}

/// Whether a behavior should receive messages for capability `C`.
pub fn should_receive<C: ?Sized + 'static>(cell: &BehaviorCell) -> bool {
    cell.provides::<C>() && cell.is_enabled()
}

/// Append the behaviors on `node` that handle capability `C` to `results`.
///
/// Appends nothing if `node` is destroyed or not active in the hierarchy.
pub fn collect_handlers<C: ?Sized + 'static>(node: &Node, results: &mut HandlerList) {
    if !node.is_active_in_hierarchy() {
        return;
    }
    node.visit_behaviors(|cell| {
        if should_receive::<C>(cell) {
            results.push(Arc::clone(cell));
        }
    });
}

/// The behaviors on `node` that handle capability `C`, in attachment order.
///
/// Allocates a fresh list and leaves the thread's pool untouched. Use
/// [`acquire_list`] with [`collect_handlers`] on hot paths.
pub fn handlers<C: ?Sized + 'static>(node: &Node) -> HandlerList {
    let mut results = HandlerList::new();
    collect_handlers::<C>(node, &mut results);
    results
}
