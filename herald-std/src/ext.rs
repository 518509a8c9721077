//! Node-first sugar for the dispatch, request and sequence APIs.
//!
//! ```rust,ignore
//! use herald::prelude::*;
//!
//! tank.send::<dyn Armor, _>(&scheduler, |armor| armor.apply_damage(10));
//!
//! tank.wait(&scheduler, Duration::from_secs(2))
//!     .send::<dyn Weapon, _>(&turret, |weapon| weapon.reload())
//!     .run();
//!
//! let health = tank.request::<dyn Armor, Option<i32>, _>(|armor| Some(armor.health()));
//! ```

use crate::{
    dispatch,
    request::{request, request_local},
    scheduler::SchedulerHandle,
    sequence::{Sequence, SequenceHandle},
};
use herald_core::{Node, Steps};
use std::time::Duration;

/// Extension methods on [`Node`].
///
/// `send` runs immediately and cannot be chained; `wait` returns a
/// [`Sequence`] to keep building on.
pub trait NodeExt {
    /// Dispatch `action` to this node as a one-step sequence and run it.
    fn send<C, F>(&self, scheduler: &SchedulerHandle, action: F) -> Option<SequenceHandle>
    where
        C: ?Sized + 'static,
        F: Fn(&mut C) -> Steps + Send + Sync + 'static;

    /// Dispatch `action` to this node and its active descendants as a
    /// one-step sequence and run it.
    fn send_subtree<C, F>(&self, scheduler: &SchedulerHandle, action: F) -> Option<SequenceHandle>
    where
        C: ?Sized + 'static,
        F: Fn(&mut C) -> Steps + Send + Sync + 'static;

    /// Start a sequence with a wait of scaled game time.
    fn wait(&self, scheduler: &SchedulerHandle, duration: Duration) -> Sequence;

    /// Start a sequence with a wait of real time.
    fn wait_realtime(&self, scheduler: &SchedulerHandle, duration: Duration) -> Sequence;

    /// See [`request`].
    fn request<C, R, F>(&self, action: F) -> R
    where
        C: ?Sized + 'static,
        R: Default + PartialEq,
        F: FnMut(&mut C) -> R;

    /// See [`request_local`].
    fn request_local<C, R, F>(&self, action: F) -> R
    where
        C: ?Sized + 'static,
        R: Default,
        F: FnMut(&mut C) -> R;

    /// See [`dispatch::execute`].
    fn execute<C, F>(&self, action: F) -> bool
    where
        C: ?Sized + 'static,
        F: FnMut(&mut C);

    /// See [`dispatch::can_handle`].
    fn can_handle<C: ?Sized + 'static>(&self) -> bool;

    /// See [`dispatch::event_handler`].
    fn event_handler<C: ?Sized + 'static>(&self) -> Option<Node>;
}

impl NodeExt for Node {
    fn send<C, F>(&self, scheduler: &SchedulerHandle, action: F) -> Option<SequenceHandle>
    where
        C: ?Sized + 'static,
        F: Fn(&mut C) -> Steps + Send + Sync + 'static,
    {
        Sequence::new(scheduler).send::<C, F>(self, action).run()
    }

    fn send_subtree<C, F>(&self, scheduler: &SchedulerHandle, action: F) -> Option<SequenceHandle>
    where
        C: ?Sized + 'static,
        F: Fn(&mut C) -> Steps + Send + Sync + 'static,
    {
        Sequence::new(scheduler).send_subtree::<C, F>(self, action).run()
    }

    fn wait(&self, scheduler: &SchedulerHandle, duration: Duration) -> Sequence {
        Sequence::new(scheduler).wait(duration)
    }

    fn wait_realtime(&self, scheduler: &SchedulerHandle, duration: Duration) -> Sequence {
        Sequence::new(scheduler).wait_realtime(duration)
    }

    fn request<C, R, F>(&self, action: F) -> R
    where
        C: ?Sized + 'static,
        R: Default + PartialEq,
        F: FnMut(&mut C) -> R,
    {
        request::<C, R, F>(self, action)
    }

    fn request_local<C, R, F>(&self, action: F) -> R
    where
        C: ?Sized + 'static,
        R: Default,
        F: FnMut(&mut C) -> R,
    {
        request_local::<C, R, F>(self, action)
    }

    fn execute<C, F>(&self, action: F) -> bool
    where
        C: ?Sized + 'static,
        F: FnMut(&mut C),
    {
        dispatch::execute::<C, F>(self, action)
    }

    fn can_handle<C: ?Sized + 'static>(&self) -> bool {
        dispatch::can_handle::<C>(self)
    }

    fn event_handler<C: ?Sized + 'static>(&self) -> Option<Node> {
        dispatch::event_handler::<C>(self)
    }
}
