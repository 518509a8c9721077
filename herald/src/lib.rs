//! # herald - Capability Messaging for Scene Graphs
//!
//! `herald` lets one entity broadcast a message to every behavior on a
//! target node (and optionally its descendants) that provides a capability
//! trait, without naming the receiver's concrete type.
//!
//! Messages come in two shapes:
//!
//! - **Sequences** of send and wait steps, run in order on a [`Scheduler`].
//!   A sent capability method returns [`Steps`], which the sequence awaits
//!   before moving on.
//! - **Requests**, answered synchronously by the first behavior that returns
//!   something other than the result type's default.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use herald::prelude::*;
//! use std::time::Duration;
//!
//! trait Armor {
//!     fn apply_damage(&mut self, damage: i32) -> Steps;
//!     fn health(&self) -> i32;
//! }
//!
//! #[derive(Behavior)]
//! #[behavior(capabilities(Armor))]
//! struct Plate {
//!     health: i32,
//! }
//!
//! let mut scheduler = Scheduler::new();
//! let tank = Node::new("tank");
//! tank.attach(Plate { health: 100 });
//!
//! scheduler
//!     .handle()
//!     .sequence()
//!     .send::<dyn Armor, _>(&tank, |armor| armor.apply_damage(10))
//!     .wait(Duration::from_secs(2))
//!     .run();
//!
//! // once per frame
//! scheduler.tick(frame_time);
//!
//! let health = tank.request::<dyn Armor, Option<i32>, _>(|armor| Some(armor.health()));
//! ```

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

pub use herald_core::{
    // Scene graph
    Ancestors,
    // Behaviors
    Behavior,
    BehaviorCell,
    // Errors
    BoxError,
    Capabilities,
    DispatchError,
    EnabledHandle,
    HandlerList,
    HeraldError,
    // Pooling
    ListPool,
    Node,
    NodeError,
    NodeId,
    ObjectPool,
    PoolError,
    Poolable,
    SchedulerError,
    StepResult,
    // Steps
    Steps,
    Walk,
    ancestors,
    descendants,
    walk,
};

pub use herald_std::{
    // Scheduling
    Clock,
    // Node sugar
    NodeExt,
    Scheduler,
    SchedulerConfig,
    SchedulerHandle,
    // Sequences
    Sequence,
    SequenceHandle,
    TimeBase,
    Wait,
    // Dispatch
    can_handle,
    event_handler,
    execute,
    execute_hierarchy,
    execute_steps,
    // Requests
    request,
    request_local,
    request_node,
};

#[cfg(feature = "tokio")]
pub use herald_std::drive;

/// Handler lookup for a single node.
pub mod registry {
    pub use herald_core::registry::{
        HandlerList, acquire_list, collect_handlers, handlers, pool_stats, release_list,
        should_receive,
    };
}

/// Testing utilities.
pub mod testing {
    pub use herald_std::testing::{CallLog, Probe, ProbeBehavior};
}

/// Prelude module - common imports for Herald.
///
/// # Usage
///
/// ```rust,ignore
/// use herald::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        // Core types
        Behavior,
        Capabilities,
        EnabledHandle,
        Node,
        // Sugar
        NodeExt,
        Scheduler,
        SchedulerHandle,
        Sequence,
        Steps,
    };
}

#[cfg(feature = "macros")]
pub use herald_macros::Behavior;
