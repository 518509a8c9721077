//! # herald-core
//!
//! Core types for the Herald scene messaging layer.
//!
//! This crate has minimal dependencies and holds everything a behavior
//! author needs to declare capabilities, without pulling in the scheduler.
//!
//! # Building Blocks
//!
//! - [`Node`]: shared handle to a scene-graph entity with behaviors and children
//! - [`Behavior`] / [`Capabilities`]: declare which capability traits a
//!   behavior exposes
//! - [`Steps`]: the suspendable sequence a sent capability method returns
//! - [`registry`]: which behaviors on a node receive a given capability
//! - [`walk`](walk::walk): active-subtree traversal
//! - [`ObjectPool`]: free-list pool for transient handler lists
//!
//! # Error Types
//!
//! - [`HeraldError`] - Top-level error type
//! - [`DispatchError`] - Handler invocation errors
//! - [`SchedulerError`] - Sequence scheduling errors

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

mod behavior;
mod error;
mod node;
mod pool;
mod steps;
mod sync;

pub mod registry;
pub mod walk;

// Re-exports
pub use behavior::{Behavior, BehaviorCell, Capabilities, EnabledHandle};
pub use error::{BoxError, DispatchError, HeraldError, NodeError, PoolError, SchedulerError};
pub use node::{Node, NodeId};
pub use pool::{ListPool, ObjectPool, Poolable};
pub use registry::HandlerList;
pub use steps::{StepResult, Steps};
pub use walk::{Ancestors, Walk, ancestors, descendants, walk};
