//! # herald-std
//!
//! Dispatch, requests and sequencing for the Herald scene messaging layer.
//!
//! This crate provides:
//! - **Dispatch**: [`execute`], [`execute_hierarchy`], [`can_handle`],
//!   [`event_handler`], [`execute_steps`]
//! - **Requests**: [`request`], [`request_local`]
//! - **Sequences**: [`Sequence`] and the [`NodeExt`] sugar
//! - **Scheduling**: [`Scheduler`], [`SchedulerHandle`], [`Clock`]
//! - **Testing**: [`testing`] fixtures

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

// Re-export core crate
pub use herald_core;

// Modules
pub mod dispatch;
pub mod ext;
pub mod request;
pub mod scheduler;
pub mod sequence;
pub mod testing;

#[cfg(feature = "tokio")]
pub mod driver;

pub use dispatch::{can_handle, event_handler, execute, execute_hierarchy, execute_steps};
pub use ext::NodeExt;
pub use request::{request, request_local, request_node};
pub use scheduler::{Clock, Scheduler, SchedulerConfig, SchedulerHandle, TimeBase, Wait};
pub use sequence::{Sequence, SequenceHandle};

#[cfg(feature = "tokio")]
pub use driver::drive;
