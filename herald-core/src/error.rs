//! Error types for Herald.
//!
//! This module provides a structured error hierarchy using `thiserror`:
//!
//! - [`HeraldError`] - Top-level error type
//! - [`DispatchError`] - Failures while invoking a single handler
//! - [`SchedulerError`] - Sequences that could not be handed to a scheduler
//! - [`PoolError`] - Object pool misuse
//! - [`NodeError`] - Invalid scene-graph edits
//!
//! None of these escape `send`, `request` or `run`: the dispatch layer logs
//! them and carries on with the next handler, node or sequence.

use std::any::Any;
use thiserror::Error;

/// A boxed error type for dynamic error handling.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Top-level error type for all Herald operations.
#[derive(Error, Debug)]
pub enum HeraldError {
    /// A handler could not be invoked.
    #[error("dispatch error: {0}")]
    Dispatch(#[from] DispatchError),

    /// A sequence could not be scheduled.
    #[error("scheduler error: {0}")]
    Scheduler(#[from] SchedulerError),

    /// A pooled instance was misused.
    #[error("pool error: {0}")]
    Pool(#[from] PoolError),

    /// A scene-graph edit was rejected.
    #[error("node error: {0}")]
    Node(#[from] NodeError),

    /// A custom error occurred.
    #[error(transparent)]
    Custom(BoxError),
}

/// Errors raised while invoking one handler during a dispatch.
#[derive(Error, Debug)]
pub enum DispatchError {
    /// The behavior advertised a capability but could not be cast to it.
    #[error("type {expected} expected, {actual} received")]
    CapabilityMismatch {
        /// The capability the dispatcher asked for.
        expected: &'static str,
        /// The concrete behavior type found on the node.
        actual: &'static str,
    },

    /// The handler panicked while running.
    #[error("handler {handler} panicked: {message}")]
    HandlerPanicked {
        /// The concrete behavior type.
        handler: &'static str,
        /// The panic payload, if it was a string.
        message: String,
    },

    /// The handler's step sequence finished with an error.
    #[error("handler {handler} failed")]
    HandlerFailed {
        /// The concrete behavior type.
        handler: &'static str,
        /// The error returned by the steps.
        #[source]
        source: BoxError,
    },

    /// The behavior is already executing further up the stack.
    #[error("handler {handler} is already executing")]
    HandlerBusy {
        /// The concrete behavior type.
        handler: &'static str,
    },
}

impl DispatchError {
    /// Build a [`DispatchError::HandlerPanicked`] from a caught panic payload.
    pub fn panicked(handler: &'static str, payload: &(dyn Any + Send)) -> Self {
        let message = if let Some(text) = payload.downcast_ref::<&str>() {
            (*text).to_string()
        } else if let Some(text) = payload.downcast_ref::<String>() {
            text.clone()
        } else {
            "non-string panic payload".to_string()
        };
        DispatchError::HandlerPanicked { handler, message }
    }
}

/// Errors raised when a sequence is handed to the scheduler.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerError {
    /// The scheduler context that owns the executor has been dropped.
    #[error("scheduler context is not available")]
    Unavailable,

    /// The sequence has no steps.
    #[error("no steps found to be run")]
    EmptySequence,
}

/// Errors raised by [`ObjectPool`](crate::ObjectPool).
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolError {
    /// The instance is already on top of the free list.
    #[error("trying to release an object that is already released to the pool")]
    DoubleRelease,
}

/// Errors raised when editing the scene graph.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NodeError {
    /// The edit would make a node its own ancestor.
    #[error("node {child} cannot be parented under its own descendant {parent}")]
    Cycle {
        /// The node that would become the parent.
        parent: String,
        /// The node being re-parented.
        child: String,
    },

    /// One of the nodes has been destroyed.
    #[error("node {0} has been destroyed")]
    Destroyed(String),
}

impl From<BoxError> for HeraldError {
    fn from(err: BoxError) -> Self {
        HeraldError::Custom(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panicked_extracts_str_payload() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        let err = DispatchError::panicked("Armor", &*payload);
        assert_eq!(err.to_string(), "handler Armor panicked: boom");
    }

    #[test]
    fn test_panicked_extracts_string_payload() {
        let payload: Box<dyn Any + Send> = Box::new(String::from("bad state"));
        let err = DispatchError::panicked("Weapon", &*payload);
        assert!(err.to_string().contains("bad state"));
    }

    #[test]
    fn test_mismatch_display() {
        let err = DispatchError::CapabilityMismatch {
            expected: "dyn Armor",
            actual: "Weapon",
        };
        assert_eq!(err.to_string(), "type dyn Armor expected, Weapon received");
    }

    #[test]
    fn test_umbrella_conversion() {
        let err: HeraldError = SchedulerError::Unavailable.into();
        assert!(matches!(err, HeraldError::Scheduler(SchedulerError::Unavailable)));
    }
}
