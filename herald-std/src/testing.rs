//! Testing utilities for Herald.
//!
//! This module provides a ready-made capability and behavior for exercising
//! dispatch, requests and sequences without writing fixtures.
//!
//! # Features
//!
//! - [`Probe`]: a capability with one sent method, one plain method and one
//!   requested value
//! - [`ProbeBehavior`]: a configurable `Probe` that records every call
//! - [`CallLog`]: a shared, cloneable record of calls in arrival order

use crate::scheduler::{SchedulerHandle, Wait};
use herald_core::{Behavior, Capabilities, Steps};
use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

// ============================================================================
// Call Log
// ============================================================================

/// A shared log of calls in the order they happened.
///
/// # Example
///
/// ```rust,ignore
/// let log = CallLog::new();
/// node.attach(ProbeBehavior::new("a", &log));
///
/// execute::<dyn Probe, _>(&node, |probe| probe.touch("hit"));
/// assert_eq!(log.entries(), ["a:hit"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    entries: Arc<Mutex<Vec<String>>>,
}

impl CallLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry.
    pub fn record(&self, entry: impl Into<String>) {
        self.lock().push(entry.into());
    }

    /// Get a clone of the recorded entries.
    pub fn entries(&self) -> Vec<String> {
        self.lock().clone()
    }

    /// Get the number of recorded entries.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clear all recorded entries.
    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, Vec<String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// ============================================================================
// Probe
// ============================================================================

/// A capability for tests.
pub trait Probe {
    /// Record `name:label`, then return steps that record `name:label:done`.
    fn ping(&mut self, label: &str) -> Steps;

    /// Record `name:label` synchronously.
    fn touch(&mut self, label: &str);

    /// Record `name:value` and answer with the configured value.
    fn value(&mut self) -> Option<i32>;
}

/// A [`Probe`] implementation that records its calls to a [`CallLog`].
///
/// # Example
///
/// ```rust,ignore
/// let slow = ProbeBehavior::new("slow", &log)
///     .with_value(3)
///     .with_delay(&scheduler.handle(), Duration::from_secs(1));
/// ```
pub struct ProbeBehavior {
    name: String,
    log: CallLog,
    value: Option<i32>,
    delay: Option<(SchedulerHandle, Duration)>,
    panicking: bool,
    failing: bool,
}

impl ProbeBehavior {
    /// Create a probe named `name` that records to `log`.
    pub fn new(name: impl Into<String>, log: &CallLog) -> Self {
        Self {
            name: name.into(),
            log: log.clone(),
            value: None,
            delay: None,
            panicking: false,
            failing: false,
        }
    }

    /// Answer requests with `value`.
    pub fn with_value(mut self, value: i32) -> Self {
        self.value = Some(value);
        self
    }

    /// Make the steps returned by `ping` wait `duration` of game time.
    pub fn with_delay(mut self, scheduler: &SchedulerHandle, duration: Duration) -> Self {
        self.delay = Some((scheduler.clone(), duration));
        self
    }

    /// Panic after recording each call.
    pub fn panicking(mut self) -> Self {
        self.panicking = true;
        self
    }

    /// Make `ping` return failed steps instead of recording completion.
    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    fn record(&self, label: &str) {
        self.log.record(format!("{}:{}", self.name, label));
        if self.panicking {
            panic!("probe {} panicked on {}", self.name, label);
        }
    }
}

impl Probe for ProbeBehavior {
    fn ping(&mut self, label: &str) -> Steps {
        self.record(label);
        if self.failing {
            return Steps::failed(format!("probe {} failed", self.name));
        }
        let wait: Option<Wait> = self
            .delay
            .as_ref()
            .map(|(scheduler, duration)| scheduler.wait(*duration));
        let log = self.log.clone();
        let done = format!("{}:{}:done", self.name, label);
        Steps::new(async move {
            if let Some(wait) = wait {
                wait.await;
            }
            log.record(done);
            Ok(())
        })
    }

    fn touch(&mut self, label: &str) {
        self.record(label);
    }

    fn value(&mut self) -> Option<i32> {
        self.record("value");
        self.value
    }
}

impl Behavior for ProbeBehavior {
    fn register_capabilities(capabilities: &mut Capabilities<Self>) {
        capabilities.add::<dyn Probe>(|probe| probe);
    }
}
