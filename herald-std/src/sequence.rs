//! # Sequences
//!
//! A [`Sequence`] is an ordered list of steps handed to the scheduler as
//! one unit. Each step fully completes before the next begins:
//!
//! - a **send** step dispatches a capability method to a node (and
//!   optionally its active descendants), awaiting every handler's returned
//!   [`Steps`] in turn;
//! - a **wait** step suspends the sequence on the scheduler's clock.
//!
//! # Example
//!
//! ```rust,ignore
//! scheduler
//!     .sequence()
//!     .send::<dyn Armor, _>(&tank, |armor| armor.apply_damage(10))
//!     .wait(Duration::from_secs(2))
//!     .send::<dyn Weapon, _>(&turret, |weapon| weapon.reload())
//!     .run();
//! ```

use crate::{
    dispatch::execute_steps,
    scheduler::{SchedulerHandle, TimeBase},
};
use futures::{FutureExt, future::BoxFuture};
use herald_core::{Node, SchedulerError, Steps, walk};
use std::{
    any::type_name,
    fmt,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};
use tracing::{Instrument, debug, debug_span, warn};

type SendFn = Arc<dyn Fn(Node) -> BoxFuture<'static, bool> + Send + Sync>;

enum Step {
    Send {
        node: Node,
        include_descendants: bool,
        capability: &'static str,
        dispatch: SendFn,
    },
    Wait {
        duration: Duration,
        base: TimeBase,
    },
}

impl fmt::Debug for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Send {
                node,
                include_descendants,
                capability,
                ..
            } => f
                .debug_struct("Send")
                .field("node", node)
                .field("include_descendants", include_descendants)
                .field("capability", capability)
                .finish(),
            Step::Wait { duration, base } => f
                .debug_struct("Wait")
                .field("duration", duration)
                .field("base", base)
                .finish(),
        }
    }
}

/// An ordered list of send and wait steps.
#[must_use = "a sequence does nothing until `run` is called"]
#[derive(Debug)]
pub struct Sequence {
    scheduler: SchedulerHandle,
    steps: Vec<Step>,
}

impl Sequence {
    /// Create an empty sequence that will run on `scheduler`.
    pub fn new(scheduler: &SchedulerHandle) -> Self {
        Self {
            scheduler: scheduler.clone(),
            steps: Vec::new(),
        }
    }

    /// Append a step dispatching `action` to the behaviors of `node`.
    pub fn send<C, F>(self, node: &Node, action: F) -> Self
    where
        C: ?Sized + 'static,
        F: Fn(&mut C) -> Steps + Send + Sync + 'static,
    {
        self.push_send::<C, F>(node, action, false)
    }

    /// Append a step dispatching `action` to `node` and then to each of its
    /// active descendants, one node at a time.
    pub fn send_subtree<C, F>(self, node: &Node, action: F) -> Self
    where
        C: ?Sized + 'static,
        F: Fn(&mut C) -> Steps + Send + Sync + 'static,
    {
        self.push_send::<C, F>(node, action, true)
    }

    /// Append a wait of `duration` scaled game time.
    pub fn wait(mut self, duration: Duration) -> Self {
        self.steps.push(Step::Wait {
            duration,
            base: TimeBase::Scaled,
        });
        self
    }

    /// Append a wait of `duration` real time, ignoring the time scale.
    pub fn wait_realtime(mut self, duration: Duration) -> Self {
        self.steps.push(Step::Wait {
            duration,
            base: TimeBase::Real,
        });
        self
    }

    /// Number of steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether the sequence has no steps.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Hand the sequence to the scheduler.
    ///
    /// Returns `None`, after logging a warning, if the sequence is empty or
    /// the scheduler has been dropped. In both cases no step runs.
    pub fn run(self) -> Option<SequenceHandle> {
        if self.steps.is_empty() {
            warn!("{}", SchedulerError::EmptySequence);
            return None;
        }

        let finished = Arc::new(AtomicBool::new(false));
        let steps = self.steps.len();
        let span = debug_span!("sequence", steps);
        let job = run_steps(self.steps, self.scheduler.clone(), Arc::clone(&finished))
            .instrument(span)
            .boxed();

        match self.scheduler.submit(job) {
            Ok(()) => {
                debug!(steps, "sequence scheduled");
                Some(SequenceHandle { finished })
            }
            Err(err) => {
                warn!(error = %err, steps, "sequence abandoned");
                None
            }
        }
    }

    fn push_send<C, F>(mut self, node: &Node, action: F, include_descendants: bool) -> Self
    where
        C: ?Sized + 'static,
        F: Fn(&mut C) -> Steps + Send + Sync + 'static,
    {
        let action = Arc::new(action);
        let dispatch: SendFn = Arc::new(move |target: Node| {
            let action = Arc::clone(&action);
            async move { execute_steps::<C, F>(&target, &*action).await }.boxed()
        });
        self.steps.push(Step::Send {
            node: node.clone(),
            include_descendants,
            capability: type_name::<C>(),
            dispatch,
        });
        self
    }
}

async fn run_steps(steps: Vec<Step>, scheduler: SchedulerHandle, finished: Arc<AtomicBool>) {
    for (index, step) in steps.into_iter().enumerate() {
        debug!(index, ?step, "step started");
        match step {
            Step::Send {
                node,
                include_descendants,
                dispatch,
                ..
            } => {
                let targets: Vec<Node> = if include_descendants {
                    walk(&node).collect()
                } else {
                    vec![node]
                };
                for target in targets {
                    dispatch(target).await;
                }
            }
            Step::Wait { duration, base } => scheduler.wait_on(duration, base).await,
        }
    }
    finished.store(true, Ordering::Release);
    debug!("sequence finished");
}

/// Observes a running sequence.
#[derive(Debug, Clone)]
pub struct SequenceHandle {
    finished: Arc<AtomicBool>,
}

impl SequenceHandle {
    /// Whether every step of the sequence has completed.
    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Acquire)
    }
}
