//! Suspendable step sequences returned by capability methods.
//!
//! A capability method meant to be sent (rather than requested) returns
//! [`Steps`]: a boxed future the dispatcher awaits before moving to the
//! next handler. Work done before returning happens immediately; anything
//! inside the future runs on the scheduler and may suspend, e.g. on a timed
//! wait.
//!
//! # Example
//!
//! ```rust,ignore
//! impl Weapon for Rifle {
//!     fn reload(&mut self) -> Steps {
//!         self.rounds = 0;
//!         let wait = self.scheduler.wait(Duration::from_secs(1));
//!         let rounds = self.rounds_handle.clone();
//!         Steps::new(async move {
//!             wait.await;
//!             rounds.store(30, Ordering::Release);
//!             Ok(())
//!         })
//!     }
//! }
//! ```

use crate::error::BoxError;
use futures::future::{BoxFuture, FutureExt};
use std::{
    fmt,
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};

/// Outcome of a step sequence.
pub type StepResult = Result<(), BoxError>;

/// A lazily executed, suspendable sequence of steps.
#[must_use = "steps do nothing unless awaited by the dispatcher"]
pub struct Steps(BoxFuture<'static, StepResult>);

impl Steps {
    /// Wrap a future as a step sequence.
    pub fn new<F>(future: F) -> Self
    where
        F: Future<Output = StepResult> + Send + 'static,
    {
        Self(future.boxed())
    }

    /// The empty sequence: completes on first poll.
    pub fn done() -> Self {
        Self::new(futures::future::ready(Ok(())))
    }

    /// A sequence that fails on first poll.
    pub fn failed(err: impl Into<BoxError>) -> Self {
        Self::new(futures::future::ready(Err(err.into())))
    }

    /// Run `next` after `self` completes successfully.
    pub fn then(self, next: Steps) -> Steps {
        Steps::new(async move {
            self.await?;
            next.await
        })
    }
}

impl Default for Steps {
    fn default() -> Self {
        Self::done()
    }
}

impl Future for Steps {
    type Output = StepResult;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.0.poll_unpin(cx)
    }
}

impl fmt::Debug for Steps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Steps")
    }
}
