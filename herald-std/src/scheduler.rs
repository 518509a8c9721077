//! # Scheduler Context
//!
//! The single runtime facility that executes suspendable work.
//!
//! [`Scheduler`] owns a single-threaded executor and a game [`Clock`]. The
//! host creates one per scene and calls [`Scheduler::tick`] once per frame.
//! Everything else talks to it through a cloneable [`SchedulerHandle`]:
//! sequences submit themselves through it, and behaviors use it to create
//! timed waits inside their own [`Steps`](herald_core::Steps).
//!
//! Dropping the `Scheduler` ends the scene: queued and in-flight sequences
//! are dropped, and later submissions fail with
//! [`SchedulerError::Unavailable`].

use crate::sequence::Sequence;
use futures::{
    channel::mpsc,
    executor::{LocalPool, LocalSpawner},
    future::BoxFuture,
    task::LocalSpawnExt,
};
use herald_core::SchedulerError;
use std::{
    future::Future,
    pin::Pin,
    sync::{
        Arc, Mutex, PoisonError,
        atomic::{AtomicUsize, Ordering},
    },
    task::{Context, Poll, Waker},
    time::Duration,
};
use tracing::{debug, error, warn};

/// A unit of work submitted to the scheduler.
pub(crate) type Job = BoxFuture<'static, ()>;

// ============================================================================
// Configuration
// ============================================================================

/// Configuration for a [`Scheduler`].
///
/// # Example
///
/// ```rust,ignore
/// let config = SchedulerConfig::new()
///     .with_time_scale(0.5)
///     .with_max_delta(Duration::from_millis(100));
/// let scheduler = Scheduler::with_config(config);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SchedulerConfig {
    /// Initial multiplier applied to game time. Default is 1.0.
    pub time_scale: f64,
    /// Upper bound on the delta accepted by a single tick.
    pub max_delta: Option<Duration>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl SchedulerConfig {
    /// Default configuration: unscaled time, unbounded deltas.
    pub const fn new() -> Self {
        Self {
            time_scale: 1.0,
            max_delta: None,
        }
    }

    /// Set the initial time scale.
    pub const fn with_time_scale(mut self, time_scale: f64) -> Self {
        self.time_scale = time_scale;
        self
    }

    /// Clamp every tick's delta to `max_delta`.
    pub const fn with_max_delta(mut self, max_delta: Duration) -> Self {
        self.max_delta = Some(max_delta);
        self
    }
}

// ============================================================================
// Clock
// ============================================================================

/// Which timeline a wait is measured against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeBase {
    /// Game time, affected by the time scale.
    Scaled,
    /// Real time, ignoring the time scale.
    Real,
}

struct PendingTimer {
    id: u64,
    base: TimeBase,
    deadline: Duration,
    waker: Waker,
}

struct ClockState {
    game_time: Duration,
    real_time: Duration,
    time_scale: f64,
    timers: Vec<PendingTimer>,
    next_timer: u64,
}

impl ClockState {
    fn now(&self, base: TimeBase) -> Duration {
        match base {
            TimeBase::Scaled => self.game_time,
            TimeBase::Real => self.real_time,
        }
    }

    /// Register a timer, or refresh the waker of one already registered.
    fn arm(&mut self, slot: &mut Option<u64>, base: TimeBase, deadline: Duration, waker: &Waker) {
        let registered = (*slot).and_then(|id| self.timers.iter_mut().find(|timer| timer.id == id));
        if let Some(timer) = registered {
            if !timer.waker.will_wake(waker) {
                timer.waker = waker.clone();
            }
            return;
        }
        let id = self.next_timer;
        self.next_timer += 1;
        self.timers.push(PendingTimer {
            id,
            base,
            deadline,
            waker: waker.clone(),
        });
        *slot = Some(id);
    }

    fn disarm(&mut self, id: u64) {
        self.timers.retain(|timer| timer.id != id);
    }
}

/// Game and real time as advanced by the scheduler's ticks.
pub struct Clock {
    state: Mutex<ClockState>,
}

impl Clock {
    fn new(time_scale: f64) -> Self {
        Self {
            state: Mutex::new(ClockState {
                game_time: Duration::ZERO,
                real_time: Duration::ZERO,
                time_scale: sanitize_scale(time_scale),
                timers: Vec::new(),
                next_timer: 0,
            }),
        }
    }

    fn state(&self) -> std::sync::MutexGuard<'_, ClockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Elapsed scaled game time.
    pub fn game_time(&self) -> Duration {
        self.state().game_time
    }

    /// Elapsed unscaled real time.
    pub fn real_time(&self) -> Duration {
        self.state().real_time
    }

    /// Current time scale.
    pub fn time_scale(&self) -> f64 {
        self.state().time_scale
    }

    /// Set the time scale. Negative or non-finite values are treated as 0.
    pub fn set_time_scale(&self, time_scale: f64) {
        self.state().time_scale = sanitize_scale(time_scale);
    }

    /// Advance both timelines and wake every timer whose deadline passed.
    fn advance(&self, delta: Duration) {
        let expired: Vec<Waker> = {
            let mut state = self.state();
            state.real_time = state.real_time.saturating_add(delta);
            let scaled = scale_delta(delta, state.time_scale);
            state.game_time = state.game_time.saturating_add(scaled);

            let (game_time, real_time) = (state.game_time, state.real_time);
            let mut expired = Vec::new();
            state.timers.retain(|timer| {
                let now = match timer.base {
                    TimeBase::Scaled => game_time,
                    TimeBase::Real => real_time,
                };
                if now >= timer.deadline {
                    expired.push(timer.waker.clone());
                    false
                } else {
                    true
                }
            });
            expired
        };
        for waker in expired {
            waker.wake();
        }
    }

    fn pending_timers(&self) -> usize {
        self.state().timers.len()
    }
}

/// `delta * time_scale`, saturating at [`Duration::MAX`].
fn scale_delta(delta: Duration, time_scale: f64) -> Duration {
    if time_scale == 1.0 {
        return delta;
    }
    Duration::try_from_secs_f64(delta.as_secs_f64() * time_scale).unwrap_or(Duration::MAX)
}

fn sanitize_scale(time_scale: f64) -> f64 {
    if time_scale.is_finite() && time_scale >= 0.0 {
        time_scale
    } else {
        warn!(time_scale, "invalid time scale; clamping to 0");
        0.0
    }
}

/// Future that completes once its clock passes a deadline.
///
/// A pending wait holds one timer on the clock no matter how often it is
/// polled. Dropping the wait removes that timer.
#[must_use = "a wait does nothing unless awaited"]
pub struct Wait {
    clock: Arc<Clock>,
    base: TimeBase,
    deadline: Duration,
    timer: Option<u64>,
}

impl Wait {
    /// The timeline this wait is measured on.
    pub fn time_base(&self) -> TimeBase {
        self.base
    }
}

impl Future for Wait {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        let this = self.get_mut();
        let mut state = this.clock.state();
        if state.now(this.base) >= this.deadline {
            if let Some(id) = this.timer.take() {
                state.disarm(id);
            }
            return Poll::Ready(());
        }
        state.arm(&mut this.timer, this.base, this.deadline, cx.waker());
        Poll::Pending
    }
}

impl Drop for Wait {
    fn drop(&mut self) {
        if let Some(id) = self.timer.take() {
            self.clock.state().disarm(id);
        }
    }
}

// ============================================================================
// Handle
// ============================================================================

/// Cloneable, thread-safe access to a [`Scheduler`].
#[derive(Clone)]
pub struct SchedulerHandle {
    sender: mpsc::UnboundedSender<Job>,
    clock: Arc<Clock>,
    in_flight: Arc<AtomicUsize>,
}

impl SchedulerHandle {
    /// The scheduler's clock.
    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    /// Whether the owning scheduler still exists.
    pub fn is_available(&self) -> bool {
        !self.sender.is_closed()
    }

    /// A future that completes after `duration` of scaled game time.
    ///
    /// The deadline is fixed when this is called, not when first polled.
    pub fn wait(&self, duration: Duration) -> Wait {
        self.wait_on(duration, TimeBase::Scaled)
    }

    /// A future that completes after `duration` of real time.
    pub fn wait_realtime(&self, duration: Duration) -> Wait {
        self.wait_on(duration, TimeBase::Real)
    }

    /// A future that completes after `duration` on the given timeline.
    pub fn wait_on(&self, duration: Duration, base: TimeBase) -> Wait {
        let deadline = self.clock.state().now(base).saturating_add(duration);
        Wait {
            clock: Arc::clone(&self.clock),
            base,
            deadline,
            timer: None,
        }
    }

    /// Start building a [`Sequence`] that runs on this scheduler.
    pub fn sequence(&self) -> Sequence {
        Sequence::new(self)
    }

    /// Hand a job to the scheduler. It starts on the next tick.
    pub(crate) fn submit(&self, job: Job) -> Result<(), SchedulerError> {
        let in_flight = Arc::clone(&self.in_flight);
        in_flight.fetch_add(1, Ordering::AcqRel);
        let counted: Job = Box::pin(async move {
            job.await;
            in_flight.fetch_sub(1, Ordering::AcqRel);
        });
        self.sender.unbounded_send(counted).map_err(|_| {
            self.in_flight.fetch_sub(1, Ordering::AcqRel);
            SchedulerError::Unavailable
        })
    }

    /// Number of submitted jobs that have not finished yet.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }
}

impl std::fmt::Debug for SchedulerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchedulerHandle")
            .field("available", &self.is_available())
            .field("in_flight", &self.in_flight())
            .finish()
    }
}

// ============================================================================
// Scheduler
// ============================================================================

/// The scheduler context: a single-threaded executor driven by ticks.
pub struct Scheduler {
    pool: LocalPool,
    spawner: LocalSpawner,
    receiver: mpsc::UnboundedReceiver<Job>,
    handle: SchedulerHandle,
    config: SchedulerConfig,
}

impl Scheduler {
    /// Create a scheduler with the default configuration.
    pub fn new() -> Self {
        Self::with_config(SchedulerConfig::default())
    }

    /// Create a scheduler with the given configuration.
    pub fn with_config(config: SchedulerConfig) -> Self {
        let pool = LocalPool::new();
        let spawner = pool.spawner();
        let (sender, receiver) = mpsc::unbounded();
        let handle = SchedulerHandle {
            sender,
            clock: Arc::new(Clock::new(config.time_scale)),
            in_flight: Arc::new(AtomicUsize::new(0)),
        };
        debug!(?config, "scheduler created");
        Self {
            pool,
            spawner,
            receiver,
            handle,
            config,
        }
    }

    /// A handle for submitting sequences and creating waits.
    pub fn handle(&self) -> SchedulerHandle {
        self.handle.clone()
    }

    /// The scheduler's clock.
    pub fn clock(&self) -> &Clock {
        &self.handle.clock
    }

    /// The configuration this scheduler was built with.
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Advance time by `delta` and run all work that can make progress.
    ///
    /// Sequences submitted since the last tick start first, at the current
    /// time. Then the clock advances, timers expiring within `delta` fire,
    /// and the executor runs until every task is blocked.
    pub fn tick(&mut self, delta: Duration) {
        let delta = match self.config.max_delta {
            Some(max) => delta.min(max),
            None => delta,
        };
        self.flush();
        self.handle.clock.advance(delta);
        self.flush();
    }

    /// Start newly submitted sequences and run until stalled, without
    /// advancing time.
    pub fn flush(&mut self) {
        self.accept_submissions();
        self.pool.run_until_stalled();
        // Sequences may submit further sequences while running.
        while self.accept_submissions() > 0 {
            self.pool.run_until_stalled();
        }
    }

    /// Whether no submitted sequence is still running.
    pub fn is_idle(&self) -> bool {
        self.handle.in_flight() == 0
    }

    /// Number of timers waiting on the clock.
    pub fn pending_timers(&self) -> usize {
        self.handle.clock.pending_timers()
    }

    /// Move queued jobs onto the executor, returning how many were accepted.
    fn accept_submissions(&mut self) -> usize {
        let mut accepted = 0;
        while let Ok(Some(job)) = self.receiver.try_next() {
            match self.spawner.spawn_local(job) {
                Ok(()) => accepted += 1,
                Err(err) => error!(error = %err, "failed to spawn sequence"),
            }
        }
        accepted
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}
