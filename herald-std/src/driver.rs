//! Real-time driver for hosts without a frame loop.

use crate::scheduler::Scheduler;
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior, interval};
use tracing::debug;

/// Tick `scheduler` every `period` with the measured elapsed time until no
/// submitted sequence is left running.
///
/// The scheduler is single-threaded, so this must run on the task that owns
/// it (for example inside a `LocalSet` or a current-thread runtime).
pub async fn drive(scheduler: &mut Scheduler, period: Duration) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut last = Instant::now();

    scheduler.flush();
    while !scheduler.is_idle() {
        ticker.tick().await;
        let now = Instant::now();
        scheduler.tick(now - last);
        last = now;
    }
    debug!("scheduler idle; driver stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        sequence::Sequence,
        testing::{CallLog, Probe, ProbeBehavior},
    };
    use herald_core::Node;

    #[tokio::test(start_paused = true)]
    async fn test_drive_runs_sequence_to_completion() {
        let log = CallLog::new();
        let mut scheduler = Scheduler::new();
        let node = Node::new("node");
        node.attach(ProbeBehavior::new("a", &log));

        let started = Instant::now();
        let running = Sequence::new(&scheduler.handle())
            .wait(Duration::from_secs(2))
            .send::<dyn Probe, _>(&node, |p| p.ping("late"))
            .run()
            .unwrap();

        drive(&mut scheduler, Duration::from_millis(100)).await;

        assert!(running.is_finished());
        assert!(started.elapsed() >= Duration::from_secs(2));
        assert_eq!(log.entries(), ["a:late", "a:late:done"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drive_returns_when_idle() {
        let mut scheduler = Scheduler::new();
        drive(&mut scheduler, Duration::from_millis(100)).await;
        assert!(scheduler.is_idle());
    }
}
