//! Fixed-interval scheduler.
//!
//! Runs a cycle immediately, then once per interval until the shutdown
//! future resolves. Cycles never overlap: the next wait starts only after the
//! previous cycle has returned, and shutdown is only observed while waiting,
//! so an in-flight cycle always runs to completion.

use std::future::Future;
use std::time::Duration;

use tokio::time::{self, MissedTickBehavior};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Running,
    Stopped,
}

pub struct Scheduler {
    interval: Duration,
    state: SchedulerState,
    cycles_run: u64,
}

impl Scheduler {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            state: SchedulerState::Running,
            cycles_run: 0,
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn cycles_run(&self) -> u64 {
        self.cycles_run
    }

    /// Drive `cycle` until `shutdown` completes. `Stopped` is terminal: calling
    /// `run` again returns immediately.
    pub async fn run<F, Fut, S>(&mut self, shutdown: S, mut cycle: F)
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ()>,
        S: Future<Output = ()>,
    {
        if self.state == SchedulerState::Stopped {
            return;
        }

        tokio::pin!(shutdown);

        cycle().await;
        self.cycles_run += 1;

        // Delay, not burst: a slow cycle pushes the next tick back instead of
        // queueing catch-up ticks.
        let mut ticker = time::interval_at(time::Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    self.state = SchedulerState::Stopped;
                    tracing::info!(cycles = self.cycles_run, "scheduler stopped");
                    return;
                }
                _ = ticker.tick() => {}
            }

            cycle().await;
            self.cycles_run += 1;
            ticker.reset();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;
    use tokio::sync::oneshot;

    #[tokio::test]
    async fn test_runs_first_cycle_immediately_then_stops() {
        let mut scheduler = Scheduler::new(Duration::from_secs(3600));
        let count = Arc::new(AtomicU64::new(0));

        let c = count.clone();
        // Shutdown is already requested, but the first cycle still runs.
        scheduler
            .run(async {}, move || {
                let c = c.clone();
                async move {
                    c.fetch_add(1, Ordering::SeqCst);
                }
            })
            .await;

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(scheduler.state(), SchedulerState::Stopped);
    }

    #[tokio::test]
    async fn test_ticks_until_cancelled_between_cycles() {
        let mut scheduler = Scheduler::new(Duration::from_millis(5));
        let (tx, rx) = oneshot::channel::<()>();
        let mut tx = Some(tx);
        let count = Arc::new(AtomicU64::new(0));

        let c = count.clone();
        scheduler
            .run(
                async move {
                    let _ = rx.await;
                },
                move || {
                    let n = c.fetch_add(1, Ordering::SeqCst) + 1;
                    if n == 3 {
                        if let Some(tx) = tx.take() {
                            let _ = tx.send(());
                        }
                    }
                    async {}
                },
            )
            .await;

        // Cancellation raised during cycle 3 is honored right after it.
        assert_eq!(count.load(Ordering::SeqCst), 3);
        assert_eq!(scheduler.cycles_run(), 3);
        assert_eq!(scheduler.state(), SchedulerState::Stopped);
    }

    #[tokio::test]
    async fn test_in_flight_cycle_is_not_aborted() {
        let mut scheduler = Scheduler::new(Duration::from_millis(5));
        let (tx, rx) = oneshot::channel::<()>();
        let mut tx = Some(tx);
        let finished = Arc::new(AtomicU64::new(0));

        let f = finished.clone();
        scheduler
            .run(
                async move {
                    let _ = rx.await;
                },
                move || {
                    let tx = tx.take();
                    let f = f.clone();
                    async move {
                        if let Some(tx) = tx {
                            let _ = tx.send(());
                        }
                        tokio::time::sleep(Duration::from_millis(20)).await;
                        f.fetch_add(1, Ordering::SeqCst);
                    }
                },
            )
            .await;

        assert_eq!(finished.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_stopped_is_terminal() {
        let mut scheduler = Scheduler::new(Duration::from_secs(3600));
        scheduler.run(async {}, || async {}).await;
        assert_eq!(scheduler.cycles_run(), 1);

        scheduler.run(async {}, || async {}).await;
        assert_eq!(scheduler.cycles_run(), 1);
    }
}
