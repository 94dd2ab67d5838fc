//! Owned periodic timer.
//!
//! A [`TimerHandle`] owns a spawned ticker task and a cancellation token.
//! Dropping the handle disarms the timer, so every exit path (explicit
//! disarm, re-arm, teardown, unwinding) releases it.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Handle to one armed periodic timer. Disarms on drop.
#[derive(Debug)]
pub struct TimerHandle {
    period: Duration,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl TimerHandle {
    /// Arms a timer that calls `on_tick` every `period`, first one full period
    /// from now. Returns `None` for a zero period, which means "disabled".
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn arm<F>(period: Duration, mut on_tick: F) -> Option<Self>
    where
        F: FnMut() + Send + 'static,
    {
        if period.is_zero() {
            return None;
        }

        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let start = Instant::now() + period;
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(start, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    () = token.cancelled() => break,
                    _ = ticker.tick() => {
                        if token.is_cancelled() {
                            break;
                        }
                        on_tick();
                    }
                }
            }
        });

        debug!(?period, "timer armed");
        Some(Self {
            period,
            cancel,
            task,
        })
    }

    /// The period this timer fires at.
    #[must_use]
    pub fn period(&self) -> Duration {
        self.period
    }

    /// True until the timer is disarmed.
    #[must_use]
    pub fn is_armed(&self) -> bool {
        !self.cancel.is_cancelled() && !self.task.is_finished()
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
        self.task.abort();
        debug!(period = ?self.period, "timer disarmed");
    }
}
