//! Run-on-a-timer policy.
//!
//! The wrapper is either Armed (one live [`TimerHandle`] firing `invoke` every
//! period) or Disarmed (zero period, or torn down). Every transition goes
//! through `rearm`, which drops the previous handle before arming a new one,
//! so there is never more than one timer per wrapper.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::debug;

use crate::controller::PendingHandle;
use crate::state::AsyncState;
use crate::timer::TimerHandle;
use crate::traits::{Controller, SettleObserver};

#[derive(Debug)]
struct Schedule {
    period: Duration,
    timer: Option<TimerHandle>,
    torn_down: bool,
}

/// Re-invokes the wrapped controller with default arguments every period.
///
/// A zero period disables polling. Changing the period or calling
/// [`Interval::fetch`] re-arms the timer, so the next tick is one full period
/// after that moment. Teardown (explicit or on drop) is final: no further
/// timer invocations happen afterwards.
#[derive(Debug)]
pub struct Interval<C> {
    inner: C,
    schedule: Mutex<Schedule>,
}

impl<C> Interval<C>
where
    C: Controller + Clone + 'static,
    C::Args: Default,
{
    /// Wraps `inner` and arms the timer right away.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime with a non-zero period.
    pub fn new(inner: C, period: Duration) -> Self {
        let interval = Self {
            inner,
            schedule: Mutex::new(Schedule {
                period,
                timer: None,
                torn_down: false,
            }),
        };
        interval.rearm(&mut interval.schedule.lock());
        interval
    }

    /// Re-arms the timer, then invokes immediately with `args`.
    pub fn fetch(&self, args: C::Args) -> PendingHandle<C::Output, C::Error> {
        self.rearm(&mut self.schedule.lock());
        self.inner.invoke(args)
    }

    /// Changes the polling period. A different value re-arms the timer;
    /// zero disarms it.
    pub fn set_period(&self, period: Duration) {
        let mut schedule = self.schedule.lock();
        if schedule.period == period {
            return;
        }
        schedule.period = period;
        self.rearm(&mut schedule);
    }

    fn rearm(&self, schedule: &mut Schedule) {
        // Disarm first so a failure while arming cannot leak the old timer.
        drop(schedule.timer.take());
        if schedule.torn_down {
            return;
        }

        let inner = self.inner.clone();
        schedule.timer = TimerHandle::arm(schedule.period, move || {
            drop(inner.invoke(C::Args::default()));
        });
        if schedule.timer.is_none() {
            debug!("polling disabled");
        }
    }
}

impl<C> Interval<C> {
    /// Disarms the timer for good.
    pub fn teardown(&self) {
        let mut schedule = self.schedule.lock();
        schedule.torn_down = true;
        drop(schedule.timer.take());
    }

    /// Current polling period.
    pub fn period(&self) -> Duration {
        self.schedule.lock().period
    }

    /// Whether a timer is currently armed.
    pub fn is_armed(&self) -> bool {
        self.schedule
            .lock()
            .timer
            .as_ref()
            .is_some_and(TimerHandle::is_armed)
    }

    /// The wrapped controller.
    pub fn inner(&self) -> &C {
        &self.inner
    }
}

impl<C> Drop for Interval<C> {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// `invoke` behaves like [`Interval::fetch`]: it re-arms the timer.
impl<C> Controller for Interval<C>
where
    C: Controller + Clone + 'static,
    C::Args: Default,
{
    type Args = C::Args;
    type Output = C::Output;
    type Error = C::Error;

    fn invoke(&self, args: C::Args) -> PendingHandle<C::Output, C::Error> {
        self.fetch(args)
    }

    fn reset(&self) {
        self.inner.reset();
    }

    fn state(&self) -> AsyncState<C::Output, C::Error> {
        self.inner.state()
    }

    fn subscribe(&self) -> watch::Receiver<AsyncState<C::Output, C::Error>> {
        self.inner.subscribe()
    }

    fn pending_count(&self) -> usize {
        self.inner.pending_count()
    }

    fn observe(&self, observer: Arc<dyn SettleObserver<C::Output, C::Error>>) {
        self.inner.observe(observer);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use tokio::time::sleep;

    use super::*;
    use crate::AsyncController;

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    fn counting() -> (Arc<AtomicU32>, AsyncController<(), u32, String>) {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let controller = AsyncController::new(move |()| {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            async move { Ok::<u32, String>(n) }
        });
        (calls, controller)
    }

    #[tokio::test(start_paused = true)]
    async fn fires_every_period() {
        let (calls, controller) = counting();
        let interval = Interval::new(controller, ms(100));
        assert!(interval.is_armed());

        sleep(ms(350)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn changing_period_rearms_without_double_firing() {
        let (calls, controller) = counting();
        let interval = Interval::new(controller, ms(100));

        sleep(ms(150)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // New ticks at t=200 and t=250; the old timer's t=200 tick must not fire.
        interval.set_period(ms(50));
        assert_eq!(interval.period(), ms(50));
        sleep(ms(110)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn same_period_keeps_the_running_timer() {
        let (calls, controller) = counting();
        let interval = Interval::new(controller, ms(100));

        sleep(ms(60)).await;
        interval.set_period(ms(100));
        sleep(ms(50)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1, "tick at t=100 kept its schedule");
    }

    #[tokio::test(start_paused = true)]
    async fn fetch_invokes_and_restarts_the_clock() {
        let (calls, controller) = counting();
        let interval = Interval::new(controller, ms(100));

        sleep(ms(50)).await;
        let handle = interval.fetch(());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        handle.await.unwrap();

        // The old t=100 tick is gone; the next one is at t=150.
        sleep(ms(70)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        sleep(ms(40)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_period_disables_polling() {
        let (calls, controller) = counting();
        let interval = Interval::new(controller, Duration::ZERO);
        assert!(!interval.is_armed());

        sleep(ms(1_000)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        interval.set_period(ms(100));
        assert!(interval.is_armed());
        sleep(ms(150)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        interval.set_period(Duration::ZERO);
        assert!(!interval.is_armed());
        sleep(ms(1_000)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn teardown_stops_all_timer_invocations() {
        let (calls, controller) = counting();
        let interval = Interval::new(controller, ms(100));

        sleep(ms(150)).await;
        interval.teardown();
        assert!(!interval.is_armed());

        sleep(ms(1_000)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // Manual fetches still run but never re-arm.
        interval.fetch(()).await.unwrap();
        assert!(!interval.is_armed());
        sleep(ms(1_000)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn drop_tears_down() {
        let (calls, controller) = counting();
        let interval = Interval::new(controller, ms(100));
        sleep(ms(150)).await;
        drop(interval);

        sleep(ms(1_000)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn timer_results_are_committed() {
        let (_calls, controller) = counting();
        let interval = Interval::new(controller, ms(100));

        let mut rx = interval.subscribe();
        sleep(ms(250)).await;
        rx.wait_for(|state| state.data == Some(2) && !state.loading)
            .await
            .unwrap();
    }
}
