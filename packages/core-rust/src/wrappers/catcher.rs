//! Error-observing policy.

use std::sync::Arc;

use tokio::sync::watch;

use crate::controller::PendingHandle;
use crate::state::AsyncState;
use crate::traits::{Controller, SettleObserver};

/// Runs a side-effect handler once for every failure the wrapped controller
/// commits.
///
/// The handler fires per failure occurrence, not per observation of the
/// `error` slot: reading the state never re-triggers it, stale failures that
/// lose the ordering race are never reported, and a later success does not
/// replay an old failure. The handler must not panic.
pub struct Catcher<C> {
    inner: C,
}

struct ErrorHook<F>(F);

impl<T, E, F> SettleObserver<T, E> for ErrorHook<F>
where
    F: Fn(&E) + Send + Sync,
{
    fn on_commit(&self, _seq: u64, outcome: &Result<T, E>) {
        if let Err(error) = outcome {
            (self.0)(error);
        }
    }
}

impl<C: Controller> Catcher<C> {
    /// Wraps `inner`, registering `handler` for its committed failures.
    pub fn new<F>(inner: C, handler: F) -> Self
    where
        F: Fn(&C::Error) + Send + Sync + 'static,
    {
        inner.observe(Arc::new(ErrorHook(handler)));
        Self { inner }
    }

    /// The wrapped controller.
    pub fn inner(&self) -> &C {
        &self.inner
    }
}

impl<C: Controller> Controller for Catcher<C> {
    type Args = C::Args;
    type Output = C::Output;
    type Error = C::Error;

    fn invoke(&self, args: C::Args) -> PendingHandle<C::Output, C::Error> {
        self.inner.invoke(args)
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
