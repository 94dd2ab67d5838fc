//! Run-once-on-activation policy.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::watch;
use tracing::trace;

use crate::controller::PendingHandle;
use crate::state::AsyncState;
use crate::traits::{Controller, SettleObserver};

/// Invokes the wrapped controller with default arguments the first time it is
/// activated. Later activations are no-ops for the lifetime of the wrapper.
#[derive(Debug)]
pub struct OnMount<C> {
    inner: C,
    activated: AtomicBool,
}

impl<C: Controller> OnMount<C> {
    /// Wraps `inner` without activating it.
    pub fn new(inner: C) -> Self {
        Self {
            inner,
            activated: AtomicBool::new(false),
        }
    }

    /// Signals activation. Returns the handle of the invocation on the first
    /// call and `None` afterwards.
    pub fn activate(&self) -> Option<PendingHandle<C::Output, C::Error>>
    where
        C::Args: Default,
    {
        if self.activated.swap(true, Ordering::AcqRel) {
            trace!("already activated");
            return None;
        }
        Some(self.inner.invoke(C::Args::default()))
    }

    /// Whether `activate` has been called.
    pub fn is_activated(&self) -> bool {
        self.activated.load(Ordering::Acquire)
    }

    /// The wrapped controller.
    pub fn inner(&self) -> &C {
        &self.inner
    }
}

impl<C: Controller> Controller for OnMount<C> {
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
