use std::sync::Arc;

use tokio::sync::watch;

use crate::controller::PendingHandle;
use crate::state::AsyncState;

/// Notification hook for committed outcomes and resets.
///
/// Observers run after the new state is published and before the invoker's
/// [`PendingHandle`] resolves. They are called outside the state lock, so they
/// may read the controller freely. They must not panic.
///
/// Used as `Arc<dyn SettleObserver<T, E>>`.
pub trait SettleObserver<T, E>: Send + Sync {
    /// Called after the outcome of invocation `seq` was committed.
    /// Stale settlements are never reported.
    fn on_commit(&self, _seq: u64, _outcome: &Result<T, E>) {}

    /// Called after the controller was reset.
    fn on_reset(&self) {}
}

/// The capability set shared by the base controller and every policy wrapper.
///
/// Wrappers implement this trait by delegating to the controller they wrap,
/// so policies nest freely: `Catcher<OnMount<AsyncController<..>>>`.
pub trait Controller: Send + Sync {
    /// Argument value passed to the operation.
    type Args: Send + 'static;
    /// Successful result of the operation.
    type Output: Clone + Send + Sync + 'static;
    /// Failure value of the operation.
    type Error: Clone + Send + Sync + 'static;

    /// Starts an invocation immediately. The returned handle may be awaited
    /// for this invocation's own outcome or dropped; either way the outcome is
    /// committed into the controller's state.
    fn invoke(&self, args: Self::Args) -> PendingHandle<Self::Output, Self::Error>;

    /// Clears `data`, `error` and `loading`, and invalidates every
    /// invocation issued so far.
    fn reset(&self);

    /// Current state projection.
    fn state(&self) -> AsyncState<Self::Output, Self::Error>;

    /// Change feed of the state projection for a rendering layer.
    fn subscribe(&self) -> watch::Receiver<AsyncState<Self::Output, Self::Error>>;

    /// Number of invocations issued and not yet committed, superseded or reset.
    fn pending_count(&self) -> usize;

    /// Registers an observer for commits and resets.
    fn observe(&self, observer: Arc<dyn SettleObserver<Self::Output, Self::Error>>);
}
