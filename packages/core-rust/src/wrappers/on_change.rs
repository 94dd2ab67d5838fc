//! Run-on-change policy with argument caching.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::trace;

use crate::controller::PendingHandle;
use crate::state::AsyncState;
use crate::traits::{Controller, SettleObserver};

/// Invokes the wrapped controller whenever the observed argument value
/// differs from the last one it was invoked with.
///
/// The cache holds the arguments of the last invocation issued through this
/// wrapper (via [`OnChange::evaluate`] or [`Controller::invoke`]) and is
/// cleared by `reset`. Equality is the argument type's `PartialEq`.
///
/// The cache lock is held while the invocation is issued, so under concurrent
/// callers the cache always matches the last-issued invocation.
pub struct OnChange<C: Controller> {
    inner: C,
    cache: Mutex<Option<C::Args>>,
}

impl<C> OnChange<C>
where
    C: Controller,
    C::Args: Clone + PartialEq,
{
    /// Wraps `inner` with an empty cache.
    pub fn new(inner: C) -> Self {
        Self {
            inner,
            cache: Mutex::new(None),
        }
    }

    /// Observes a new argument value.
    ///
    /// `None` is ignored. A value equal to the cached one is suppressed.
    /// Otherwise the cache is updated and an invocation is issued.
    pub fn evaluate(&self, args: Option<C::Args>) -> Option<PendingHandle<C::Output, C::Error>> {
        let args = args?;
        let mut cache = self.cache.lock();
        if cache.as_ref() == Some(&args) {
            trace!("arguments unchanged, invocation suppressed");
            return None;
        }
        Some(self.issue(&mut cache, args))
    }

    /// Re-runs the operation with the cached arguments, or the default value
    /// when nothing was cached yet. Like every accepted invocation, this
    /// records its arguments in the cache.
    pub fn refetch(&self) -> PendingHandle<C::Output, C::Error>
    where
        C::Args: Default,
    {
        let mut cache = self.cache.lock();
        let args = cache.clone().unwrap_or_default();
        self.issue(&mut cache, args)
    }

    /// The cached argument value.
    pub fn cache(&self) -> Option<C::Args> {
        self.cache.lock().clone()
    }

    /// The wrapped controller.
    pub fn inner(&self) -> &C {
        &self.inner
    }

    fn issue(
        &self,
        cache: &mut Option<C::Args>,
        args: C::Args,
    ) -> PendingHandle<C::Output, C::Error> {
        *cache = Some(args.clone());
        self.inner.invoke(args)
    }
}

impl<C> Controller for OnChange<C>
where
    C: Controller,
    C::Args: Clone + PartialEq,
{
    type Args = C::Args;
    type Output = C::Output;
    type Error = C::Error;

    fn invoke(&self, args: C::Args) -> PendingHandle<C::Output, C::Error> {
        self.issue(&mut self.cache.lock(), args)
    }

    fn reset(&self) {
        self.cache.lock().take();
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

    use super::*;
    use crate::AsyncController;

    type Sum = AsyncController<Vec<i32>, i32, String>;

    fn summing() -> (Arc<AtomicU32>, OnChange<Sum>) {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let controller = AsyncController::new(move |args: Vec<i32>| {
            counter.fetch_add(1, Ordering::SeqCst);
            async move { Ok::<i32, String>(args.iter().sum()) }
        });
        (calls, OnChange::new(controller))
    }

    #[tokio::test]
    async fn equal_arguments_are_suppressed() {
        let (calls, on_change) = summing();

        on_change.evaluate(Some(vec![1, 2])).unwrap().await.unwrap();
        assert!(on_change.evaluate(Some(vec![1, 2])).is_none());
        on_change.evaluate(Some(vec![1, 3])).unwrap().await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(on_change.cache(), Some(vec![1, 3]));
        assert_eq!(on_change.state().data, Some(4));
    }

    #[tokio::test]
    async fn absent_arguments_do_nothing() {
        let (calls, on_change) = summing();
        assert!(on_change.evaluate(None).is_none());
        assert!(on_change.cache().is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn refetch_replays_cached_arguments() {
        let (calls, on_change) = summing();
        on_change.evaluate(Some(vec![5, 5])).unwrap().await.unwrap();

        assert_eq!(on_change.refetch().await, Ok(10));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(on_change.cache(), Some(vec![5, 5]));
    }

    #[tokio::test]
    async fn refetch_without_cache_uses_default_arguments() {
        let (calls, on_change) = summing();
        assert_eq!(on_change.refetch().await, Ok(0));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(on_change.cache(), Some(Vec::new()));
        assert!(on_change.evaluate(Some(Vec::new())).is_none());
    }

    #[tokio::test]
    async fn reset_clears_cache() {
        let (calls, on_change) = summing();
        on_change.evaluate(Some(vec![2])).unwrap().await.unwrap();

        on_change.reset();
        assert!(on_change.cache().is_none());
        assert!(on_change.state().is_idle());

        // Same arguments fire again once the cache is gone.
        on_change.evaluate(Some(vec![2])).unwrap().await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn direct_invoke_updates_cache() {
        let (calls, on_change) = summing();
        on_change.invoke(vec![7]).await.unwrap();
        assert!(on_change.evaluate(Some(vec![7])).is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_evaluations_leave_cache_matching_last_issued() {
        let (_calls, on_change) = summing();
        let on_change = Arc::new(on_change);

        let tasks: Vec<_> = (0..32)
            .map(|i| {
                let on_change = Arc::clone(&on_change);
                tokio::spawn(async move {
                    let handle = on_change.evaluate(Some(vec![i])).unwrap();
                    (i, handle.seq())
                })
            })
            .collect();

        let mut issued = Vec::new();
        for task in tasks {
            issued.push(task.await.unwrap());
        }
        let (last, _) = issued.iter().max_by_key(|(_, seq)| *seq).copied().unwrap();
        assert_eq!(on_change.cache(), Some(vec![last]));
    }
}
