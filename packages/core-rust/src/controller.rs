//! The base asynchronous-operation controller.
//!
//! [`AsyncController`] wraps an [`Operation`] and tracks its lifecycle
//! (idle -> pending -> settled). Every `invoke` runs the operation on its own
//! Tokio task, so it always runs to completion, and then hands the outcome to
//! the commit step. Outcomes are applied in issuance order: a settlement is
//! committed only while its invocation is still pending, and committing
//! retires every earlier invocation. An earlier-issued call that settles late
//! is therefore ignored, as is anything issued before a `reset`.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use parking_lot::{Mutex, RwLock};
use tokio::sync::{oneshot, watch};
use tracing::debug;

use crate::operation::{InvokeError, Operation};
use crate::state::{AsyncState, Ledger};
use crate::traits::{Controller, SettleObserver};

// ---------------------------------------------------------------------------
// PendingHandle
// ---------------------------------------------------------------------------

/// Handle to one invocation.
///
/// Resolves to that invocation's own outcome, whether or not it was committed.
/// Dropping the handle does not cancel the invocation.
pub struct PendingHandle<T, E> {
    seq: u64,
    rx: oneshot::Receiver<Result<T, E>>,
}

impl<T, E> PendingHandle<T, E> {
    /// Issuance sequence number of this invocation.
    #[must_use]
    pub fn seq(&self) -> u64 {
        self.seq
    }
}

impl<T, E> fmt::Debug for PendingHandle<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingHandle").field("seq", &self.seq).finish()
    }
}

impl<T, E> Future for PendingHandle<T, E> {
    type Output = Result<T, InvokeError<E>>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let seq = self.seq;
        Pin::new(&mut self.rx).poll(cx).map(|received| match received {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(error)) => Err(InvokeError::Failed(error)),
            Err(_) => Err(InvokeError::Dropped { seq }),
        })
    }
}

// ---------------------------------------------------------------------------
// AsyncController
// ---------------------------------------------------------------------------

struct Shared<A, T, E> {
    operation: Box<dyn Operation<A, T, E>>,
    ledger: Mutex<Ledger<T, E>>,
    state_tx: watch::Sender<AsyncState<T, E>>,
    observers: RwLock<Vec<Arc<dyn SettleObserver<T, E>>>>,
}

impl<A, T, E> Shared<A, T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    fn observers(&self) -> Vec<Arc<dyn SettleObserver<T, E>>> {
        self.observers.read().clone()
    }

    fn settle(&self, seq: u64, outcome: &Result<T, E>) {
        let committed = {
            let mut ledger = self.ledger.lock();
            let committed = ledger.commit(seq, outcome);
            if committed {
                self.state_tx.send_replace(ledger.snapshot());
            }
            committed
        };

        if !committed {
            debug!(seq, "stale settlement ignored");
            return;
        }

        debug!(seq, ok = outcome.is_ok(), "invocation committed");
        for observer in self.observers() {
            observer.on_commit(seq, outcome);
        }
    }

    fn abandon(&self, seq: u64) {
        let mut ledger = self.ledger.lock();
        if ledger.abandon(seq) {
            self.state_tx.send_replace(ledger.snapshot());
            debug!(seq, "invocation abandoned before settling");
        }
    }
}

/// Retires an invocation that never reached the commit step, so `loading`
/// cannot stay stuck when the operation panics or its task is aborted.
struct SettleGuard<A, T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    shared: Arc<Shared<A, T, E>>,
    seq: u64,
    settled: bool,
}

impl<A, T, E> Drop for SettleGuard<A, T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    fn drop(&mut self) {
        if !self.settled {
            self.shared.abandon(self.seq);
        }
    }
}

/// Tracks pending/settled state for one logical operation.
///
/// Cheap to clone; clones share the same state. Each consumer should own its
/// own controller: nothing is shared across instances.
pub struct AsyncController<A, T, E> {
    shared: Arc<Shared<A, T, E>>,
}

impl<A, T, E> Clone for AsyncController<A, T, E> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<A, T, E> fmt::Debug for AsyncController<A, T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncController").finish_non_exhaustive()
    }
}

impl<A, T, E> AsyncController<A, T, E>
where
    A: Send + 'static,
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    /// Creates an idle controller around `operation`.
    pub fn new(operation: impl Operation<A, T, E> + 'static) -> Self {
        let (state_tx, _rx) = watch::channel(AsyncState::default());
        Self {
            shared: Arc::new(Shared {
                operation: Box::new(operation),
                ledger: Mutex::new(Ledger::default()),
                state_tx,
                observers: RwLock::new(Vec::new()),
            }),
        }
    }
}

impl<A, T, E> Controller for AsyncController<A, T, E>
where
    A: Send + 'static,
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    type Args = A;
    type Output = T;
    type Error = E;

    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    fn invoke(&self, args: A) -> PendingHandle<T, E> {
        let seq = {
            let mut ledger = self.shared.ledger.lock();
            let seq = ledger.issue();
            self.shared.state_tx.send_replace(ledger.snapshot());
            seq
        };
        debug!(seq, "invocation accepted");

        // Armed before the operation runs, so a panic while building its
        // future still retires the sequence.
        let mut guard = SettleGuard {
            shared: Arc::clone(&self.shared),
            seq,
            settled: false,
        };
        let future = self.shared.operation.call(args);
        let (tx, rx) = oneshot::channel();

        tokio::spawn(async move {
            let outcome = future.await;
            guard.settled = true;
            guard.shared.settle(seq, &outcome);
            // The invoker may have dropped its handle.
            let _ = tx.send(outcome);
        });

        PendingHandle { seq, rx }
    }

    fn reset(&self) {
        let outstanding = {
            let mut ledger = self.shared.ledger.lock();
            let outstanding = ledger.reset();
            self.shared.state_tx.send_replace(ledger.snapshot());
            outstanding
        };
        debug!(outstanding, "controller reset");

        for observer in self.shared.observers() {
            observer.on_reset();
        }
    }

    fn state(&self) -> AsyncState<T, E> {
        self.shared.ledger.lock().snapshot()
    }

    fn subscribe(&self) -> watch::Receiver<AsyncState<T, E>> {
        self.shared.state_tx.subscribe()
    }

    fn pending_count(&self) -> usize {
        self.shared.ledger.lock().pending_count()
    }

    fn observe(&self, observer: Arc<dyn SettleObserver<T, E>>) {
        self.shared.observers.write().push(observer);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
