//! Controller state: the observable projection and the ledger behind it.
//!
//! The [`Ledger`] is the single owner of `data`, `error` and the set of
//! outstanding invocations. Every mutation goes through one of four steps:
//! `issue`, `commit`, `abandon`, `reset`. `loading` is never stored; it is
//! derived from the pending set so the two cannot disagree.

use std::collections::BTreeSet;

/// Read-only projection of a controller's state, handed to the rendering layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AsyncState<T, E> {
    /// Last successfully resolved result.
    pub data: Option<T>,
    /// Last failure. Survives new invocations; cleared by a later success or a reset.
    pub error: Option<E>,
    /// True while at least one invocation is pending.
    pub loading: bool,
}

impl<T, E> AsyncState<T, E> {
    /// True when nothing has been loaded, nothing failed and nothing is pending.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.data.is_none() && self.error.is_none() && !self.loading
    }
}

impl<T, E> Default for AsyncState<T, E> {
    fn default() -> Self {
        Self {
            data: None,
            error: None,
            loading: false,
        }
    }
}

/// Mutable record owned by exactly one controller.
#[derive(Debug)]
pub(crate) struct Ledger<T, E> {
    data: Option<T>,
    error: Option<E>,
    pending: BTreeSet<u64>,
    last_seq: u64,
}

impl<T, E> Default for Ledger<T, E> {
    fn default() -> Self {
        Self {
            data: None,
            error: None,
            pending: BTreeSet::new(),
            last_seq: 0,
        }
    }
}

impl<T: Clone, E: Clone> Ledger<T, E> {
    /// Assigns the next sequence number and registers it as pending.
    pub(crate) fn issue(&mut self) -> u64 {
        self.last_seq += 1;
        self.pending.insert(self.last_seq);
        self.last_seq
    }

    /// Applies a settled outcome.
    ///
    /// Commits only if `seq` is still pending. Every pending invocation issued
    /// at or before `seq` is retired with it; later ones stay pending. Returns
    /// whether the outcome was applied.
    pub(crate) fn commit(&mut self, seq: u64, outcome: &Result<T, E>) -> bool {
        if !self.pending.contains(&seq) {
            return false;
        }
        self.pending = self.pending.split_off(&seq.saturating_add(1));
        match outcome {
            Ok(value) => {
                self.data = Some(value.clone());
                self.error = None;
            }
            Err(error) => {
                self.error = Some(error.clone());
            }
        }
        true
    }

    /// Drops a pending invocation that will never settle. Returns whether it was pending.
    pub(crate) fn abandon(&mut self, seq: u64) -> bool {
        self.pending.remove(&seq)
    }

    /// Clears everything, invalidating all outstanding invocations.
    /// Returns how many were outstanding.
    pub(crate) fn reset(&mut self) -> usize {
        let outstanding = self.pending.len();
        self.pending.clear();
        self.data = None;
        self.error = None;
        outstanding
    }

    pub(crate) fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub(crate) fn snapshot(&self) -> AsyncState<T, E> {
        AsyncState {
            data: self.data.clone(),
            error: self.error.clone(),
            loading: !self.pending.is_empty(),
        }
    }
}
