//! `Settle` Core: asynchronous-operation controller and composable policies.
//!
//! An [`AsyncController`] wraps a user-supplied async [`Operation`] and exposes
//! its lifecycle (`data`, `error`, `loading`) to a rendering layer. Policies
//! are layered on as decorators implementing the same [`Controller`] trait:
//! [`OnMount`], [`OnChange`], [`Catcher`] and [`Interval`].

pub mod controller;
pub mod operation;
pub mod state;
pub mod timer;
pub mod traits;
pub mod wrappers;

pub use controller::{AsyncController, PendingHandle};
pub use operation::{InvokeError, Operation};
pub use state::AsyncState;
pub use timer::TimerHandle;
pub use traits::{Controller, SettleObserver};
pub use wrappers::{Catcher, Interval, OnChange, OnMount};
