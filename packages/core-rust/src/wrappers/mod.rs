//! Policy wrappers around a [`Controller`](crate::Controller).
//!
//! Each wrapper adds one policy and delegates everything else to the
//! controller it wraps, so they compose as decorators:
//!
//! - [`OnMount`]: invoke exactly once on activation
//! - [`OnChange`]: invoke when the argument value changes, replay via `refetch`
//! - [`Catcher`]: run a side-effect handler for every committed failure
//! - [`Interval`]: re-invoke on a fixed period

pub mod catcher;
pub mod interval;
pub mod on_change;
pub mod on_mount;

pub use catcher::Catcher;
pub use interval::Interval;
pub use on_change::OnChange;
pub use on_mount::OnMount;
