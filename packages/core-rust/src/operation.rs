//! Operations wrapped by a controller, and the error an awaited invocation yields.

use std::future::Future;

use futures_util::future::BoxFuture;

/// An asynchronous unit of work orchestrated by a controller.
///
/// The controller holds no expectations about idempotence or side effects;
/// the operation is simply re-invoked with a fresh argument value on each call.
/// Several arguments are passed as a tuple, none as `()`.
///
/// Blanket-implemented for closures returning a `Send` future, so callers
/// rarely name this trait directly.
pub trait Operation<A, T, E>: Send + Sync {
    /// Starts one invocation with the given arguments.
    fn call(&self, args: A) -> BoxFuture<'static, Result<T, E>>;
}

impl<A, T, E, F, Fut> Operation<A, T, E> for F
where
    F: Fn(A) -> Fut + Send + Sync,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
{
    fn call(&self, args: A) -> BoxFuture<'static, Result<T, E>> {
        Box::pin(self(args))
    }
}

/// Errors returned to the caller awaiting a [`PendingHandle`](crate::PendingHandle).
///
/// The controller's `error` slot is the authoritative failure surface; this
/// type only reports what happened to the caller's own invocation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvokeError<E> {
    /// The operation rejected.
    #[error("operation failed: {0}")]
    Failed(E),
    /// The invocation task ended without settling (operation panicked or
    /// the runtime shut down).
    #[error("invocation {seq} ended before settling")]
    Dropped { seq: u64 },
}

impl<E> InvokeError<E> {
    /// Returns the operation's failure value, if the operation rejected.
    #[must_use]
    pub fn failure(&self) -> Option<&E> {
        match self {
            Self::Failed(e) => Some(e),
            Self::Dropped { .. } => None,
        }
    }

    /// Consumes the error, returning the operation's failure value.
    #[must_use]
    pub fn into_failure(self) -> Option<E> {
        match self {
            Self::Failed(e) => Some(e),
            Self::Dropped { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn double(n: u32) -> Result<u32, String> {
        Ok(n * 2)
    }

    #[tokio::test]
    async fn closures_are_operations() {
        let op = |n: u32| double(n);
        assert_eq!(Operation::call(&op, 21).await, Ok(42));
    }

    #[tokio::test]
    async fn tuple_arguments() {
        let op = |(a, b): (i32, i32)| async move {
            if b == 0 {
                Err("division by zero".to_string())
            } else {
                Ok(a / b)
            }
        };
        assert_eq!(Operation::call(&op, (9, 3)).await, Ok(3));
        assert_eq!(
            Operation::call(&op, (1, 0)).await,
            Err("division by zero".to_string())
        );
    }

    #[test]
    fn invoke_error_accessors() {
        let failed: InvokeError<&str> = InvokeError::Failed("boom");
        assert_eq!(failed.failure(), Some(&"boom"));
        assert_eq!(failed.to_string(), "operation failed: boom");
        assert_eq!(failed.into_failure(), Some("boom"));

        let dropped: InvokeError<&str> = InvokeError::Dropped { seq: 7 };
        assert!(dropped.failure().is_none());
        assert_eq!(dropped.to_string(), "invocation 7 ended before settling");
    }
}
