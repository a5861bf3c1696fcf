//! Explicit counting decorator for closures and functions.

use std::future::Future;

use super::{CallPublisher, InvocationGuard};
use crate::operation::OperationId;

/// Wrapper that counts every call of the wrapped operation.
///
/// Operations taking several arguments take them as a tuple.
///
/// # Example
///
/// ```ignore
/// let add = publisher.instrument("add", |(a, b): (i32, i32)| a + b);
/// assert_eq!(add.call((2, 3)), 5);
///
/// let fetch = publisher.instrument("fetch", |id: u64| async move { load(id).await });
/// let row = fetch.call_async(7).await?;
/// ```
pub struct Counted<F> {
    operation: OperationId,
    publisher: CallPublisher,
    inner: F,
}

impl<F> Counted<F> {
    pub fn new(operation: OperationId, publisher: CallPublisher, inner: F) -> Self {
        Self {
            operation,
            publisher,
            inner,
        }
    }

    pub fn operation(&self) -> &OperationId {
        &self.operation
    }

    /// Get a reference to the wrapped operation.
    pub fn inner(&self) -> &F {
        &self.inner
    }

    /// Consume the wrapper and return the wrapped operation.
    pub fn into_inner(self) -> F {
        self.inner
    }

    /// Call the wrapped operation and count the call.
    pub fn call<A, R>(&self, args: A) -> R
    where
        F: Fn(A) -> R,
    {
        let _guard = self.guard();
        (self.inner)(args)
    }

    /// Call a wrapped operation returning a future; the call is counted when
    /// the future completes or is dropped.
    pub async fn call_async<A, Fut>(&self, args: A) -> Fut::Output
    where
        F: Fn(A) -> Fut,
        Fut: Future,
    {
        let _guard = self.guard();
        (self.inner)(args).await
    }

    /// Turn the wrapper into a plain closure with the inner signature.
    pub fn into_fn<A, R>(self) -> impl Fn(A) -> R
    where
        F: Fn(A) -> R,
    {
        move |args: A| -> R { self.call(args) }
    }

    fn guard(&self) -> InvocationGuard {
        InvocationGuard::new(self.publisher.clone(), self.operation.clone())
    }
}

impl<F: Clone> Clone for Counted<F> {
    fn clone(&self) -> Self {
        Self {
            operation: self.operation.clone(),
            publisher: self.publisher.clone(),
            inner: self.inner.clone(),
        }
    }
}
