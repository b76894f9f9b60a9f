//! Awaitable handle for work submitted through [`DeferredQueue::defer`](crate::DeferredQueue::defer).

use std::{
    pin::Pin,
    task::{Context, Poll},
};

use futures::channel::oneshot::Receiver;
use pin_project_lite::pin_project;

use crate::error::{Error, Result};

pin_project! {
    /// A future resolving to the value returned by a deferred callback.
    ///
    /// Dropping a `Deferred` does not withdraw the callback; it still runs with
    /// its batch and its result is discarded.
    #[must_use = "futures do nothing unless polled or .awaited"]
    pub struct Deferred<T> {
        #[pin]
        receiver: Receiver<Result<T>>,
        position: usize,
    }
}

impl<T> Deferred<T> {
    pub(crate) fn new(receiver: Receiver<Result<T>>, position: usize) -> Self {
        Deferred { receiver, position }
    }

    /// Position of the callback in its batch, as returned by `submit`.
    pub fn position(&self) -> usize {
        self.position
    }
}

impl<T> Future for Deferred<T> {
    type Output = Result<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();
        match this.receiver.poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(_)) => Poll::Ready(Err(Error::Canceled)),
            Poll::Pending => Poll::Pending,
        }
    }
}
