//! Single-threaded futures for asynchronous producers.
//!
//! A [`Promise`] is the writing half held by whoever completes the work; the [`Task`] is the
//! awaitable half handed to the caller. Continuations are spawned on a
//! [`futures::executor::LocalPool`] that the render thread drains between frames, so
//! completion never runs on another thread.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::FutureExt as _;
use futures::channel::oneshot;

use crate::foundation::error::{VizError, VizResult};

pub use futures::executor::{LocalPool, LocalSpawner};

/// Completes the paired [`Task`]. Dropping it unsettled cancels the task.
pub struct Promise<T> {
    tx: oneshot::Sender<VizResult<T>>,
}

/// Result of asynchronous work, resolved through its [`Promise`].
pub struct Task<T> {
    rx: oneshot::Receiver<VizResult<T>>,
}

pub fn promise<T>() -> (Promise<T>, Task<T>) {
    let (tx, rx) = oneshot::channel();
    (Promise { tx }, Task { rx })
}

impl<T> Promise<T> {
    pub fn resolve(self, value: T) {
        // A dropped task means nobody is waiting.
        let _ = self.tx.send(Ok(value));
    }

    pub fn reject(self, err: VizError) {
        let _ = self.tx.send(Err(err));
    }

    pub fn is_canceled(&self) -> bool {
        self.tx.is_canceled()
    }
}

impl<T> Task<T> {
    pub fn ready(value: T) -> Self {
        let (p, t) = promise();
        p.resolve(value);
        t
    }

    pub fn failed(err: VizError) -> Self {
        let (p, t) = promise();
        p.reject(err);
        t
    }

    /// Take the result if it is already available.
    pub fn try_take(&mut self) -> Option<VizResult<T>> {
        match self.rx.try_recv() {
            Ok(r) => r,
            Err(oneshot::Canceled) => Some(Err(VizError::TaskCancelled)),
        }
    }
}

impl<T> Future for Task<T> {
    type Output = VizResult<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.rx.poll_unpin(cx).map(|r| match r {
            Ok(r) => r,
            Err(oneshot::Canceled) => Err(VizError::TaskCancelled),
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/runtime/task.rs"]
mod tests;
