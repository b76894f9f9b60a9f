//! Error types reported by the queue and its integration helpers.

use std::any::Any;

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by the fallible parts of the public API.
///
/// Submitting work never fails. Failures of the callbacks themselves happen long
/// after `submit` returned, so they are not represented here; they are delivered
/// to the queue's failure hook as a [`CallbackFailure`].
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// [`global::next_tick`](crate::global::next_tick) was called on a thread
    /// without an installed queue.
    #[error("no deferral queue is installed on this thread")]
    NotInstalled,

    /// No queue is registered under the requested name.
    #[error("no deferral queue registered under `{0}`")]
    UnknownQueue(String),

    /// A queue is already registered under this name.
    #[error("a deferral queue is already registered under `{0}`")]
    DuplicateQueue(String),

    /// The callback behind a [`Deferred`](crate::Deferred) panicked.
    #[error("deferred callback panicked: {0}")]
    Panicked(String),

    /// The callback behind a [`Deferred`](crate::Deferred) was dropped before it
    /// could run, usually because the host dropped the flush without running it.
    #[error("deferred callback was dropped before it ran")]
    Canceled,
}

/// A callback that panicked while its batch was being flushed.
///
/// The failing entry is not retried. The rest of the batch still runs.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("callback #{seq} panicked during flush {batch}: {message}")]
pub struct CallbackFailure {
    /// Submission sequence number of the failing entry.
    pub seq: u64,

    /// Number of the flush (1-based) that invoked the entry.
    pub batch: u64,

    /// Panic payload rendered as text.
    pub message: String,
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Box<dyn Any>".to_string()
    }
}
