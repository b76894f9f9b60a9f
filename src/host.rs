//! The deferred-execution primitive a [`DeferredQueue`](crate::DeferredQueue) relies on.
//!
//! A host is whatever drives the current thread: a hand-rolled event loop, a
//! local executor, or a runtime's `LocalSet`. The queue never runs its own
//! flushes. It asks the host to call it back once the current synchronous turn
//! is over, preferring an "immediate" callback and falling back to a zero-delay
//! timer when the host has none.

use std::{fmt, rc::Rc, time::Duration};

/// A unit of work handed to a [`Host`].
pub type Job = Box<dyn FnOnce() + 'static>;

/// Which host facility the queue asks for when it arms a flush.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Primitive {
    /// Ask for an immediate callback, falling back to a zero-delay timer when the
    /// host does not support immediates.
    #[default]
    Immediate,

    /// Always use a zero-delay timer.
    Timer,
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Primitive::Immediate => write!(f, "immediate"),
            Primitive::Timer => write!(f, "timer"),
        }
    }
}

/// A single-threaded environment able to run a job after the current
/// synchronous turn.
///
/// Implementations must never run the job from inside the call that received
/// it. Jobs handed to the host must each be run at most once. A host that cannot
/// take a job hands it back as `Err(job)`; the queue then disarms and retries on
/// the next submission.
pub trait Host {
    /// Schedules `job` to run as soon as the current turn completes.
    ///
    /// Hosts without an immediate-callback facility keep the default, which hands
    /// the job back so the caller can fall back to [`Host::set_timeout`].
    fn set_immediate(&self, job: Job) -> Result<(), Job> {
        Err(job)
    }

    /// Schedules `job` to run once `delay` has elapsed, never within the
    /// current turn even when `delay` is zero.
    fn set_timeout(&self, job: Job, delay: Duration) -> Result<(), Job>;
}

impl<H: Host + ?Sized> Host for Rc<H> {
    fn set_immediate(&self, job: Job) -> Result<(), Job> {
        (**self).set_immediate(job)
    }

    fn set_timeout(&self, job: Job, delay: Duration) -> Result<(), Job> {
        (**self).set_timeout(job, delay)
    }
}

impl<H: Host + ?Sized> Host for &H {
    fn set_immediate(&self, job: Job) -> Result<(), Job> {
        (**self).set_immediate(job)
    }

    fn set_timeout(&self, job: Job, delay: Duration) -> Result<(), Job> {
        (**self).set_timeout(job, delay)
    }
}

/// Hands `job` to `host` using the preferred primitive and reports which
/// primitive accepted it. Returns the job if neither did.
pub(crate) fn defer(host: &impl Host, job: Job, preferred: Primitive) -> Result<Primitive, Job> {
    let job = match preferred {
        Primitive::Immediate => match host.set_immediate(job) {
            Ok(()) => return Ok(Primitive::Immediate),
            Err(job) => job,
        },
        Primitive::Timer => job,
    };
    host.set_timeout(job, Duration::ZERO)?;
    Ok(Primitive::Timer)
}
