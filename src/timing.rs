//! Timer support for executor-backed hosts.
//!
//! `futures` has no timer of its own, so [`Delay`] parks a helper thread from a
//! small shared thread pool that wakes the task once the deadline has passed.
//! This keeps the pool host independent of any specific async runtime.
//!
//! Each waiting `Delay` occupies one pool thread while it sleeps. With more
//! pending delays than pool threads, a short delay queued behind long ones is
//! woken late, by up to the time the earlier sleepers still have to wait. The
//! queue only ever arms zero delays, which resolve on their first poll without
//! touching the pool.

use std::{
    pin::Pin,
    sync::OnceLock,
    task::{Context, Poll},
    time::{Duration, Instant},
};

use futures::executor::{ThreadPool, ThreadPoolBuilder};
use pin_project_lite::pin_project;
use tracing::{trace, warn};

static THREAD_POOL: OnceLock<Option<ThreadPool>> = OnceLock::new();

fn thread_pool() -> Option<&'static ThreadPool> {
    THREAD_POOL
        .get_or_init(|| {
            ThreadPoolBuilder::new()
                .pool_size(2)
                .name_prefix("nexttick-timer-")
                .create()
                .map_err(|err| warn!(%err, "timer thread pool unavailable, delays will spin"))
                .ok()
        })
        .as_ref()
}

pin_project! {
    /// A future that begins polling its inner future only after a deadline.
    ///
    /// The deadline is computed when the `Delay` is created. A zero delay polls the
    /// inner future on the first poll.
    #[must_use = "futures do nothing unless polled or .awaited"]
    pub struct Delay<F> {
        #[pin]
        future: F,
        deadline: Instant,
        waiting: bool,
    }
}

impl<F> Delay<F> {
    /// Creates a `Delay` that holds `future` back for `delay`.
    pub fn new(future: F, delay: Duration) -> Self {
        Delay {
            future,
            deadline: Instant::now() + delay,
            waiting: false,
        }
    }

    // Returns `true` while the deadline has not been reached.
    fn handle_delay(self: Pin<&mut Self>, cx: &mut Context<'_>) -> bool {
        let proj = self.project();
        let now = Instant::now();
        if now >= *proj.deadline {
            *proj.waiting = false;
            return false;
        }
        if *proj.waiting {
            return true;
        }

        let waker = cx.waker().clone();
        let Some(pool) = thread_pool() else {
            waker.wake();
            return true;
        };
        let deadline = *proj.deadline;
        trace!(remaining = ?(deadline - now), "scheduling delay wake-up");
        pool.spawn_ok(async move {
            std::thread::sleep(deadline.saturating_duration_since(Instant::now()));
            waker.wake();
        });
        *proj.waiting = true;
        true
    }
}

impl<F> Future for Delay<F>
where
    F: Future,
{
    type Output = F::Output;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if self.as_mut().handle_delay(cx) {
            return Poll::Pending;
        }
        self.project().future.poll(cx)
    }
}
