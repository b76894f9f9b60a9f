//! A per-thread default queue, for code that cannot be handed a queue explicitly.
//!
//! Queues are single-threaded, so "global" means global to the current thread.
//! Install a queue once near the top of the thread, then call [`next_tick`]
//! from anywhere on it.
//!
//! ```
//! # use std::rc::Rc;
//! # use nexttick::{DeferredQueue, EventLoop, global};
//! let event_loop = Rc::new(EventLoop::new());
//! global::install(DeferredQueue::new(Rc::clone(&event_loop)));
//!
//! assert_eq!(global::next_tick(|| println!("later")), Ok(1));
//! event_loop.run_until_idle();
//! ```

use std::{cell::RefCell, rc::Rc};

use tracing::debug;

use crate::{
    error::{Error, Result},
    queue::{NextTick, Submit},
};

thread_local! {
    static INSTALLED: RefCell<Option<NextTick>> = const { RefCell::new(None) };
}

/// Makes `queue` this thread's default queue and returns the one it replaces.
pub fn install<Q: Submit + 'static>(queue: Q) -> Option<NextTick> {
    debug!("installing thread default queue");
    INSTALLED.with(|installed| installed.borrow_mut().replace(Rc::new(queue)))
}

/// Removes and returns this thread's default queue.
pub fn uninstall() -> Option<NextTick> {
    INSTALLED.with(|installed| installed.borrow_mut().take())
}

/// Returns a handle to this thread's default queue.
///
/// # Errors
///
/// Returns [`Error::NotInstalled`] if no queue has been installed.
pub fn current() -> Result<NextTick> {
    INSTALLED.with(|installed| installed.borrow().clone().ok_or(Error::NotInstalled))
}

/// Schedules `f` on this thread's default queue.
///
/// # Errors
///
/// Returns [`Error::NotInstalled`] if no queue has been installed.
pub fn next_tick<F>(f: F) -> Result<usize>
where
    F: FnOnce() + 'static,
{
    // Release the thread-local before submitting; arming may call back into user code.
    let queue = current()?;
    Ok(queue.next_tick(f))
}
