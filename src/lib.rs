//! Batching "next tick" deferral for single-threaded hosts.
//!
//! `nexttick` runs callbacks as soon as possible after the current synchronous
//! turn has finished, without running them from inside the code that requested
//! them. All callbacks requested during one turn are collected into one batch
//! and flushed together, in submission order, by a single callback from the
//! host.
//!
//! The crate does not own a runtime. A [`Host`] supplies the
//! deferred-execution primitive (an immediate callback, or a zero-delay timer
//! as a fallback), which makes it usable from a hand-rolled loop as well as
//! from an executor:
//! - [`EventLoop`] is a minimal loop driven explicitly by its owner
//! - [`LocalPoolHost`] runs flushes as tasks on a `futures` `LocalPool`
//! - `TokioHost` (feature `tokio`) runs them on a tokio `LocalSet`
//!
//! Besides [`DeferredQueue`] itself, the [`global`] and [`registry`] modules
//! expose a queue to code that cannot be handed one explicitly.
//!
//! ```
//! # use std::{cell::RefCell, rc::Rc};
//! # use nexttick::{DeferredQueue, EventLoop};
//! let event_loop = Rc::new(EventLoop::new());
//! let queue = DeferredQueue::new(Rc::clone(&event_loop));
//! let log = Rc::new(RefCell::new(Vec::new()));
//!
//! let log_cl = Rc::clone(&log);
//! assert_eq!(queue.submit(move || log_cl.borrow_mut().push(2)), 1);
//! log.borrow_mut().push(1);
//!
//! event_loop.run_until_idle();
//! assert_eq!(*log.borrow(), vec![1, 2]);
//! ```

pub mod deferred;
pub mod error;
pub mod event_loop;
pub mod global;
pub mod host;
pub mod pool;
pub mod queue;
pub mod registry;
pub mod timing;
#[cfg(feature = "tokio")]
pub mod tokio_host;

pub use deferred::Deferred;
pub use error::{CallbackFailure, Error, Result};
pub use event_loop::EventLoop;
pub use host::{Host, Job, Primitive};
pub use pool::LocalPoolHost;
pub use queue::{Builder, DeferredQueue, NextTick, Stats, Submit};
#[cfg(feature = "tokio")]
pub use tokio_host::TokioHost;
