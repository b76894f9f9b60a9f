//! Named queues, looked up by name on the current thread.
//!
//! Lets independent parts of a program share a queue without passing it
//! around: one side registers it, the others look it up. A lookup hands out a
//! handle to the very same queue, so batching is shared between them.

use std::{
    cell::RefCell,
    collections::{HashMap, hash_map::Entry},
    rc::Rc,
};

use tracing::debug;

use crate::{
    error::{Error, Result},
    queue::{NextTick, Submit},
};

thread_local! {
    static QUEUES: RefCell<HashMap<String, NextTick>> = RefCell::new(HashMap::with_capacity(4));
}

/// Registers `queue` under `name` and returns a handle to it.
///
/// # Errors
///
/// Returns [`Error::DuplicateQueue`] if `name` is already taken.
pub fn register<Q: Submit + 'static>(name: impl Into<String>, queue: Q) -> Result<NextTick> {
    let name = name.into();
    QUEUES.with(|queues| match queues.borrow_mut().entry(name) {
        Entry::Occupied(entry) => Err(Error::DuplicateQueue(entry.key().clone())),
        Entry::Vacant(entry) => {
            debug!(name = %entry.key(), "registering queue");
            let queue: NextTick = Rc::new(queue);
            Ok(Rc::clone(entry.insert(queue)))
        }
    })
}

/// Returns the queue registered under `name`.
///
/// # Errors
///
/// Returns [`Error::UnknownQueue`] if nothing is registered under `name`.
pub fn lookup(name: &str) -> Result<NextTick> {
    QUEUES.with(|queues| {
        queues
            .borrow()
            .get(name)
            .cloned()
            .ok_or_else(|| Error::UnknownQueue(name.to_string()))
    })
}

/// Removes and returns the queue registered under `name`.
pub fn unregister(name: &str) -> Option<NextTick> {
    QUEUES.with(|queues| queues.borrow_mut().remove(name))
}
