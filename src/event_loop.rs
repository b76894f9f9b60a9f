//! A minimal single-threaded event loop implementing [`Host`].
//!
//! The loop keeps two queues: immediates, run in FIFO order at the start of each
//! turn, and timers, ordered by deadline and then by the order they were set.
//! Nothing runs until the owner drives the loop with [`EventLoop::turn`] or
//! [`EventLoop::run_until_idle`], which makes it a convenient host for
//! applications that own their main loop and for deterministic tests.

use std::{
    cell::{Cell, RefCell},
    cmp::{Ordering, Reverse},
    collections::{BinaryHeap, VecDeque},
    time::{Duration, Instant},
};

use tracing::trace;

use crate::host::{Host, Job};

struct Timer {
    due: Instant,
    seq: u64,
    job: Job,
}

impl PartialEq for Timer {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Timer {}

impl PartialOrd for Timer {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Timer {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.due, self.seq).cmp(&(other.due, other.seq))
    }
}

/// Single-threaded host driven explicitly by its owner.
///
/// Share it with a queue through `Rc<EventLoop>` (or a `&'static EventLoop`) so
/// that the owner can keep driving it.
pub struct EventLoop {
    immediates: RefCell<VecDeque<Job>>,
    timers: RefCell<BinaryHeap<Reverse<Timer>>>,
    next_timer: Cell<u64>,
    immediate_supported: bool,
}

impl EventLoop {
    /// Creates an event loop that supports both immediates and timers.
    #[must_use]
    pub fn new() -> Self {
        Self::with_immediates(true)
    }

    /// Creates an event loop without an immediate-callback facility.
    ///
    /// Queues driven by this loop fall back to zero-delay timers.
    #[must_use]
    pub fn timers_only() -> Self {
        Self::with_immediates(false)
    }

    fn with_immediates(immediate_supported: bool) -> Self {
        EventLoop {
            immediates: RefCell::new(VecDeque::with_capacity(8)),
            timers: RefCell::new(BinaryHeap::new()),
            next_timer: Cell::new(0),
            immediate_supported,
        }
    }

    /// Returns `true` if this loop accepts immediate callbacks.
    pub fn supports_immediate(&self) -> bool {
        self.immediate_supported
    }

    /// Number of jobs waiting in the loop, immediates and timers alike.
    pub fn pending(&self) -> usize {
        self.immediates.borrow().len() + self.timers.borrow().len()
    }

    /// Returns `true` when no job is waiting.
    pub fn is_idle(&self) -> bool {
        self.pending() == 0
    }

    /// Runs a single turn of the loop and returns the number of jobs run.
    ///
    /// A turn first runs every immediate that was queued before the turn started,
    /// then every timer that was set before the turn started and whose deadline
    /// has passed. Jobs queued while the turn is running wait for the next turn.
    pub fn turn(&self) -> usize {
        let mut ran = 0;

        let immediates = self.immediates.borrow().len();
        for _ in 0..immediates {
            // The borrow must end before the job runs, since jobs may queue more work.
            let job = self.immediates.borrow_mut().pop_front();
            let Some(job) = job else {
                break;
            };
            job();
            ran += 1;
        }

        let horizon = self.next_timer.get();
        let now = Instant::now();
        loop {
            let job = {
                let mut timers = self.timers.borrow_mut();
                match timers.peek() {
                    Some(Reverse(timer)) if timer.due <= now && timer.seq < horizon => {
                        timers.pop().map(|Reverse(timer)| timer.job)
                    }
                    _ => None,
                }
            };
            let Some(job) = job else {
                break;
            };
            job();
            ran += 1;
        }

        trace!(ran, pending = self.pending(), "event loop turn");
        ran
    }

    /// Runs turns until no job is left and returns the number of jobs run.
    ///
    /// When only timers with future deadlines remain, the calling thread sleeps
    /// until the earliest one is due.
    pub fn run_until_idle(&self) -> usize {
        let mut ran = 0;
        loop {
            ran += self.turn();
            if !self.immediates.borrow().is_empty() {
                continue;
            }
            let next_due = self.timers.borrow().peek().map(|Reverse(timer)| timer.due);
            match next_due {
                None => return ran,
                Some(due) => {
                    let now = Instant::now();
                    if due > now {
                        std::thread::sleep(due - now);
                    }
                }
            }
        }
    }
}

impl Default for EventLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl Host for EventLoop {
    fn set_immediate(&self, job: Job) -> Result<(), Job> {
        if !self.immediate_supported {
            return Err(job);
        }
        self.immediates.borrow_mut().push_back(job);
        Ok(())
    }

    fn set_timeout(&self, job: Job, delay: Duration) -> Result<(), Job> {
        let seq = self.next_timer.get();
        self.next_timer.set(seq + 1);
        self.timers.borrow_mut().push(Reverse(Timer {
            due: Instant::now() + delay,
            seq,
            job,
        }));
        Ok(())
    }
}
