//! Provides the [`DeferredQueue`], a batching "next tick" scheduler.
//!
//! Callbacks submitted during one synchronous turn are collected into a single
//! batch and run together, in submission order, once the host gets back to its
//! loop. Only the first submission of a turn arms the host; later ones ride
//! along with the pending flush.
//!
//! A flush takes the whole queue as its batch and clears the scheduled flag
//! *before* running anything. Callbacks that submit more work therefore start a
//! fresh batch, which arms a new flush of its own instead of extending the one
//! that is running. A flush never loops to drain work submitted during it.

use std::{
    cell::{Cell, RefCell},
    fmt, mem,
    panic::{self, AssertUnwindSafe},
    rc::Rc,
};

use futures::channel::oneshot;
use tracing::{debug, error, trace, warn};

use crate::{
    deferred::Deferred,
    error::{CallbackFailure, Error, panic_message},
    host::{self, Host, Job, Primitive},
};

const DEFAULT_NAME: &str = "nexttick";

type FailureHook = Rc<dyn Fn(&CallbackFailure)>;

// A callable fused with its receiver and arguments.
struct Entry {
    seq: u64,
    callable: Job,
}

struct State {
    entries: Vec<Entry>,
    next_seq: u64,
}

/// Counters describing what a queue has done so far.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Stats {
    /// Entries ever submitted.
    pub submitted: u64,

    /// Flushes run.
    pub flushes: u64,

    /// Entries invoked, including the ones that panicked.
    pub invoked: u64,

    /// Entries that panicked.
    pub failures: u64,
}

struct Inner<H, G> {
    host: H,
    global: Rc<G>,
    state: RefCell<State>,
    armed: Cell<bool>,
    stats: Cell<Stats>,
    primitive: Primitive,
    on_failure: FailureHook,
    name: String,
}

/// A single-threaded queue that runs callbacks "as soon as possible" after
/// the current synchronous turn, in batches.
///
/// The queue is a cheap handle: clones share the same pending batch, so a
/// callback may capture a clone and submit more work. Every `submit*` method
/// returns the number of entries pending right after the append, which restarts
/// at 1 for each batch.
///
/// When no receiver is given, callbacks receive the queue's global value of
/// type `G`, set through [`Builder::global`].
///
/// An armed flush holds the queue until it runs, so entries still run after
/// the last handle is dropped. A host that drops the flush without running it
/// drops the pending entries with it.
pub struct DeferredQueue<H, G = ()> {
    inner: Rc<Inner<H, G>>,
}

impl<H, G> Clone for DeferredQueue<H, G> {
    fn clone(&self) -> Self {
        DeferredQueue {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<H, G> fmt::Debug for DeferredQueue<H, G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeferredQueue")
            .field("name", &self.inner.name)
            .field("pending", &self.inner.state.borrow().entries.len())
            .field("armed", &self.inner.armed.get())
            .field("stats", &self.inner.stats.get())
            .finish()
    }
}

impl<H: Host + 'static> DeferredQueue<H> {
    /// Creates a queue with default settings and a `()` global receiver.
    #[must_use]
    pub fn new(host: H) -> Self {
        Builder::new(host).build()
    }

    /// Returns a [`Builder`] for configuring a queue driven by `host`.
    pub fn builder(host: H) -> Builder<H> {
        Builder::new(host)
    }
}

impl<H: Host + 'static, G: 'static> DeferredQueue<H, G> {
    /// Schedules `f` to run after the current synchronous turn.
    ///
    /// Returns the number of entries waiting in the current batch, including this one.
    pub fn submit<F>(&self, f: F) -> usize
    where
        F: FnOnce() + 'static,
    {
        self.push(Box::new(f))
    }

    /// Schedules `f` to run with the queue's global receiver and `args`.
    ///
    /// `args` is forwarded untouched; a tuple carries several arguments.
    ///
    /// # Example
    /// ```
    /// # use std::rc::Rc;
    /// # use nexttick::{DeferredQueue, EventLoop};
    /// let event_loop = Rc::new(EventLoop::new());
    /// let queue = DeferredQueue::new(Rc::clone(&event_loop));
    ///
    /// queue.submit_call(|_global: &(), (a, b): (&str, &str)| println!("{a}{b}"), ("a", "b"));
    /// event_loop.run_until_idle();
    /// ```
    pub fn submit_call<A, F>(&self, f: F, args: A) -> usize
    where
        A: 'static,
        F: FnOnce(&G, A) + 'static,
    {
        self.submit_bound(f, None, args)
    }

    /// Schedules `f` to run with `context` as its receiver.
    ///
    /// A `None` context falls back to the queue's global receiver.
    pub fn submit_bound<A, F>(&self, f: F, context: Option<Rc<G>>, args: A) -> usize
    where
        A: 'static,
        F: FnOnce(&G, A) + 'static,
    {
        let receiver = context.unwrap_or_else(|| Rc::clone(&self.inner.global));
        self.submit_on(f, receiver, args)
    }

    /// Schedules `f` to run with an explicit receiver of any type.
    pub fn submit_on<C, A, F>(&self, f: F, context: Rc<C>, args: A) -> usize
    where
        C: ?Sized + 'static,
        A: 'static,
        F: FnOnce(&C, A) + 'static,
    {
        self.push(Box::new(move || f(&*context, args)))
    }

    /// Schedules `f` and returns a future resolving to its result.
    ///
    /// The future resolves to [`Error::Panicked`] if `f` panics and to
    /// [`Error::Canceled`] if the entry is dropped without running. The panic is
    /// still reported to the failure hook.
    pub fn defer<T, F>(&self, f: F) -> Deferred<T>
    where
        T: 'static,
        F: FnOnce() -> T + 'static,
    {
        let (sender, receiver) = oneshot::channel();
        let position = self.submit(move || match panic::catch_unwind(AssertUnwindSafe(f)) {
            Ok(value) => {
                let _ = sender.send(Ok(value));
            }
            Err(payload) => {
                let _ = sender.send(Err(Error::Panicked(panic_message(payload.as_ref()))));
                panic::resume_unwind(payload);
            }
        });
        Deferred::new(receiver, position)
    }

    /// Returns a future that resolves once the flush covering it has reached it.
    pub fn tick(&self) -> Deferred<()> {
        self.defer(|| ())
    }

    /// Number of entries waiting for the next flush.
    pub fn pending(&self) -> usize {
        self.inner.state.borrow().entries.len()
    }

    /// Returns `true` if a flush has been requested from the host and has not run yet.
    pub fn is_armed(&self) -> bool {
        self.inner.armed.get()
    }

    /// Returns a snapshot of the queue's counters.
    pub fn stats(&self) -> Stats {
        self.inner.stats.get()
    }

    /// The receiver used when no context is given.
    pub fn global(&self) -> &Rc<G> {
        &self.inner.global
    }

    /// The host driving this queue.
    pub fn host(&self) -> &H {
        &self.inner.host
    }

    /// The label carried by this queue's log events.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    fn push(&self, callable: Job) -> usize {
        let (seq, pending) = {
            let mut state = self.inner.state.borrow_mut();
            let seq = state.next_seq;
            state.next_seq += 1;
            state.entries.push(Entry { seq, callable });
            (seq, state.entries.len())
        };
        self.update_stats(|s| s.submitted += 1);
        trace!(queue = %self.inner.name, seq, pending, "submitted");

        if !self.inner.armed.replace(true) {
            self.arm();
        }
        pending
    }

    fn arm(&self) {
        let queue = Rc::clone(&self.inner);
        let job: Job = Box::new(move || DeferredQueue { inner: queue }.flush());

        // Clears the flag unless the host took the job, including when it panics.
        let mut guard = ArmGuard {
            armed: &self.inner.armed,
            accepted: false,
        };
        match host::defer(&self.inner.host, job, self.inner.primitive) {
            Ok(used) => {
                guard.accepted = true;
                debug!(queue = %self.inner.name, primitive = %used, "flush armed");
            }
            Err(_job) => {
                warn!(
                    queue = %self.inner.name,
                    pending = self.pending(),
                    "host rejected flush, next submit will retry"
                );
            }
        }
    }

    fn flush(&self) {
        // Snapshot and reset before running anything, so that work submitted by the
        // batch lands in a new batch with its own flush.
        let batch = {
            let mut state = self.inner.state.borrow_mut();
            mem::take(&mut state.entries)
        };
        self.inner.armed.set(false);

        self.update_stats(|s| s.flushes += 1);
        let flush_no = self.inner.stats.get().flushes;
        let size = batch.len();
        debug!(queue = %self.inner.name, batch = flush_no, size, "flushing");

        let mut failures = 0;
        for Entry { seq, callable } in batch {
            let outcome = panic::catch_unwind(AssertUnwindSafe(callable));
            self.update_stats(|s| s.invoked += 1);
            if let Err(payload) = outcome {
                failures += 1;
                self.update_stats(|s| s.failures += 1);
                let failure = CallbackFailure {
                    seq,
                    batch: flush_no,
                    message: panic_message(payload.as_ref()),
                };
                let on_failure = Rc::clone(&self.inner.on_failure);
                if panic::catch_unwind(AssertUnwindSafe(|| on_failure(&failure))).is_err() {
                    error!(queue = %self.inner.name, %failure, "failure hook panicked");
                }
            }
        }

        debug!(
            queue = %self.inner.name,
            batch = flush_no,
            size,
            failures,
            rearmed = self.inner.armed.get(),
            "flush complete"
        );
    }

    fn update_stats(&self, f: impl FnOnce(&mut Stats)) {
        let mut stats = self.inner.stats.get();
        f(&mut stats);
        self.inner.stats.set(stats);
    }
}

struct ArmGuard<'a> {
    armed: &'a Cell<bool>,
    accepted: bool,
}

impl Drop for ArmGuard<'_> {
    fn drop(&mut self) {
        if !self.accepted {
            self.armed.set(false);
        }
    }
}

/// Object-safe view of a queue, used where the host and receiver types are
/// erased (see [`global`](crate::global) and [`registry`](crate::registry)).
pub trait Submit {
    /// Schedules a boxed job and returns the number of entries pending in its batch.
    fn submit_job(&self, job: Job) -> usize;
}

impl<H: Host + 'static, G: 'static> Submit for DeferredQueue<H, G> {
    fn submit_job(&self, job: Job) -> usize {
        self.push(job)
    }
}

impl dyn Submit {
    /// Schedules `f` to run after the current synchronous turn.
    pub fn next_tick<F>(&self, f: F) -> usize
    where
        F: FnOnce() + 'static,
    {
        self.submit_job(Box::new(f))
    }
}

/// A type-erased, shareable handle to a queue.
pub type NextTick = Rc<dyn Submit>;

/// Configures and creates a [`DeferredQueue`].
pub struct Builder<H, G = ()> {
    host: H,
    global: G,
    primitive: Primitive,
    on_failure: Option<FailureHook>,
    name: String,
}

impl<H: Host + 'static> Builder<H> {
    /// Starts a builder for a queue driven by `host`.
    pub fn new(host: H) -> Self {
        Builder {
            host,
            global: (),
            primitive: Primitive::Immediate,
            on_failure: None,
            name: DEFAULT_NAME.to_string(),
        }
    }
}

impl<H: Host + 'static, G: 'static> Builder<H, G> {
    /// Sets the receiver handed to callbacks submitted without a context.
    pub fn global<T: 'static>(self, global: T) -> Builder<H, T> {
        Builder {
            host: self.host,
            global,
            primitive: self.primitive,
            on_failure: self.on_failure,
            name: self.name,
        }
    }

    /// Sets the host facility requested when a flush is armed.
    pub fn primitive(mut self, primitive: Primitive) -> Self {
        self.primitive = primitive;
        self
    }

    /// Installs the hook that receives callbacks' panics.
    ///
    /// Without a hook, failures are logged at `error` level.
    pub fn on_failure(mut self, hook: impl Fn(&CallbackFailure) + 'static) -> Self {
        self.on_failure = Some(Rc::new(hook));
        self
    }

    /// Sets the label carried by the queue's log events.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Creates the queue.
    #[must_use]
    pub fn build(self) -> DeferredQueue<H, G> {
        let on_failure = self.on_failure.unwrap_or_else(|| {
            let name = self.name.clone();
            let hook: FailureHook = Rc::new(move |failure: &CallbackFailure| {
                error!(queue = %name, seq = failure.seq, batch = failure.batch, "{failure}");
            });
            hook
        });
        DeferredQueue {
            inner: Rc::new(Inner {
                host: self.host,
                global: Rc::new(self.global),
                state: RefCell::new(State {
                    entries: Vec::new(),
                    next_seq: 1,
                }),
                armed: Cell::new(false),
                stats: Cell::new(Stats::default()),
                primitive: self.primitive,
                on_failure,
                name: self.name,
            }),
        }
    }
}
