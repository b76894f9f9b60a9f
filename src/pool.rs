//! [`Host`] backed by a `futures` [`LocalPool`](futures::executor::LocalPool).

use std::{cell::Cell, rc::Rc, time::Duration};

use futures::{executor::LocalSpawner, task::LocalSpawnExt};
use tracing::warn;

use crate::{
    host::{Host, Job},
    timing::Delay,
};

/// Runs jobs as tasks on a single-threaded `futures` executor.
///
/// Immediates are spawned as ready-to-run tasks; they run the next time the
/// pool is driven (`run`, `run_until` or `run_until_stalled`). Timers are
/// spawned behind a [`Delay`]. Once the pool is dropped every job is handed
/// back.
#[derive(Clone)]
pub struct LocalPoolHost {
    spawner: LocalSpawner,
}

impl LocalPoolHost {
    /// Creates a host that spawns onto the pool behind `spawner`.
    pub fn new(spawner: LocalSpawner) -> Self {
        LocalPoolHost { spawner }
    }

    fn spawn(&self, job: Job, delay: Option<Duration>) -> Result<(), Job> {
        let slot = Rc::new(Cell::new(Some(job)));
        let task_slot = Rc::clone(&slot);
        let run = async move {
            if let Some(job) = task_slot.take() {
                job();
            }
        };
        let spawned = match delay {
            None => self.spawner.spawn_local(run),
            Some(delay) => self.spawner.spawn_local(Delay::new(run, delay)),
        };
        match spawned {
            Ok(()) => Ok(()),
            Err(err) => {
                warn!(%err, "local pool rejected job");
                // The rejected task was dropped without running, so the job is still here.
                slot.take().map_or(Ok(()), Err)
            }
        }
    }
}

impl Host for LocalPoolHost {
    fn set_immediate(&self, job: Job) -> Result<(), Job> {
        self.spawn(job, None)
    }

    fn set_timeout(&self, job: Job, delay: Duration) -> Result<(), Job> {
        self.spawn(job, Some(delay))
    }
}
