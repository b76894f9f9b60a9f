//! [`Host`] for tokio's [`LocalSet`](tokio::task::LocalSet).

use std::time::Duration;

use crate::host::{Host, Job};

/// Runs jobs as local tasks on the current tokio `LocalSet`.
///
/// # Panics
///
/// Arming a flush panics when the queue is used outside of a `LocalSet`, the
/// same way [`tokio::task::spawn_local`] does. The panic surfaces from `submit`;
/// the queue stays disarmed and its entries are kept for the next submission.
#[derive(Clone, Copy, Debug, Default)]
pub struct TokioHost;

impl Host for TokioHost {
    fn set_immediate(&self, job: Job) -> Result<(), Job> {
        tokio::task::spawn_local(async move { job() });
        Ok(())
    }

    fn set_timeout(&self, job: Job, delay: Duration) -> Result<(), Job> {
        tokio::task::spawn_local(async move {
            tokio::time::sleep(delay).await;
            job();
        });
        Ok(())
    }
}
