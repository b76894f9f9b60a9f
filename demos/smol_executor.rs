use std::{rc::Rc, time::Duration};

use nexttick::{DeferredQueue, Host, Job};
use smol::{LocalExecutor, Timer};

// Any executor able to spawn local tasks can drive a queue.
struct SmolHost {
    ex: Rc<LocalExecutor<'static>>,
}

impl Host for SmolHost {
    fn set_immediate(&self, job: Job) -> Result<(), Job> {
        self.ex.spawn(async move { job() }).detach();
        Ok(())
    }

    fn set_timeout(&self, job: Job, delay: Duration) -> Result<(), Job> {
        self.ex
            .spawn(async move {
                Timer::after(delay).await;
                job();
            })
            .detach();
        Ok(())
    }
}

fn main() {
    let ex = Rc::new(LocalExecutor::new());
    let queue = DeferredQueue::new(SmolHost { ex: Rc::clone(&ex) });

    queue.submit(|| println!("Polling in first"));
    let queue_cl = queue.clone();
    let done = queue.defer(move || {
        queue_cl.submit(|| println!("Nested callback, next flush"));
        "batch done"
    });
    println!("After submit");

    let r = futures_lite::future::block_on(ex.run(async {
        let r = done.await;
        queue.tick().await.map(|()| r)
    }));
    println!("{r:?}");
}
