use std::time::Duration;

use nexttick::{DeferredQueue, TokioHost};
use tokio::task::LocalSet;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let local = LocalSet::new();
    local
        .run_until(async {
            let queue = DeferredQueue::new(TokioHost);

            queue.submit(|| println!("deferred 1"));
            queue.submit(|| println!("deferred 2"));
            println!("synchronous part done");

            tokio::time::sleep(Duration::from_millis(1)).await;
            let r = queue.defer(|| "value").await;
            println!("{r:?}, stats: {:?}", queue.stats());
        })
        .await;
}
