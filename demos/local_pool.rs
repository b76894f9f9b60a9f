use futures::executor::LocalPool;
use nexttick::{DeferredQueue, LocalPoolHost};

fn main() {
    let mut pool = LocalPool::new();
    let queue = DeferredQueue::builder(LocalPoolHost::new(pool.spawner()))
        .name("pool")
        .build();

    queue.submit(|| println!("first"));
    queue.submit(|| panic!("this one fails"));
    let answer = queue.defer(|| {
        println!("third, despite the failure before it");
        42
    });

    let r = pool.run_until(answer);
    println!("deferred result: {r:?}");
    println!("stats: {:?}", queue.stats());
}
