use std::rc::Rc;

use nexttick::{DeferredQueue, EventLoop};

struct Window {
    title: &'static str,
}

struct Widget {
    label: &'static str,
}

fn main() {
    let event_loop = Rc::new(EventLoop::new());
    let queue = DeferredQueue::builder(Rc::clone(&event_loop))
        .global(Window { title: "main" })
        .build();

    let n = queue.submit(|| println!("fn1"));
    println!("fn1 queued at {n}");

    let widget = Rc::new(Widget { label: "hehe" });
    let n = queue.submit_on(|this: &Widget, _: ()| println!("fn2: {}", this.label), widget, ());
    println!("fn2 queued at {n}");

    let n = queue.submit_call(
        |this: &Window, (a, b): (&str, &str)| println!("fn3 on {}: {a} {b}", this.title),
        ("a", "b"),
    );
    println!("fn3 queued at {n}");

    let queue_cl = queue.clone();
    let n = queue.submit(move || {
        // Lands in a fresh batch, flushed after this one completes.
        let nested = queue_cl.submit(|| println!("fn5"));
        println!("fn4 (fn5 queued at {nested})");
    });
    println!("fn4 queued at {n}");

    println!("end of synchronous turn");
    let ran = event_loop.run_until_idle();
    println!("event loop ran {ran} jobs, stats: {:?}", queue.stats());
}
