use std::rc::Rc;

use nexttick::{DeferredQueue, EventLoop, global, registry};

fn log_later(message: &'static str) {
    // Deep in the call stack, no queue at hand.
    match global::next_tick(move || println!("{message}")) {
        Ok(n) => println!("queued `{message}` at {n}"),
        Err(e) => eprintln!("{e}"),
    }
}

fn main() {
    let event_loop = Rc::new(EventLoop::new());

    if let Err(e) = global::next_tick(|| {}) {
        println!("before install: {e}");
    }

    let queue = DeferredQueue::new(Rc::clone(&event_loop));
    global::install(queue.clone());
    if let Err(e) = registry::register("ui", queue) {
        eprintln!("{e}");
    }

    log_later("from the global queue");
    match registry::lookup("ui") {
        Ok(ui) => {
            ui.next_tick(|| println!("from the registry"));
        }
        Err(e) => eprintln!("{e}"),
    }

    event_loop.run_until_idle();
}
