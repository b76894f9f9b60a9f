use std::{cell::RefCell, rc::Rc};

use nexttick::{DeferredQueue, Error, EventLoop, global, registry};

#[test]
fn global_next_tick_requires_an_installed_queue() {
    global::uninstall();
    assert_eq!(global::next_tick(|| {}), Err(Error::NotInstalled));
    assert!(global::current().is_err());
}

#[test]
fn global_next_tick_batches_on_the_installed_queue() {
    let event_loop = Rc::new(EventLoop::new());
    let queue = DeferredQueue::new(Rc::clone(&event_loop));
    let log = Rc::new(RefCell::new(Vec::new()));
    global::install(queue.clone());

    let log_cl = Rc::clone(&log);
    assert_eq!(global::next_tick(move || log_cl.borrow_mut().push("global")), Ok(1));
    let log_cl = Rc::clone(&log);
    assert_eq!(
        queue.submit(move || log_cl.borrow_mut().push("direct")),
        2,
        "Global and direct submissions should share a batch"
    );

    event_loop.run_until_idle();
    assert_eq!(*log.borrow(), vec!["global", "direct"]);
    assert_eq!(queue.stats().flushes, 1);

    assert!(global::uninstall().is_some());
}

#[test]
fn global_install_replaces_previous_queue() {
    let event_loop = Rc::new(EventLoop::new());
    global::uninstall();

    assert!(global::install(DeferredQueue::new(Rc::clone(&event_loop))).is_none());
    assert!(global::install(DeferredQueue::new(Rc::clone(&event_loop))).is_some());
    assert!(global::uninstall().is_some());
    assert!(global::uninstall().is_none());
}

#[test]
fn registry_lookup_returns_the_registered_queue() {
    let event_loop = Rc::new(EventLoop::new());
    let queue = DeferredQueue::new(Rc::clone(&event_loop));
    let log = Rc::new(RefCell::new(Vec::new()));

    let registered = registry::register("registry_lookup", queue.clone()).unwrap();
    let found = registry::lookup("registry_lookup").unwrap();
    assert!(Rc::ptr_eq(&registered, &found));

    let log_cl = Rc::clone(&log);
    assert_eq!(found.next_tick(move || log_cl.borrow_mut().push(1)), 1);
    let log_cl = Rc::clone(&log);
    assert_eq!(registered.next_tick(move || log_cl.borrow_mut().push(2)), 2);

    event_loop.run_until_idle();
    assert_eq!(*log.borrow(), vec![1, 2]);
    assert!(registry::unregister("registry_lookup").is_some());
}

#[test]
fn registry_rejects_duplicates_and_unknown_names() {
    let event_loop = Rc::new(EventLoop::new());

    assert!(registry::register("registry_dup", DeferredQueue::new(Rc::clone(&event_loop))).is_ok());
    assert_eq!(
        registry::register("registry_dup", DeferredQueue::new(Rc::clone(&event_loop))).err(),
        Some(Error::DuplicateQueue("registry_dup".into()))
    );
    assert_eq!(
        registry::lookup("registry_missing").err(),
        Some(Error::UnknownQueue("registry_missing".into()))
    );

    registry::unregister("registry_dup");
    assert!(registry::lookup("registry_dup").is_err());
}
