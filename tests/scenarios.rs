use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::time::Duration;

use topicbus::{args, Arg, BusError, EventBus, Null, Variadic};

type Shared<T> = Arc<Mutex<Vec<T>>>;

fn shared<T>() -> Shared<T> {
    Arc::new(Mutex::new(Vec::new()))
}

#[test]
fn basic_sync_publish_with_null() {
    let bus = EventBus::new();
    let calls: Shared<(i32, Option<String>)> = shared();

    let log = Arc::clone(&calls);
    bus.subscribe("t", move |a: i32, e: Option<String>| {
        log.lock().unwrap().push((a, e));
    })
    .unwrap();

    bus.publish("t", args![10, Null]);

    assert_eq!(*calls.lock().unwrap(), vec![(10, None)]);
}

#[test]
fn variadic_matching() {
    let bus = EventBus::new();
    let calls: Shared<(String, Vec<i32>)> = shared();

    let log = Arc::clone(&calls);
    bus.subscribe("t", move |k: String, a: Variadic<i32>| {
        log.lock().unwrap().push((k, a.into_inner()));
    })
    .unwrap();

    bus.publish("t", args![String::from("123"), 9, 8, 7]);
    bus.publish("t", args![String::from("empty")]);
    bus.publish("t", args![String::from("bad"), 9, "eight"]);

    assert_eq!(
        *calls.lock().unwrap(),
        vec![
            (String::from("123"), vec![9, 8, 7]),
            (String::from("empty"), vec![]),
        ]
    );
}

#[test]
fn once_and_many() {
    let bus = EventBus::new();
    let counter = Arc::new(AtomicUsize::new(0));

    let c = Arc::clone(&counter);
    let f = move || {
        c.fetch_add(1, Ordering::SeqCst);
    };
    bus.subscribe_once("t", f.clone()).unwrap();
    bus.subscribe("t", f.clone()).unwrap();
    bus.subscribe("t", f).unwrap();

    bus.publish("t", args![]);

    assert_eq!(counter.load(Ordering::SeqCst), 3);
    assert!(bus.has_callback("t"));
    assert_eq!(bus.handler_count("t"), 2);
}

#[test]
fn once_async_is_removed_after_first_publish() {
    let bus = EventBus::new();
    let seen: Shared<i32> = shared();
    let (ran_tx, ran_rx) = mpsc::channel::<()>();

    bus.subscribe_once_async("t", move |a: i32, out: Arc<Mutex<Vec<i32>>>| {
        out.lock().unwrap().push(a);
        ran_tx.send(()).unwrap();
    })
    .unwrap();

    bus.publish("t", args![1, Arc::clone(&seen)]);
    let done = bus.publish_wait("t", args![2, Arc::clone(&seen)]);
    bus.wait_async(&done);
    assert!(!bus.has_callback("t"));

    // The first publish detached its handler; wait for its signal.
    ran_rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert_eq!(*seen.lock().unwrap(), vec![1]);
    // The record (and its sender) is gone, so no second signal can arrive.
    assert!(ran_rx.recv_timeout(Duration::from_secs(5)).is_err());
}

#[test]
fn transactional_ordering() {
    let bus = EventBus::new();
    let seen: Shared<i32> = shared();

    bus.subscribe_async(
        "t",
        |a: i32, out: Arc<Mutex<Vec<i32>>>, pause: u64| {
            std::thread::sleep(Duration::from_millis(pause));
            out.lock().unwrap().push(a);
        },
        true,
    )
    .unwrap();

    bus.publish("t", args![1, Arc::clone(&seen), 300_u64]);
    let done = bus.publish_wait("t", args![2, Arc::clone(&seen), 0_u64]);
    bus.wait_async(&done);

    assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
}

#[test]
fn signature_mismatch_is_silent() {
    let bus = EventBus::new();
    let ints = Arc::new(AtomicUsize::new(0));
    let strings = Arc::new(AtomicUsize::new(0));

    let i = Arc::clone(&ints);
    bus.subscribe("t", move |_a: i32| {
        i.fetch_add(1, Ordering::SeqCst);
    })
    .unwrap();
    let s = Arc::clone(&strings);
    bus.subscribe("t", move |_a: String| {
        s.fetch_add(1, Ordering::SeqCst);
    })
    .unwrap();

    bus.publish("t", args![10]);
    bus.publish("t", args![10, 11]);
    bus.publish("t", args![Null]);

    assert_eq!(ints.load(Ordering::SeqCst), 1);
    assert_eq!(strings.load(Ordering::SeqCst), 0);
}

#[test]
fn dynamic_parameters_accept_anything() {
    let bus = EventBus::new();
    let names: Shared<&'static str> = shared();

    let log = Arc::clone(&names);
    bus.subscribe("t", move |a: Arg, rest: Variadic<Option<u8>>| {
        let name = if a.is_null() { "null" } else { a.type_name() };
        log.lock().unwrap().push(name);
        assert!(rest.iter().all(|x| x.map_or(true, |v| v < 10)));
    })
    .unwrap();

    bus.publish("t", args![Null, 1_u8, Null]);
    bus.publish("t", args![true]);

    assert_eq!(*names.lock().unwrap(), vec!["null", "bool"]);
}

#[test]
fn unsubscribe_is_idempotent_until_topic_empties() {
    let bus = EventBus::new();
    fn handler(_a: i32) {}
    let other = |_a: i32| {};

    bus.subscribe("t", handler).unwrap();
    assert!(bus.is_subscribed("t", &handler));

    bus.unsubscribe("t", &other).unwrap();
    assert_eq!(bus.handler_count("t"), 1);

    bus.unsubscribe("t", &handler).unwrap();
    assert!(!bus.has_callback("t"));

    let err = bus.unsubscribe("t", &handler).unwrap_err();
    assert!(matches!(err, BusError::TopicEmpty { ref topic } if topic == "t"));
}

#[test]
fn unsubscribe_by_id_removes_that_record_only() {
    let bus = EventBus::new();
    let counter = Arc::new(AtomicUsize::new(0));
    let c = Arc::clone(&counter);
    let f = move || {
        c.fetch_add(1, Ordering::SeqCst);
    };

    let first = bus.subscribe("t", f.clone()).unwrap();
    let second = bus.subscribe_async("t", f, false).unwrap();
    assert_ne!(first, second);

    bus.unsubscribe_id("t", second).unwrap();
    bus.publish("t", args![]);
    assert_eq!(counter.load(Ordering::SeqCst), 1);

    bus.unsubscribe_id("t", first).unwrap();
    assert!(bus.unsubscribe_id("t", first).unwrap_err().is_topic_empty());
}

#[test]
fn non_callable_argument_is_refused() {
    let bus = EventBus::new();
    let err = bus.subscribe("t", Arg::new(42_i32)).unwrap_err();
    assert_eq!(err.as_label(), "bus_invalid_callable");
    assert!(bus.topics().is_empty());
}
