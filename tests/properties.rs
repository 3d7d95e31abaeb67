use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use proptest::prelude::*;
use topicbus::{args, Arg, EventBus, Null};

fn counting_bus() -> (EventBus, Arc<AtomicUsize>) {
    (EventBus::new(), Arc::new(AtomicUsize::new(0)))
}

proptest! {
    #[test]
    fn n_subscriptions_give_n_invocations(n in 1usize..16, publishes in 1usize..4) {
        let (bus, calls) = counting_bus();
        let c = Arc::clone(&calls);
        let f = move |_: u32| {
            c.fetch_add(1, Ordering::SeqCst);
        };
        for _ in 0..n {
            bus.subscribe("t", f.clone()).unwrap();
        }
        for p in 0..publishes {
            bus.publish("t", args![p as u32]);
        }
        prop_assert_eq!(calls.load(Ordering::SeqCst), n * publishes);
    }

    #[test]
    fn unsubscribe_all_then_topic_is_empty(n in 1usize..10) {
        let bus = EventBus::new();
        let f = |_: i64| {};
        for _ in 0..n {
            bus.subscribe("t", f).unwrap();
        }
        for left in (0..n).rev() {
            bus.unsubscribe("t", &f).unwrap();
            prop_assert_eq!(bus.handler_count("t"), left);
        }
        prop_assert!(!bus.has_callback("t"));
        prop_assert!(bus.unsubscribe("t", &f).unwrap_err().is_topic_empty());
    }

    #[test]
    fn fixed_arity_matches_only_exact_length(len in 0usize..6) {
        let (bus, calls) = counting_bus();
        let c = Arc::clone(&calls);
        bus.subscribe("t", move |_: i32, _: i32, _: i32| {
            c.fetch_add(1, Ordering::SeqCst);
        }).unwrap();

        let published: Vec<Arg> = (0..len as i32).map(Arg::new).collect();
        bus.publish("t", published);
        prop_assert_eq!(calls.load(Ordering::SeqCst), usize::from(len == 3));
    }

    #[test]
    fn nulls_match_only_nullable_or_dynamic(null_at in 0usize..2) {
        let (bus, calls) = counting_bus();
        let strict = Arc::clone(&calls);
        bus.subscribe("t", move |_: i32, _: i32| {
            strict.fetch_add(1, Ordering::SeqCst);
        }).unwrap();
        let lenient = Arc::clone(&calls);
        bus.subscribe("t", move |_: Option<i32>, _: Arg| {
            lenient.fetch_add(100, Ordering::SeqCst);
        }).unwrap();

        let mut published = args![1, 2];
        published[null_at] = Arg::new(Null);
        bus.publish("t", published);
        prop_assert_eq!(calls.load(Ordering::SeqCst), 100);
    }
}
