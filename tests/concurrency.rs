//! Concurrent access integration tests
//!
//! These tests verify that memoized constructors run exactly once under racing
//! first access and that a built injector can be shared freely across threads.

use ferrous_inject::{injectable, ErrorKind, InjectError, Injector, Module, Resolver};
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

#[derive(Debug)]
pub struct Expensive {
    id: usize,
}
injectable!(Expensive);

#[derive(Debug)]
struct Unavailable;

impl fmt::Display for Unavailable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("backend unavailable")
    }
}

impl std::error::Error for Unavailable {}

fn memoized(calls: Arc<AtomicUsize>) -> Module {
    let mut module = Module::new();
    module.bind::<Expensive>().to_singleton_constructor(move || {
        let id = calls.fetch_add(1, Ordering::SeqCst);
        // Widen the race window so every thread arrives mid-construction.
        thread::sleep(Duration::from_millis(20));
        Ok::<_, Unavailable>(Expensive { id })
    });
    module
}

#[test]
fn test_memoized_constructor_runs_once_under_contention() {
    const THREADS: usize = 16;
    let calls = Arc::new(AtomicUsize::new(0));
    let injector = Injector::new([memoized(Arc::clone(&calls))]).unwrap();
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let injector = injector.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                injector.get::<Expensive>().unwrap()
            })
        })
        .collect();

    let results: Vec<Arc<Expensive>> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(results.iter().all(|r| Arc::ptr_eq(r, &results[0])));
    assert_eq!(results[0].id, 0);
}

#[test]
fn test_memoized_failure_is_cached_for_every_caller() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counted = Arc::clone(&calls);
    let mut module = Module::new();
    module.bind::<Expensive>().to_singleton_constructor(move || {
        counted.fetch_add(1, Ordering::SeqCst);
        Err::<Expensive, _>(Unavailable)
    });
    let injector = Injector::new([module]).unwrap();

    let errors: Vec<InjectError> = crossbeam_utils::thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|_| s.spawn(|_| injector.get::<Expensive>().unwrap_err()))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    })
    .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    let first = match &errors[0] {
        InjectError::Producer(err) => Arc::clone(err),
        other => panic!("expected a producer error, got {other}"),
    };
    for err in &errors {
        assert_eq!(err.kind(), None);
        assert!(err.producer_error().unwrap().downcast_ref::<Unavailable>().is_some());
        if let InjectError::Producer(inner) = err {
            assert!(Arc::ptr_eq(inner, &first));
        }
    }

    // No retry on later calls either.
    assert!(injector.get::<Expensive>().is_err());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_shared_injector_serves_mixed_queries() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut module = memoized(Arc::clone(&calls));
    module.bind_tagged_usize("workers").to_singleton(4usize);
    let injector = Injector::new([module]).unwrap();

    crossbeam_utils::thread::scope(|s| {
        for _ in 0..8 {
            s.spawn(|_| {
                for _ in 0..50 {
                    assert_eq!(injector.get_tagged_usize("workers").unwrap(), 4);
                    assert_eq!(injector.get::<Expensive>().unwrap().id, 0);
                    let missing = injector.get_tagged_usize("threads").unwrap_err();
                    assert_eq!(missing.kind(), Some(ErrorKind::NoBinding));
                }
            });
        }
    })
    .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_child_shares_parent_memo_across_threads() {
    let calls = Arc::new(AtomicUsize::new(0));
    let parent = Injector::new([memoized(Arc::clone(&calls))]).unwrap();
    let children: Vec<Injector> = (0..4).map(|_| parent.child(Vec::new()).unwrap()).collect();

    let handles: Vec<_> = children
        .into_iter()
        .map(|child| thread::spawn(move || child.get::<Expensive>().unwrap()))
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap().id, 0);
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}
