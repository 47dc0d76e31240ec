//! Stress tests for the stratus pool

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use stratus::prelude::*;

#[test]
#[ignore] // Run with --ignored flag
fn stress_many_small_tasks() {
    let pool = ThreadPool::new(8).unwrap();
    let counter = Arc::new(AtomicUsize::new(0));

    for _ in 0..10_000 {
        let counter = counter.clone();
        pool.submit(move || {
            counter.fetch_add(1, Ordering::Relaxed);
        })
        .unwrap();
    }

    pool.wait_all();
    assert_eq!(counter.load(Ordering::Relaxed), 10_000);

    let stats = pool.get_stats();
    assert_eq!(stats.completed, 10_000);
    assert_eq!(stats.submitted, 10_000);
}

#[test]
#[ignore]
fn stress_panic_storm() {
    let pool = ThreadPool::new(4).unwrap();

    let handles: Vec<_> = (0..1_000u32)
        .map(|i| {
            pool.submit(move || {
                if i % 10 == 0 {
                    panic!("intentional panic {i}");
                }
                i
            })
            .unwrap()
        })
        .collect();

    let mut ok = 0;
    let mut panicked = 0;
    for handle in handles {
        match handle.join() {
            Ok(_) => ok += 1,
            Err(Error::TaskPanicked(_)) => panicked += 1,
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    assert_eq!(ok, 900);
    assert_eq!(panicked, 100);

    // pool still works after the storm
    let handle = pool.submit(|| 1).unwrap();
    assert_eq!(handle.join().unwrap(), 1);
}

#[test]
#[ignore]
fn stress_contended_producers() {
    let pool = Arc::new(ThreadPool::new(4).unwrap());
    let counter = Arc::new(AtomicUsize::new(0));

    let producers: Vec<_> = (0..8)
        .map(|p| {
            let pool = pool.clone();
            let counter = counter.clone();
            thread::spawn(move || {
                for i in 0..500u32 {
                    let counter = counter.clone();
                    let priority = match (p + i) % 3 {
                        0 => Priority::High,
                        1 => Priority::Medium,
                        _ => Priority::Low,
                    };
                    pool.submit_with_priority(priority, move || {
                        counter.fetch_add(1, Ordering::Relaxed);
                    })
                    .unwrap();
                }
            })
        })
        .collect();

    for producer in producers {
        producer.join().unwrap();
    }

    pool.wait_all();
    assert_eq!(counter.load(Ordering::Relaxed), 8 * 500);

    let stats = pool.get_stats();
    assert_eq!(stats.submitted, 4_000);
    assert_eq!(stats.completed, 4_000);
    assert!(stats.stolen <= stats.completed);
}

#[test]
#[ignore]
fn stress_repeated_lifecycle() {
    for round in 0..20 {
        let pool = ThreadPool::new(4).unwrap();
        let counter = Arc::new(AtomicUsize::new(0));

        for _ in 0..100 {
            let counter = counter.clone();
            pool.submit(move || {
                counter.fetch_add(1, Ordering::Relaxed);
            })
            .unwrap();
        }

        pool.shutdown_graceful();
        assert_eq!(counter.load(Ordering::Relaxed), 100, "round {round}");
    }
}

#[test]
#[ignore]
fn stress_immediate_shutdown_under_load() {
    for _ in 0..10 {
        let pool = Arc::new(ThreadPool::new(4).unwrap());
        let pool_submitter = pool.clone();

        let submitter = thread::spawn(move || {
            let mut accepted = 0u32;
            loop {
                match pool_submitter.submit(|| thread::sleep(std::time::Duration::from_millis(1)))
                {
                    Ok(_) => accepted += 1,
                    Err(Error::PoolStopped) => break,
                    Err(other) => panic!("unexpected error {other:?}"),
                }
                if accepted > 50_000 {
                    break;
                }
            }
            accepted
        });

        thread::sleep(std::time::Duration::from_millis(20));
        pool.shutdown_immediate();

        let accepted = submitter.join().unwrap();
        assert!(accepted >= 1);
    }
}
