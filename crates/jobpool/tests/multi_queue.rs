//! spec.md §8 scenario 3: multiple queues sharing one worker pool each keep
//! their own order and never exceed their own admission bound.
//!
//! The producer dispatches round-robin from its own thread while a
//! consumer thread per queue drains concurrently — with qsize 8 and ~17
//! jobs per queue, draining only after every dispatch completes would
//! deadlock on backpressure.

use jobpool::{Pool, Queue};
use std::sync::Arc;

#[test]
fn three_queues_round_robin_preserve_order_and_bound() {
    let pool = Pool::new(8).unwrap();
    let queues: Vec<_> = (0..3).map(|_| Queue::new(&pool, 8, false)).collect();

    let total_jobs = 50usize;
    let mut expected_per_queue = vec![0usize; queues.len()];
    for i in 0..total_jobs {
        expected_per_queue[i % queues.len()] += 1;
    }

    let producer = {
        let queues = queues.clone();
        std::thread::spawn(move || {
            for i in 0..total_jobs {
                queues[i % queues.len()]
                    .dispatch(Box::new(move |arg| arg), Box::new(i as u64))
                    .unwrap();
            }
        })
    };

    let consumers: Vec<_> = queues
        .iter()
        .zip(expected_per_queue)
        .map(|(q, expected)| {
            let q = Arc::clone(q);
            std::thread::spawn(move || {
                let mut last: Option<u64> = None;
                for _ in 0..expected {
                    let r = q.next_result_wait().expect("queue still has in-flight jobs");
                    let serial = r.serial().as_u64();
                    if let Some(prev) = last {
                        assert_eq!(serial, prev + 1, "serial gap");
                    }
                    last = Some(serial);
                }
            })
        })
        .collect();

    producer.join().unwrap();
    for c in consumers {
        c.join().unwrap();
    }

    for q in &queues {
        assert!(q.stats().n_input + q.stats().n_processing <= q.size());
    }

    pool.shutdown(false);
}
