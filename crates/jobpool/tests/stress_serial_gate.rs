//! spec.md §9: "the trickiest correctness point" — many workers racing to
//! publish non-consecutive serials through a single broadcast condvar.
//! Large worker count, short jobs, single queue, many rounds.

use jobpool::{Pool, Queue};
use std::sync::Arc;

#[test]
fn many_workers_short_jobs_preserve_strict_order() {
    let worker_count = 16;
    let pool = Pool::new(worker_count).unwrap();
    let queue = Queue::new(&pool, 64, false);

    let total = 5000u64;
    let producer = {
        let queue = Arc::clone(&queue);
        std::thread::spawn(move || {
            for i in 0..total {
                queue.dispatch(Box::new(move |arg| arg), Box::new(i)).unwrap();
            }
        })
    };

    for expected in 0..total {
        let r = queue.next_result_wait().unwrap();
        assert_eq!(r.serial().as_u64(), expected);
        let v: u64 = r.downcast().unwrap();
        assert_eq!(v, expected);
    }

    producer.join().unwrap();
    pool.shutdown(false);
}

#[test]
fn many_short_lived_queues_each_preserve_order_concurrently() {
    let pool = Pool::new(8).unwrap();
    let handles: Vec<_> = (0..6)
        .map(|_| {
            let pool = Arc::clone(&pool);
            std::thread::spawn(move || {
                let queue = Queue::new(&pool, 8, false);
                let producer = {
                    let queue = Arc::clone(&queue);
                    std::thread::spawn(move || {
                        for i in 0..200u64 {
                            queue.dispatch(Box::new(move |arg| arg), Box::new(i)).unwrap();
                        }
                    })
                };
                for expected in 0..200u64 {
                    let r = queue.next_result_wait().unwrap();
                    assert_eq!(r.serial().as_u64(), expected);
                }
                producer.join().unwrap();
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }

    pool.shutdown(false);
}
