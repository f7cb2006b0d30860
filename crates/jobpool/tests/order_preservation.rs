//! spec.md §8 scenarios 1 and 2: results come back in dispatch order
//! regardless of how long individual jobs take to run.
//!
//! Both tests dispatch more jobs than `qsize` holds, so a producer thread
//! runs concurrently with the consumer on the main thread — sequential
//! dispatch-then-drain would deadlock once undrained output fills the
//! admission bound.

use jobpool::{Pool, Queue};
use std::sync::Arc;
use std::time::Duration;

#[test]
fn results_arrive_in_dispatch_order() {
    let pool = Pool::new(4).unwrap();
    let queue = Queue::new(&pool, 16, false);

    let producer = {
        let queue = Arc::clone(&queue);
        std::thread::spawn(move || {
            for i in 0..100i64 {
                queue
                    .dispatch(
                        Box::new(move |arg| Box::new(*arg.downcast::<i64>().unwrap() + 1)),
                        Box::new(i),
                    )
                    .unwrap();
            }
        })
    };

    for expected_serial in 0..100u64 {
        let r = queue.next_result_wait().unwrap();
        assert_eq!(r.serial().as_u64(), expected_serial);
        let v: i64 = r.downcast().unwrap();
        assert_eq!(v, expected_serial as i64 + 1);
    }

    producer.join().unwrap();
    pool.shutdown(false);
}

#[test]
fn order_survives_reverse_completion_times() {
    // Two workers, qsize 4: later-dispatched jobs finish first because
    // earlier ones sleep longer, exercising the curr_serial gate in
    // worker_loop directly.
    let pool = Pool::new(2).unwrap();
    let queue = Queue::new(&pool, 4, false);

    let producer = {
        let queue = Arc::clone(&queue);
        std::thread::spawn(move || {
            for i in 0..10u64 {
                let sleep_ms = 10 * (10 - i);
                queue
                    .dispatch(
                        Box::new(move |arg| {
                            std::thread::sleep(Duration::from_millis(sleep_ms));
                            arg
                        }),
                        Box::new(i),
                    )
                    .unwrap();
            }
        })
    };

    for expected in 0..10u64 {
        let r = queue.next_result_wait().unwrap();
        assert_eq!(r.serial().as_u64(), expected);
        let v: u64 = r.downcast().unwrap();
        assert_eq!(v, expected);
    }

    producer.join().unwrap();
    pool.shutdown(false);
}
