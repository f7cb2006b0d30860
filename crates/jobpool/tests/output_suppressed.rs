//! spec.md §8 scenario 5: an output-suppressed queue discards results, and
//! `flush` still forms a happens-before barrier over side effects.

use jobpool::{Pool, Queue};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[test]
fn suppressed_queue_flush_observes_all_side_effects() {
    let pool = Pool::new(4).unwrap();
    let queue = Queue::new(&pool, 16, true);
    let counter = Arc::new(AtomicU64::new(0));

    for _ in 0..1000 {
        let counter = Arc::clone(&counter);
        queue
            .dispatch(
                Box::new(move |arg| {
                    counter.fetch_add(1, Ordering::SeqCst);
                    arg
                }),
                Box::new(()),
            )
            .unwrap();
    }

    queue.flush();

    assert_eq!(counter.load(Ordering::SeqCst), 1000);
    assert!(queue.is_empty());
    assert!(queue.next_result().is_none(), "suppressed queue never produces results");

    pool.shutdown(false);
}
