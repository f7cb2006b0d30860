//! spec.md §8 scenario 4: nonblocking dispatch into a full queue returns
//! `WouldBlock` instead of waiting for room.

use jobpool::{DispatchError, Pool, Queue};

#[test]
fn third_dispatch_would_block_on_full_queue() {
    let pool = Pool::new(2).unwrap();
    let queue = Queue::new(&pool, 2, false);

    // Occupancy for a non-suppressed queue is n_input + n_processing +
    // n_output; none of those three buckets shrinks until a result is
    // drained via next_result, so these two dispatches leave the queue at
    // capacity regardless of how fast the workers run the jobs.
    for i in 0..2 {
        let r = queue.dispatch_nonblock(Box::new(move |arg| arg), Box::new(i));
        assert!(r.is_ok(), "dispatch {} should succeed", i);
    }

    // Give the workers a chance to actually run the jobs so this isn't
    // merely testing the input-list bound.
    queue.flush();

    let third = queue.dispatch_nonblock(Box::new(move |arg| arg), Box::new(2));
    assert_eq!(third, Err(DispatchError::WouldBlock));

    pool.shutdown(true);
}
