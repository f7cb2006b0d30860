//! # jobpool
//!
//! A worker pool that multiplexes a fixed number of OS threads across an
//! arbitrary number of order-preserving job queues.
//!
//! Each [`Queue`] is an independent, strictly-ordered channel: jobs
//! dispatched to it come back out through [`Queue::next_result`] /
//! [`Queue::next_result_wait`] in exactly the order they were dispatched,
//! no matter which worker thread picks them up or how long any individual
//! job runs. Workers themselves are shared fairly across every attached
//! queue in round-robin order, so one queue's slow jobs cannot starve
//! another's.
//!
//! ```no_run
//! use jobpool::{Pool, Queue};
//!
//! let pool = Pool::new(4).unwrap();
//! let queue = Queue::new(&pool, 16, false);
//!
//! for i in 0..10 {
//!     queue
//!         .dispatch(Box::new(move |_| Box::new(i * 2)), Box::new(()))
//!         .unwrap();
//! }
//!
//! for _ in 0..10 {
//!     let result = queue.next_result_wait().unwrap();
//!     let _value: i32 = result.downcast().unwrap();
//! }
//!
//! pool.shutdown(false);
//! ```

#![allow(dead_code)]

mod config;
mod job;
mod pool;
mod queue;
mod stats;

pub use config::PoolConfig;
pub use job::{JobFn, JobResult};
pub use pool::Pool;
pub use queue::Queue;
pub use stats::{PoolStats, QueueStats};

pub use jobpool_core::{DispatchError, PoolError, QueueId, Serial};
