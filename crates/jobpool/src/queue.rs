//! The public queue handle

use crate::job::{Job, JobFn, JobResult};
use crate::pool::Pool;
use crate::stats::QueueStats;
use jobpool_core::{kdebug, DispatchError, QueueId, Serial};
use std::any::Any;
use std::sync::Arc;

/// An ordered, admission-controlled channel of jobs attached to a [`Pool`]
///
/// Dispatching through a `Queue` assigns the job a strictly increasing
/// serial number; results are delivered (via [`Queue::next_result`] and
/// friends) in that same order, regardless of which worker finishes first
/// or how long any individual job takes.
///
/// Create one with [`Queue::new`], which both allocates the queue's state
/// in the pool and attaches it to the dispatch ring in a single step
/// (spec.md's `queue_init` + `queue_attach`).
pub struct Queue {
    id: QueueId,
    pool: Arc<Pool>,
}

impl Queue {
    /// Allocate and attach a new queue.
    ///
    /// `qsize` bounds the queue's occupancy (see [`Queue::dispatch`]).
    /// `output_suppressed` queues never retain results for [`Queue::next_result`]
    /// — completed jobs are dropped immediately after running, which is
    /// useful for fire-and-forget work where only the side effect matters.
    pub fn new(pool: &Arc<Pool>, qsize: usize, output_suppressed: bool) -> Arc<Queue> {
        debug_assert!(qsize >= 1, "qsize must be at least 1");
        let mut guard = pool.state.lock().unwrap();
        let id = guard.alloc_queue(qsize, output_suppressed);
        drop(guard);
        kdebug!("queue {} created (qsize={}, output_suppressed={})", id, qsize, output_suppressed);
        Arc::new(Queue { id, pool: Arc::clone(pool) })
    }

    /// This queue's identifier
    pub fn id(&self) -> QueueId {
        self.id
    }

    /// Re-attach a previously detached queue to the pool's dispatch ring
    pub fn attach(&self) {
        let mut guard = self.pool.state.lock().unwrap();
        guard.attach(self.id);
    }

    /// Detach this queue from the pool's dispatch ring without destroying
    /// its state; already-queued and in-flight jobs are unaffected, but no
    /// worker will pick up further input until [`Queue::attach`] is called
    /// again.
    pub fn detach(&self) {
        let mut guard = self.pool.state.lock().unwrap();
        guard.detach(self.id);
    }

    /// Stop admitting new jobs. Already-queued and in-flight jobs keep
    /// draining; [`Queue::next_result_wait`] returns `None` once the queue
    /// is fully drained.
    pub fn shutdown(&self) {
        let mut guard = self.pool.state.lock().unwrap();
        if let Some(q) = guard.queues.get_mut(&self.id) {
            q.shutdown = true;
            q.output_avail.notify_all();
            q.input_not_full.notify_all();
            q.input_empty.notify_all();
            q.none_processing.notify_all();
        }
    }

    /// Dispatch a job, blocking until there is room if the queue is at its
    /// admission bound.
    pub fn dispatch(
        &self,
        func: Box<JobFn>,
        arg: Box<dyn Any + Send>,
    ) -> Result<(), DispatchError> {
        self.dispatch_impl(func, arg, true)
    }

    /// Dispatch a job without blocking; returns `DispatchError::WouldBlock`
    /// if the queue is at its admission bound instead of waiting for room.
    pub fn dispatch_nonblock(
        &self,
        func: Box<JobFn>,
        arg: Box<dyn Any + Send>,
    ) -> Result<(), DispatchError> {
        self.dispatch_impl(func, arg, false)
    }

    fn dispatch_impl(
        &self,
        func: Box<JobFn>,
        arg: Box<dyn Any + Send>,
        block: bool,
    ) -> Result<(), DispatchError> {
        let mut guard = self.pool.state.lock().unwrap();
        loop {
            let q = guard.queues.get(&self.id).ok_or(DispatchError::ShutDown)?;
            if q.shutdown {
                return Err(DispatchError::ShutDown);
            }
            if q.occupancy() < q.qsize {
                break;
            }
            if !block {
                return Err(DispatchError::WouldBlock);
            }
            let cv = q.input_not_full.clone();
            guard = cv.wait(guard).unwrap();
        }

        let q = guard.queues.get_mut(&self.id).unwrap();
        let serial = Serial::new(q.next_serial);
        q.next_serial += 1;
        q.stats.dispatched += 1;
        q.input.push_back(Job { func, arg, queue: self.id, serial });
        guard.njobs += 1;
        guard.stats.jobs_dispatched += 1;

        self.pool.wake_one(&mut guard);
        Ok(())
    }

    /// Pop the next in-order result if one is ready, without blocking
    pub fn next_result(&self) -> Option<JobResult> {
        let mut guard = self.pool.state.lock().unwrap();
        let q = guard.queues.get_mut(&self.id)?;
        let r = q.output.pop_front();
        if r.is_some() {
            q.input_not_full.notify_one();
        }
        r
    }

    /// Block until the next in-order result is ready, or the queue has
    /// shut down and fully drained (in which case this returns `None`)
    pub fn next_result_wait(&self) -> Option<JobResult> {
        let mut guard = self.pool.state.lock().unwrap();
        loop {
            let q = guard.queues.get(&self.id)?;
            if !q.output.is_empty() {
                break;
            }
            if q.shutdown && q.input.is_empty() && q.n_processing == 0 {
                return None;
            }
            let cv = q.output_avail.clone();
            guard = cv.wait(guard).unwrap();
        }
        let q = guard.queues.get_mut(&self.id).unwrap();
        let r = q.output.pop_front();
        q.input_not_full.notify_one();
        r
    }

    /// Block until this queue has no queued input and no in-flight jobs
    ///
    /// Results already sitting in the output list are left untouched; this
    /// is a producer-side barrier, not a drain of [`Queue::next_result`].
    pub fn flush(&self) {
        let mut guard = self.pool.state.lock().unwrap();
        loop {
            let q = match guard.queues.get(&self.id) {
                Some(q) => q,
                None => return,
            };
            if q.input.is_empty() {
                break;
            }
            let cv = q.input_empty.clone();
            guard = cv.wait(guard).unwrap();
        }
        loop {
            let q = match guard.queues.get(&self.id) {
                Some(q) => q,
                None => return,
            };
            if q.n_processing == 0 {
                break;
            }
            let cv = q.none_processing.clone();
            guard = cv.wait(guard).unwrap();
        }
    }

    /// `true` if there is no queued input, no in-flight job, and no
    /// undrained result for this queue
    pub fn is_empty(&self) -> bool {
        let guard = self.pool.state.lock().unwrap();
        guard.queues.get(&self.id).map(|q| q.is_empty()).unwrap_or(true)
    }

    /// Number of completed, undrained results waiting in the output list
    /// (spec.md's `queue_len`)
    pub fn len(&self) -> usize {
        let guard = self.pool.state.lock().unwrap();
        guard.queues.get(&self.id).map(|q| q.output.len()).unwrap_or(0)
    }

    /// Total occupancy: everything in flight or awaiting consumption
    /// (input + processing + output, per suppression mode — spec.md's
    /// `queue_sz`)
    pub fn sz(&self) -> usize {
        let guard = self.pool.state.lock().unwrap();
        guard.queues.get(&self.id).map(|q| q.occupancy()).unwrap_or(0)
    }

    /// The admission bound this queue was created with (not one of
    /// spec.md's three named inspection ops, but useful alongside them)
    pub fn size(&self) -> usize {
        let guard = self.pool.state.lock().unwrap();
        guard.queues.get(&self.id).map(|q| q.qsize).unwrap_or(0)
    }

    /// Snapshot this queue's counters
    pub fn stats(&self) -> QueueStats {
        let guard = self.pool.state.lock().unwrap();
        let q = guard.queues.get(&self.id);
        match q {
            Some(q) => QueueStats {
                dispatched: q.stats.dispatched,
                delivered: q.stats.delivered,
                dropped_on_shutdown: q.stats.dropped_on_shutdown,
                n_input: q.input.len(),
                n_processing: q.n_processing,
                n_output: q.output.len(),
            },
            None => QueueStats {
                dispatched: 0,
                delivered: 0,
                dropped_on_shutdown: 0,
                n_input: 0,
                n_processing: 0,
                n_output: 0,
            },
        }
    }
}

impl Drop for Queue {
    /// Detach and free this queue's remaining state.
    ///
    /// The caller must ensure no worker is currently executing a job from
    /// this queue before the last `Arc<Queue>` handle is dropped — matching
    /// the documented precondition on the original design's `queue_destroy`.
    /// In debug builds this is asserted; in release builds violating it
    /// simply means a worker holds a `QueueId` for state that is about to
    /// disappear, which it already tolerates (see `worker_loop`'s guarded
    /// `queues.get_mut` lookup after running a job).
    fn drop(&mut self) {
        let mut guard = self.pool.state.lock().unwrap();
        debug_assert!(
            guard.queues.get(&self.id).map(|q| q.n_processing == 0).unwrap_or(true),
            "queue dropped while a worker is still processing one of its jobs"
        );
        guard.detach(self.id);
        guard.queues.remove(&self.id);
    }
}
