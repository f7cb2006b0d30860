//! The pool: worker threads, the shared mutex, and the dispatch loop

use crate::config::PoolConfig;
use crate::job::{Job, JobResult};
use crate::stats::{PoolStats, PoolStatsInner, QueueStatsInner};
use jobpool_core::{kdebug, kerror, kinfo, kwarn, PoolError, QueueId};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Instant;

/// Per-queue mutable state, guarded by the pool's single mutex
///
/// The four condition variables live here, behind the lock, as `Arc<Condvar>`
/// rather than bare `Condvar` — `Condvar::wait` takes its `MutexGuard` by
/// value, so a waiter clones the `Arc` it needs out of the guarded state
/// first and only then consumes the guard. This keeps the single-mutex
/// discipline spec.md calls for without reaching for per-queue locks.
pub(crate) struct QueueState {
    pub input: VecDeque<Job>,
    pub output: VecDeque<JobResult>,
    pub n_processing: usize,
    pub qsize: usize,
    pub next_serial: u64,
    pub curr_serial: u64,
    pub shutdown: bool,
    pub attached: bool,
    pub output_suppressed: bool,
    /// Recorded once by a `kill` shutdown: the half-open range of serials
    /// whose jobs were discarded from the input list before they ever ran.
    /// `curr_serial` jumps straight from `start` to `end` once every smaller,
    /// still in-flight serial has published — see `skip_dropped_hole`.
    pub pending_drop: Option<(u64, u64)>,
    pub output_avail: Arc<Condvar>,
    pub input_not_full: Arc<Condvar>,
    pub input_empty: Arc<Condvar>,
    pub none_processing: Arc<Condvar>,
    pub stats: QueueStatsInner,
}

impl QueueState {
    fn new(qsize: usize, output_suppressed: bool) -> Self {
        QueueState {
            input: VecDeque::new(),
            output: VecDeque::new(),
            n_processing: 0,
            qsize,
            next_serial: 0,
            curr_serial: 0,
            shutdown: false,
            attached: true,
            output_suppressed,
            pending_drop: None,
            output_avail: Arc::new(Condvar::new()),
            input_not_full: Arc::new(Condvar::new()),
            input_empty: Arc::new(Condvar::new()),
            none_processing: Arc::new(Condvar::new()),
            stats: QueueStatsInner::default(),
        }
    }

    /// Total occupancy counted against `qsize` for admission control.
    ///
    /// Output-suppressed queues never accumulate results, so their bound is
    /// `n_input + n_processing`; normal queues additionally count
    /// undrained results, matching the admission-bound testable property.
    pub(crate) fn occupancy(&self) -> usize {
        if self.output_suppressed {
            self.input.len() + self.n_processing
        } else {
            self.input.len() + self.n_processing + self.output.len()
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.input.is_empty() && self.n_processing == 0 && self.output.is_empty()
    }

    /// If `curr_serial` has just caught up to the start of a recorded
    /// kill-time drop hole, jump it straight to the end of the hole —
    /// those serials will never be published, so nothing should wait for
    /// them. Must be called after every `curr_serial` advance.
    fn skip_dropped_hole(&mut self) {
        if let Some((start, end)) = self.pending_drop {
            if self.curr_serial == start {
                self.curr_serial = end;
                self.pending_drop = None;
                self.output_avail.notify_all();
                self.input_not_full.notify_one();
                if self.n_processing == 0 {
                    self.none_processing.notify_one();
                }
            }
        }
    }
}

pub(crate) struct PoolState {
    pub queues: HashMap<QueueId, QueueState>,
    /// Attached queue ids only, in round-robin visitation order
    pub ring: Vec<QueueId>,
    /// Index into `ring`; the dispatch cursor described in spec.md §4.3/§4.4
    pub q_head: usize,
    pub next_queue_id: u32,
    /// Stack of idle worker indices, used to wake one targeted worker per job
    pub free_workers: Vec<usize>,
    pub njobs: usize,
    pub nwaiting: usize,
    pub shutdown: bool,
    pub stats: PoolStatsInner,
}

impl PoolState {
    pub(crate) fn alloc_queue(&mut self, qsize: usize, output_suppressed: bool) -> QueueId {
        let id = QueueId::new(self.next_queue_id);
        self.next_queue_id += 1;
        self.queues.insert(id, QueueState::new(qsize, output_suppressed));
        self.ring.push(id);
        id
    }

    pub(crate) fn attach(&mut self, id: QueueId) {
        if let Some(q) = self.queues.get_mut(&id) {
            if !q.attached {
                q.attached = true;
                self.ring.push(id);
            }
        }
    }

    /// Remove `id` from the ring and repair `q_head` if it pointed past the
    /// removed entry (spec.md §9: "Detach must repair q_head").
    pub(crate) fn detach(&mut self, id: QueueId) {
        if let Some(q) = self.queues.get_mut(&id) {
            q.attached = false;
        }
        if let Some(pos) = self.ring.iter().position(|&r| r == id) {
            self.ring.remove(pos);
            if self.ring.is_empty() || self.q_head >= self.ring.len() {
                self.q_head = 0;
            }
        }
    }
}

/// Owns the worker threads, the single shared mutex, and the circular list
/// of attached queues.
///
/// Create with [`Pool::new`] or [`Pool::with_config`]; both return an
/// `Arc<Pool>` since every attached [`crate::Queue`] holds a reference back
/// to its pool.
pub struct Pool {
    pub(crate) state: Mutex<PoolState>,
    /// One condvar per worker, indexed by worker index; stable for the life
    /// of the pool, so no locking is needed to reach a specific one.
    worker_parks: Vec<Condvar>,
    handles: Mutex<Vec<JoinHandle<()>>>,
    shutdown_called: AtomicBool,
    n_workers: usize,
    debug_logging: bool,
}

impl Pool {
    /// Create a pool with `n` worker threads and default configuration
    pub fn new(n: usize) -> Result<Arc<Pool>, PoolError> {
        Self::with_config(PoolConfig::new().num_workers(n))
    }

    /// Create a pool from an explicit [`PoolConfig`]
    ///
    /// If any worker thread fails to spawn, already-spawned workers are
    /// signalled to exit and joined before this returns an error — a
    /// half-started pool is never handed back to the caller.
    pub fn with_config(config: PoolConfig) -> Result<Arc<Pool>, PoolError> {
        config.validate().map_err(PoolError::InvalidConfig)?;
        let n = config.num_workers;

        if config.debug_logging {
            jobpool_core::kprint::set_log_level(jobpool_core::kprint::LogLevel::Debug);
        }

        let pool = Arc::new(Pool {
            state: Mutex::new(PoolState {
                queues: HashMap::new(),
                ring: Vec::new(),
                q_head: 0,
                next_queue_id: 0,
                free_workers: Vec::with_capacity(n),
                njobs: 0,
                nwaiting: 0,
                shutdown: false,
                stats: PoolStatsInner::default(),
            }),
            worker_parks: (0..n).map(|_| Condvar::new()).collect(),
            handles: Mutex::new(Vec::with_capacity(n)),
            shutdown_called: AtomicBool::new(false),
            n_workers: n,
            debug_logging: config.debug_logging,
        });

        let mut handles = Vec::with_capacity(n);
        for worker_id in 0..n {
            let pool_ref = Arc::clone(&pool);
            let spawned = thread::Builder::new()
                .name(format!("jobpool-worker-{}", worker_id))
                .spawn(move || worker_loop(pool_ref, worker_id));
            match spawned {
                Ok(h) => handles.push(h),
                Err(_) => {
                    kerror!("failed to spawn worker {}, rolling back", worker_id);
                    pool.state.lock().unwrap().shutdown = true;
                    for cv in &pool.worker_parks {
                        cv.notify_all();
                    }
                    for h in handles {
                        let _ = h.join();
                    }
                    return Err(PoolError::SpawnFailed);
                }
            }
        }
        *pool.handles.lock().unwrap() = handles;

        kinfo!("pool started with {} workers", n);
        Ok(pool)
    }

    /// Number of worker threads owned by this pool
    pub fn num_workers(&self) -> usize {
        self.n_workers
    }

    /// Take a consistent snapshot of pool-wide counters
    pub fn stats(&self) -> PoolStats {
        let guard = self.state.lock().unwrap();
        PoolStats {
            jobs_dispatched: guard.stats.jobs_dispatched,
            jobs_completed: guard.stats.jobs_completed,
            jobs_dropped_on_shutdown: guard.stats.jobs_dropped_on_shutdown,
            workers_idle: guard.nwaiting,
            workers_busy: self.n_workers.saturating_sub(guard.nwaiting),
            avg_job_latency: guard.stats.job_latency.as_duration(),
        }
    }

    /// Shut the pool down.
    ///
    /// `kill = false` drains every queued and in-flight job before any
    /// worker exits: workers keep pulling runnable work from every attached
    /// queue and only stop once nothing runnable remains anywhere in the
    /// pool. `kill = true` discards every job still sitting in an input
    /// list right away; each worker still finishes the single job it is
    /// currently executing outside the lock (a callback is never aborted
    /// mid-run), then exits without looking for more work.
    ///
    /// Attached queues are not destroyed by this call — the caller is
    /// expected to detach them beforehand — but every attached queue's
    /// shutdown flag is set and its condition variables are broadcast so
    /// that a consumer or producer parked on it wakes up rather than hanging
    /// forever on a pool that is gone.
    pub fn shutdown(&self, kill: bool) {
        if self.shutdown_called.swap(true, Ordering::SeqCst) {
            return;
        }

        {
            let mut guard = self.state.lock().unwrap();
            guard.shutdown = true;
            let mut total_dropped = 0u64;
            for q in guard.queues.values_mut() {
                if kill && !q.input.is_empty() {
                    let dropped = q.input.len() as u64;
                    q.input.clear();
                    q.stats.dropped_on_shutdown += dropped;
                    total_dropped += dropped;
                    let start = q.curr_serial + q.n_processing as u64;
                    let end = q.next_serial;
                    q.pending_drop = match q.pending_drop {
                        Some((s, _)) => Some((s, end)),
                        None => Some((start, end)),
                    };
                    q.skip_dropped_hole();
                }
                q.shutdown = true;
                q.output_avail.notify_all();
                q.input_not_full.notify_all();
                q.input_empty.notify_all();
                q.none_processing.notify_all();
            }
            guard.stats.jobs_dropped_on_shutdown += total_dropped;
            guard.njobs = guard.njobs.saturating_sub(total_dropped as usize);
        }

        for cv in &self.worker_parks {
            cv.notify_all();
        }

        let handles = std::mem::take(&mut *self.handles.lock().unwrap());
        for h in handles {
            let _ = h.join();
        }
        kinfo!("pool shut down (kill={})", kill);
    }

    pub(crate) fn is_debug_logging(&self) -> bool {
        self.debug_logging
    }

    pub(crate) fn wake_one(&self, state: &mut PoolState) {
        if let Some(widx) = state.free_workers.pop() {
            state.nwaiting = state.nwaiting.saturating_sub(1);
            self.worker_parks[widx].notify_one();
        }
    }
}

impl Drop for Pool {
    fn drop(&mut self) {
        if !self.shutdown_called.load(Ordering::SeqCst) {
            kwarn!("pool dropped without an explicit shutdown() call; killing workers");
            Pool::shutdown(self, true);
        }
    }
}

/// Find a runnable queue starting at `q_head`, matching spec.md §4.4 step 1:
/// a queue is runnable if it has pending input and, when not
/// output-suppressed, has not hit its output-side admission bound. A
/// queue's own shutdown flag does not make it non-runnable — queued and
/// in-flight jobs keep draining after `queue_shutdown`; only a pool-wide
/// kill empties the input list outright.
fn find_runnable(state: &mut PoolState) -> Option<QueueId> {
    let len = state.ring.len();
    if len == 0 {
        return None;
    }
    for i in 0..len {
        let idx = (state.q_head + i) % len;
        let id = state.ring[idx];
        let q = match state.queues.get(&id) {
            Some(q) => q,
            None => continue,
        };
        if q.input.is_empty() {
            continue;
        }
        if !q.output_suppressed && q.output.len() + q.n_processing >= q.qsize {
            continue;
        }
        state.q_head = (idx + 1) % len;
        return Some(id);
    }
    None
}

/// The worker dispatch loop (spec.md §4.4)
fn worker_loop(pool: Arc<Pool>, worker_id: usize) {
    jobpool_core::kprint::set_worker_id(worker_id as u32);
    kdebug!("worker started");

    let mut guard = pool.state.lock().unwrap();
    loop {
        let runnable = find_runnable(&mut guard);
        let qid = match runnable {
            Some(qid) => qid,
            None => {
                if guard.shutdown {
                    break;
                }
                guard.free_workers.push(worker_id);
                guard.nwaiting += 1;
                guard = pool.worker_parks[worker_id].wait(guard).unwrap();
                continue;
            }
        };

        let q = guard.queues.get_mut(&qid).unwrap();
        let job = q.input.pop_front().expect("runnable queue must have input");
        q.n_processing += 1;
        guard.njobs = guard.njobs.saturating_sub(1);
        if q.input.is_empty() {
            q.input_empty.notify_one();
        }
        jobpool_core::kprint::set_queue_id(qid.as_u32());

        // Run the callback outside the lock — the single place in the loop
        // where no pool state may be touched.
        drop(guard);
        let started = Instant::now();
        let payload = (job.func)(job.arg);
        let elapsed = started.elapsed();
        let serial = job.serial;
        guard = pool.state.lock().unwrap();

        guard.stats.jobs_completed += 1;
        guard.stats.job_latency.sample(elapsed);

        // The queue may be gone only if the caller violated the documented
        // `Queue::drop` precondition (flush before the last handle drops);
        // guard against that defensively rather than panicking a worker.
        if let Some(q) = guard.queues.get_mut(&qid) {
            if q.output_suppressed {
                q.n_processing -= 1;
                q.curr_serial += 1;
                q.stats.delivered += 1;
                q.skip_dropped_hole();
                q.input_not_full.notify_one();
                if q.n_processing == 0 {
                    q.none_processing.notify_one();
                }
            } else {
                // Serial gate: wait until this job's predecessors have been
                // published, enforcing strictly ordered delivery without a
                // per-serial queue. `output_avail` is shared and broadcast
                // by every publisher because multiple workers can be
                // holding non-consecutive serials at once.
                loop {
                    let q = guard.queues.get(&qid).unwrap();
                    if serial.as_u64() == q.curr_serial {
                        break;
                    }
                    let cv = q.output_avail.clone();
                    guard = cv.wait(guard).unwrap();
                }

                let q = guard.queues.get_mut(&qid).unwrap();
                q.output.push_back(JobResult::new(serial, payload));
                q.curr_serial += 1;
                q.stats.delivered += 1;
                q.n_processing -= 1;
                q.skip_dropped_hole();
                q.output_avail.notify_all();
                q.input_not_full.notify_one();
                if q.n_processing == 0 {
                    q.none_processing.notify_one();
                }
            }
        }

        jobpool_core::kprint::clear_queue_id();
    }

    drop(guard);
    jobpool_core::kprint::clear_worker_id();
    kdebug!("worker exiting");
}
