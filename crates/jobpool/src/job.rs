//! Job and result records
//!
//! The pool never inspects a payload's contents; `Box<dyn Any + Send>` is the
//! opaque carrier the core moves around without understanding.

use jobpool_core::{QueueId, Serial};
use std::any::Any;
use std::fmt;

/// Signature every dispatched job must satisfy: takes the opaque argument,
/// produces an opaque return value, and may run on any worker thread.
pub type JobFn = dyn FnOnce(Box<dyn Any + Send>) -> Box<dyn Any + Send> + Send;

/// A unit of work waiting in, or being drained from, a queue's input list
pub(crate) struct Job {
    pub func: Box<JobFn>,
    pub arg: Box<dyn Any + Send>,
    pub queue: QueueId,
    pub serial: Serial,
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Job")
            .field("queue", &self.queue)
            .field("serial", &self.serial)
            .finish()
    }
}

/// The output of one completed, non-suppressed job
///
/// Results are produced in strictly increasing serial order within a queue.
/// `JobResult` owns its payload; dropping it frees the payload, which is the
/// Rust equivalent of the original design's `delete_result(r, free_data)` —
/// there is no separate "keep the payload alive" mode because ownership
/// already tracks that precisely.
pub struct JobResult {
    serial: Serial,
    payload: Box<dyn Any + Send>,
}

impl JobResult {
    pub(crate) fn new(serial: Serial, payload: Box<dyn Any + Send>) -> Self {
        JobResult { serial, payload }
    }

    /// The serial number of the job that produced this result
    #[inline]
    pub fn serial(&self) -> Serial {
        self.serial
    }

    /// Consume the result, returning the opaque payload
    #[inline]
    pub fn into_payload(self) -> Box<dyn Any + Send> {
        self.payload
    }

    /// Consume the result, downcasting the payload to a concrete type
    ///
    /// Returns `self` unchanged if the payload is not of type `T`.
    pub fn downcast<T: 'static>(self) -> Result<T, Self> {
        match self.payload.downcast::<T>() {
            Ok(boxed) => Ok(*boxed),
            Err(payload) => Err(JobResult { serial: self.serial, payload }),
        }
    }
}

impl fmt::Debug for JobResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobResult").field("serial", &self.serial).finish()
    }
}
