//! Error types for the jobpool worker pool

use core::fmt;

/// Result type for pool-construction and configuration operations
pub type PoolResult<T> = Result<T, PoolError>;

/// Errors that can occur while constructing or configuring a pool
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    /// Failed to spawn one of the pool's worker threads
    SpawnFailed,

    /// Configuration was rejected by `PoolConfig::validate`
    InvalidConfig(&'static str),
}

impl fmt::Display for PoolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoolError::SpawnFailed => write!(f, "failed to spawn worker thread"),
            PoolError::InvalidConfig(reason) => write!(f, "invalid pool configuration: {}", reason),
        }
    }
}

impl std::error::Error for PoolError {}

/// Errors returned by `dispatch`
///
/// A job that fails to dispatch is not queued; ownership of the closure and
/// argument stays with the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchError {
    /// Nonblocking dispatch found the queue at its admission bound
    WouldBlock,

    /// The queue (or the pool) has begun shutting down; no new jobs are admitted
    ShutDown,
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchError::WouldBlock => write!(f, "queue is at capacity"),
            DispatchError::ShutDown => write!(f, "queue is shutting down"),
        }
    }
}

impl std::error::Error for DispatchError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(format!("{}", PoolError::SpawnFailed), "failed to spawn worker thread");
        assert_eq!(
            format!("{}", PoolError::InvalidConfig("num_workers must be at least 1")),
            "invalid pool configuration: num_workers must be at least 1"
        );
        assert_eq!(format!("{}", DispatchError::WouldBlock), "queue is at capacity");
        assert_eq!(format!("{}", DispatchError::ShutDown), "queue is shutting down");
    }
}
