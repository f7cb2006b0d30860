//! Pool configuration

use jobpool_core::env::env_get_bool;

/// Configuration for a `Pool`
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Number of worker threads (defaults to `available_parallelism()`)
    pub num_workers: usize,

    /// Enable debug-level logging of dispatch/worker-loop transitions
    pub debug_logging: bool,
}

impl Default for PoolConfig {
    fn default() -> Self {
        let num_cpus = std::thread::available_parallelism().map(|n| n.get()).unwrap_or(4);
        Self {
            num_workers: num_cpus,
            debug_logging: env_get_bool("JOBPOOL_DEBUG", false),
        }
    }
}

impl PoolConfig {
    /// Start from the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of worker threads
    pub fn num_workers(mut self, n: usize) -> Self {
        self.num_workers = n;
        self
    }

    /// Enable or disable debug logging
    pub fn debug_logging(mut self, enable: bool) -> Self {
        self.debug_logging = enable;
        self
    }

    /// Validate the configuration, returning the rejection reason if invalid
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.num_workers == 0 {
            return Err("num_workers must be at least 1");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_has_at_least_one_worker() {
        assert!(PoolConfig::default().num_workers >= 1);
    }

    #[test]
    fn test_validate_rejects_zero_workers() {
        let cfg = PoolConfig::new().num_workers(0);
        assert_eq!(cfg.validate(), Err("num_workers must be at least 1"));
    }

    #[test]
    fn test_builder_chain() {
        let cfg = PoolConfig::new().num_workers(8).debug_logging(true);
        assert_eq!(cfg.num_workers, 8);
        assert!(cfg.debug_logging);
    }
}
