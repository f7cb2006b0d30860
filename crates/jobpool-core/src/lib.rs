//! # jobpool-core
//!
//! Engine-agnostic types shared by the jobpool worker pool: identifiers,
//! error types, kernel-style debug logging, and environment variable
//! helpers.
//!
//! This crate has no dependency on the pool/queue/worker engine itself
//! (`jobpool`); it exists so the logging and error vocabulary can be reused
//! by embedders without pulling in the scheduling machinery.
//!
//! ## Modules
//!
//! - `id` - `QueueId` and `Serial` identifier types
//! - `error` - `PoolError` / `DispatchError`
//! - `kprint` - Kernel-style debug printing macros
//! - `env` - Environment variable utilities

#![allow(dead_code)]

pub mod env;
pub mod error;
pub mod id;
pub mod kprint;

pub use env::{env_get, env_get_bool, env_get_opt, env_get_str, env_is_set};
pub use error::{DispatchError, PoolError, PoolResult};
pub use id::{QueueId, Serial};
