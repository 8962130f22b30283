//! Shared background executors.
//!
//! Every resolver in the process borrows the same two executors from an
//! [`ExecutorRegistry`]: a single-threaded timer that only schedules, and a
//! worker executor that runs resolution attempts and blocking lookups.
//! Executors are created when the first holder acquires them and shut down
//! when the last holder releases them.

mod registry;

pub use registry::{ExecutorHandle, ExecutorKind, ExecutorRegistry, ExecutorStats};
