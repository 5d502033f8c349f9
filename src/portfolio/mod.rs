//! Capital allocation across strategies.
//!
//! - `allocator`: exponentially weighted, performance-driven weights
//! - `shared`: lock-protected handle for concurrent readers
//! - `types`: records exchanged with the strategy and execution layers

mod allocator;
mod shared;
mod types;

pub use allocator::{ConfigurationError, EwaAllocator, DEFAULT_LEARNING_RATE};
pub use shared::SharedAllocator;
pub use types::{AllocationEntry, PerformanceMetric};
