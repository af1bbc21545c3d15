//! API middleware stack.
//!
//! Execution order (outermost → innermost):
//! 1. Rate limiter - reject early, save resources
//! 2. Access logger - method, path, status, latency

pub mod audit;
pub mod rate;
