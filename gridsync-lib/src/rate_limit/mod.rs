//! Concurrency limiting for simultaneous requests.

mod concurrency;

pub use concurrency::ConcurrencyLimiter;
