//! In-memory caching.
//!
//! The only cache this service needs is a single-slot TTL holder for the
//! most recent review fetch; see [`store::TimedCache`].

mod store;

pub use store::{Clock, SystemClock, TimedCache};

#[cfg(test)]
pub(crate) use store::test_clock::ManualClock;
