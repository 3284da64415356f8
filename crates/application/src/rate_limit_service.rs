//! Dual-window rate limiting ports and application service.
//!
//! Every privileged handler asks this service for admission before running
//! its business logic. Calls are counted per (identifier, kind, function)
//! in wall-clock minute and hour buckets persisted in the shared store; the
//! more restrictive window wins. The limiter is advisory: concurrent
//! invocations coordinate only through the store, and storage failures fail
//! open so the protected function stays available when the limiter's own
//! storage is not.

mod config;
mod ports;
mod service;
#[cfg(test)]
mod tests;

pub use config::QuotaConfig;
pub use ports::RateLimitWindowRepository;
pub use service::{RateLimitDecision, RateLimitService};
