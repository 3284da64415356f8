//! Domain entities and invariants for request admission.

#![forbid(unsafe_code)]

mod rate_limit;
mod session;

pub use rate_limit::{IdentifierKind, RateLimitWindow, WindowGranularity};
pub use session::{AuthSessionSnapshot, SessionRecord};
