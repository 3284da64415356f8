//! Application services and ports for request admission.

#![forbid(unsafe_code)]

mod rate_limit_service;
mod session_guard_service;

pub use rate_limit_service::{
    QuotaConfig, RateLimitDecision, RateLimitService, RateLimitWindowRepository,
};
pub use session_guard_service::{
    AuthSessionProvider, AuthenticatedUser, ListedSession, NewSession, SessionGuardService,
    SessionListing, SessionRepository, session_id_from_token,
};
