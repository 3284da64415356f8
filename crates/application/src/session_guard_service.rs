//! Session guard ports and application service.
//!
//! Decides whether a bearer credential is still valid for privileged
//! operations by reconciling two independent sources of truth: the portal's
//! own session rows (authoritative for revocation) and the auth subsystem's
//! live-session records (authoritative for expiry). Listing a user's
//! sessions prunes rows the reconciliation proves stale, so the bookkeeping
//! heals itself as a side effect of normal reads.

mod ports;
mod service;
mod token_claims;

pub use ports::{AuthSessionProvider, AuthenticatedUser, NewSession, SessionRepository};
pub use service::{ListedSession, SessionGuardService, SessionListing};
pub use token_claims::session_id_from_token;
