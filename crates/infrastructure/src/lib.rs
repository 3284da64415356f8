//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod http_auth_provider;
mod in_memory_rate_limit_repository;
mod in_memory_session_repository;
mod postgres_rate_limit_repository;
mod postgres_session_repository;

pub use http_auth_provider::{AuthProviderConfig, HttpAuthProvider};
pub use in_memory_rate_limit_repository::InMemoryRateLimitRepository;
pub use in_memory_session_repository::InMemorySessionRepository;
pub use postgres_rate_limit_repository::PostgresRateLimitRepository;
pub use postgres_session_repository::PostgresSessionRepository;
