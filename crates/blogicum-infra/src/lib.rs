//! # Blogicum Infrastructure
//!
//! Concrete implementations of the ports defined in `blogicum-core`.
//!
//! ## Feature Flags
//!
//! - `full` (default) - All features enabled
//! - `minimal` - No external dependencies, in-memory only
//! - `postgres` - PostgreSQL persistence via SeaORM
//! - `auth` - JWT + Argon2 authentication

pub mod clock;
pub mod database;
pub mod memory;
pub mod session;

#[cfg(feature = "auth")]
pub mod auth;

// Re-exports - In-Memory
pub use clock::{FixedClock, SystemClock};
pub use database::DatabaseConnections;
pub use memory::InMemoryBlogStore;
pub use session::InMemoryRevocationStore;

#[cfg(feature = "auth")]
pub use auth::{Argon2PasswordService, JwtConfig, JwtTokenService};
