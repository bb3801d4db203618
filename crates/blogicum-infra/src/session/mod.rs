//! Token revocation stores backing logout.

mod memory;

pub use memory::InMemoryRevocationStore;
