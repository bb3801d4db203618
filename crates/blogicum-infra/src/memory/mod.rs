//! In-memory persistence.

mod store;

pub use store::InMemoryBlogStore;

#[cfg(test)]
mod tests;
