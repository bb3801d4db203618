//! Application services - the operations behind each endpoint.

mod accounts;
mod blog;

pub use accounts::{AccountService, Session};
pub use blog::{BlogService, CategoryListing, PostDetail, ProfileListing};
