//! # Blogicum Shared
//!
//! Wire types exchanged with API clients. Kept free of server and domain
//! dependencies so clients can compile it on its own.

pub mod dto;
pub mod response;

pub use response::{ApiResponse, ErrorResponse};
