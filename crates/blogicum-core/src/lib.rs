//! # Blogicum Core
//!
//! The domain layer of the Blogicum blog service.
//! This crate contains pure business logic with zero infrastructure dependencies:
//! entities, the visibility & authorization policy, validated inputs and the
//! application services that drive the repository ports.

pub mod admin;
pub mod domain;
pub mod error;
pub mod input;
pub mod pagination;
pub mod policy;
pub mod ports;
pub mod services;

pub use error::DomainError;
