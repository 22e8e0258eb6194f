//! Core types, access policy and collaborator traits for the Connect & Found
//! lost-and-found client.
//!
//! This crate is deliberately free of HTTP and storage dependencies. Every
//! durable operation is delegated to a [`backend::Backend`] implementation;
//! the policy engine in [`visibility`] is pure.

pub mod backend;
pub mod contact;
pub mod error;
pub mod item;
pub mod user;
pub mod viewer;
pub mod visibility;

pub use error::{AuthError, BackendError, Error, Result};
pub use viewer::Viewer;
