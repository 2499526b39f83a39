//! # Blog Core
//!
//! The domain layer of the blog.
//! This crate contains the post entity, form binding, the per-request unit of
//! work and the request handler, with zero infrastructure dependencies.

pub mod controller;
pub mod domain;
pub mod error;
pub mod form;
pub mod gateway;
pub mod ports;

pub use controller::{Outcome, PostController, Route, View};
pub use error::{ControllerError, PersistenceError};
pub use gateway::{ManagedPost, PostGateway};
