//! HTTP server for the order form
//!
//! [`ServerBuilder`] wires configuration and service backends into a
//! [`ServerHost`], which the REST exposure turns into a router with:
//! - the form description and order submission routes
//! - health check routes

pub mod builder;
pub mod exposure;
pub mod host;
pub mod router;

pub use builder::ServerBuilder;
pub use exposure::RestExposure;
pub use host::ServerHost;
