//! Core types for the energy API dashboard
//!
//! This crate provides the error taxonomy, startup configuration and the
//! static endpoint catalog shared by the client and the server.

pub mod catalog;
pub mod config;
pub mod error;

// Re-exports
pub use catalog::{
    ApiGroup, Catalog, ClientDefaults, HttpMethod, OperationDescriptor, ParamKind, ParamSpec,
};
pub use config::{EdashConfig, LogFormat};
pub use error::{Error, Result};
