//! Deployment API transport and resource model.
//!
//! This module provides the HTTP client used against both deployments and
//! the opaque resource records it exchanges.

mod client;
mod resource;

pub use client::{encode_segment, ApiClient};
pub use resource::{Resource, ResourceSet};
