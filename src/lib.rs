//! Declarative Microsoft Graph (beta) resources
//!
//! Every managed entity is a [`generic::ResourceDefinition`]: an attribute
//! [`schema::Schema`] plus the glue that maps it onto Graph payloads. The
//! [`provider::Provider`] registers them all; [`generic::GenericResource`] drives
//! their lifecycle through a [`graph::GraphClient`].

pub mod config;
pub mod error;
pub mod generic;
pub mod graph;
pub mod provider;
pub mod resources;
pub mod schema;
pub mod state;

pub use error::{ProviderError, Result};
pub use provider::Provider;
