//! protowiz-core
//!
//! Core of the protowiz gRPC scaffolding generator:
//! - Declarative model/service registry and its JSON descriptor form
//! - Discovery and validation into a service graph
//! - Type mapping from domain types to proto3 wire types
//! - Emitters for the proto schema, converters, server adapters and client proxies
//! - A staged pipeline that produces an in-memory artifact bundle
//!
//! The crate performs no filesystem or network I/O.

pub mod bundle;
pub mod config;
pub mod discovery;
pub mod emit;
pub mod errors;
pub mod mapper;
pub mod model;
pub mod naming;
pub mod pipeline;
pub mod sources;
pub mod validate;

pub use crate::errors::{ErrorKind, ProtowizError, ProtowizResult};
pub use crate::pipeline::generate::{
    check, generate, generate_status, generate_with_cancel, GenerationReport, GenerationStats,
    GenerationStatus,
};
pub use crate::pipeline::CancelFlag;

/// Default settings.
pub mod defaults {
    /// Proto package used when none is configured.
    pub const NAMESPACE: &str = "grpc_generated";
    /// Attribute prefixes that mark models and services in user sources.
    pub const MARKER_ATTRIBUTES: &[&str] = &["#[grpc_model", "#[grpc_service"];
    /// Imports of the marker crate.
    pub const MARKER_IMPORTS: &[&str] = &["use protowiz_markers", "use protowiz::"];
    /// Largest user source file copied into the output tree (1 MiB).
    pub const MAX_SOURCE_BYTES: usize = 1024 * 1024;
}

/// Convenience re-exports.
pub mod prelude {
    pub use crate::bundle::{Artifact, ArtifactBundle, ArtifactKind};
    pub use crate::config::{validate_config, CratePaths, GeneratorConfig, NamingConfig, OutputLayout};
    pub use crate::model::parse::{parse_descriptor, DescriptorFile, DEFAULT_MAX_DESCRIPTOR_BYTES};
    pub use crate::model::{
        FieldDecl, InterfaceDecl, MethodDecl, ModelDecl, Registry, ReturnShape, ServiceDecl,
        ServiceGraph, TypeDescriptor,
    };
    pub use crate::naming::Naming;
    pub use crate::pipeline::generate::{
        check, generate, generate_status, generate_with_cancel, GenerationReport, GenerationStatus,
    };
    pub use crate::pipeline::CancelFlag;
    pub use crate::{ProtowizError, ProtowizResult};
}
