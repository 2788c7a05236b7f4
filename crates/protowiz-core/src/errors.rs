//! Error types for protowiz-core.
//!
//! Every failure in the core is fatal for the whole run: there is no
//! continue-on-error mode. Errors carry a human-readable message that the
//! string-based entry point (`generate_status`) hands back to callers verbatim.

use thiserror::Error;

/// Result alias used across the core crate.
pub type ProtowizResult<T> = Result<T, ProtowizError>;

/// Coarse classification of an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The registry violates a naming, shape or typing rule.
    Structural,
    /// Nothing to generate from.
    EmptyInput,
    /// A collaborator (filesystem, network, host) failed.
    Collaborator,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Structural => "structural",
            Self::EmptyInput => "empty-input",
            Self::Collaborator => "collaborator",
        }
    }
}

#[derive(Debug, Error)]
pub enum ProtowizError {
    #[error("{0}")]
    EmptyInput(String),

    #[error("GrpcService names must end with the word '{suffix}': {name}")]
    InvalidServiceName { name: String, suffix: String },

    #[error("services {first} and {second} both reduce to the short name '{short_name}'")]
    ServiceNameCollision {
        short_name: String,
        first: String,
        second: String,
    },

    #[error("Can not find an interface with the service marker on {service}")]
    MissingInterface { service: String },

    #[error("Service method {method} {problem}")]
    MethodArity { method: String, problem: String },

    #[error("Service method {method} must return a single-result async value")]
    MethodReturnShape { method: String },

    #[error("{context} uses {name} which is not a declared model")]
    UnknownModel { context: String, name: String },

    #[error("model {name} is declared more than once")]
    DuplicateModel { name: String },

    #[error("{first} and {second} both generate the identifier {ident}")]
    GeneratedNameCollision {
        ident: String,
        first: String,
        second: String,
    },

    #[error("field {model}.{field} has unsupported type {ty}: {reason}")]
    UnsupportedType {
        model: String,
        field: String,
        ty: String,
        reason: String,
    },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("invariant violated: {0}")]
    Invariant(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("generation cancelled")]
    Cancelled,
}

impl From<std::fmt::Error> for ProtowizError {
    fn from(_: std::fmt::Error) -> Self {
        Self::invariant("failed to render generated text")
    }
}

impl ProtowizError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::Invariant(msg.into())
    }

    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization(msg.into())
    }

    pub fn empty_input(msg: impl Into<String>) -> Self {
        Self::EmptyInput(msg.into())
    }

    pub fn unknown_model(context: impl Into<String>, name: impl Into<String>) -> Self {
        Self::UnknownModel {
            context: context.into(),
            name: name.into(),
        }
    }

    pub fn name_collision(
        ident: impl Into<String>,
        first: impl Into<String>,
        second: impl Into<String>,
    ) -> Self {
        Self::GeneratedNameCollision {
            ident: ident.into(),
            first: first.into(),
            second: second.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptyInput(_) => ErrorKind::EmptyInput,
            Self::Serialization(_) | Self::Cancelled => ErrorKind::Collaborator,
            Self::InvalidServiceName { .. }
            | Self::ServiceNameCollision { .. }
            | Self::MissingInterface { .. }
            | Self::MethodArity { .. }
            | Self::MethodReturnShape { .. }
            | Self::UnknownModel { .. }
            | Self::DuplicateModel { .. }
            | Self::GeneratedNameCollision { .. }
            | Self::UnsupportedType { .. }
            | Self::InvalidArgument(_)
            | Self::Invariant(_) => ErrorKind::Structural,
        }
    }
}
