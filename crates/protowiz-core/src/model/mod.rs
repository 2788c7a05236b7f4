//! protowiz data models.
//!
//! The generator never inspects source code. The host program hands it a
//! [`Registry`]: an explicit list of model and service declarations, built
//! either with the typed registration calls below or by parsing a JSON
//! descriptor file (see [`parse`]).
//!
//! Declarations are plain data. Policy (naming rules, method shape, type
//! support) is applied later by `validate` and `discovery`.

use serde::{Deserialize, Serialize};

pub mod descriptor;
pub mod parse;
pub mod types;

pub use descriptor::{
    Cardinality, FieldDescriptor, MessageCatalog, MessageDescriptor, ServiceGraph, ServiceRecord,
    WireScalar, WireType,
};
pub use types::TypeDescriptor;

fn marked_by_default() -> bool {
    true
}

/// A declared data model (a message candidate).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelDecl {
    pub name: String,
    /// The model marker. Request/response types are usually unmarked.
    #[serde(default)]
    pub marked: bool,
    #[serde(default)]
    pub fields: Vec<FieldDecl>,
}

impl ModelDecl {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            marked: false,
            fields: Vec::new(),
        }
    }

    pub fn marked(mut self) -> Self {
        self.marked = true;
        self
    }

    pub fn field(mut self, name: impl Into<String>, ty: TypeDescriptor) -> Self {
        self.fields.push(FieldDecl {
            name: name.into(),
            ty,
            nullable: false,
        });
        self
    }

    /// Add a field whose domain type is `Option<T>`.
    pub fn nullable_field(mut self, name: impl Into<String>, ty: TypeDescriptor) -> Self {
        self.fields.push(FieldDecl {
            name: name.into(),
            ty,
            nullable: true,
        });
        self
    }
}

/// A declared property of a model, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDecl {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeDescriptor,
    #[serde(default)]
    pub nullable: bool,
}

/// A declared service implementation type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDecl {
    pub name: String,
    /// The service marker.
    #[serde(default = "marked_by_default")]
    pub marked: bool,
    /// Models associated explicitly through the service marker.
    #[serde(default)]
    pub models: Vec<String>,
    #[serde(default)]
    pub interfaces: Vec<InterfaceDecl>,
}

impl ServiceDecl {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            marked: true,
            models: Vec::new(),
            interfaces: Vec::new(),
        }
    }

    pub fn unmarked(mut self) -> Self {
        self.marked = false;
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.models.push(model.into());
        self
    }

    pub fn interface(mut self, iface: InterfaceDecl) -> Self {
        self.interfaces.push(iface);
        self
    }
}

/// The contract a service implements (a Rust trait in the generated code).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceDecl {
    pub name: String,
    #[serde(default = "marked_by_default")]
    pub marked: bool,
    #[serde(default)]
    pub methods: Vec<MethodDecl>,
}

impl InterfaceDecl {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            marked: true,
            methods: Vec::new(),
        }
    }

    pub fn unmarked(mut self) -> Self {
        self.marked = false;
        self
    }

    pub fn method(mut self, method: MethodDecl) -> Self {
        self.methods.push(method);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodDecl {
    pub name: String,
    #[serde(default)]
    pub params: Vec<TypeDescriptor>,
    pub returns: ReturnShape,
}

impl MethodDecl {
    /// The conforming shape: one message in, one async message out.
    pub fn unary(name: impl Into<String>, input: &str, output: &str) -> Self {
        Self {
            name: name.into(),
            params: vec![TypeDescriptor::named(input)],
            returns: ReturnShape::Async(TypeDescriptor::named(output)),
        }
    }
}

/// How a method hands back its result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturnShape {
    /// A single-result asynchronous value (`async fn -> T`).
    Async(TypeDescriptor),
    /// A stream of values.
    Stream(TypeDescriptor),
    /// A plain synchronous value.
    Blocking(TypeDescriptor),
    Unit,
}

/// The explicit type universe handed to the generator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registry {
    #[serde(default)]
    pub models: Vec<ModelDecl>,
    #[serde(default)]
    pub services: Vec<ServiceDecl>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_model(&mut self, model: ModelDecl) -> &mut Self {
        self.models.push(model);
        self
    }

    pub fn register_service(&mut self, service: ServiceDecl) -> &mut Self {
        self.services.push(service);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty() && self.services.is_empty()
    }

    /// Look up a model by name. First declaration wins.
    pub fn model(&self, name: &str) -> Option<&ModelDecl> {
        self.models.iter().find(|m| m.name == name)
    }

    /// Service declarations carrying the service marker, in registration order.
    pub fn marked_services(&self) -> impl Iterator<Item = &ServiceDecl> {
        self.services.iter().filter(|s| s.marked)
    }

    /// Names of models carrying the model marker.
    pub fn marked_models(&self) -> impl Iterator<Item = &str> {
        self.models.iter().filter(|m| m.marked).map(|m| m.name.as_str())
    }
}
