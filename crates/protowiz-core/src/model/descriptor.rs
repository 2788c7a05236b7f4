//! Build-time descriptors derived from a [`Registry`](super::Registry).
//!
//! These types live for a single generation run. They are produced by
//! `discovery`, consumed read-only by the emitters and then dropped.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use super::types::TypeDescriptor;

/// A proto3 scalar type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WireScalar {
    Int32,
    Int64,
    UInt32,
    UInt64,
    Bool,
    Float,
    Double,
    String,
    Bytes,
}

impl WireScalar {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::UInt32 => "uint32",
            Self::UInt64 => "uint64",
            Self::Bool => "bool",
            Self::Float => "float",
            Self::Double => "double",
            Self::String => "string",
            Self::Bytes => "bytes",
        }
    }
}

/// The wire-side type of a field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WireType {
    Scalar(WireScalar),
    /// Reference to another message, by wire name.
    Message(String),
}

impl fmt::Display for WireType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(s) => f.write_str(s.as_str()),
            Self::Message(name) => f.write_str(name),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Cardinality {
    Scalar,
    Repeated,
    Bytes,
}

/// One field of a message, with its wire tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldDescriptor {
    /// Domain field name as declared.
    pub name: String,
    /// Field name in the schema (snake case, timestamps prefixed).
    pub wire_name: String,
    pub domain_type: TypeDescriptor,
    pub wire_type: WireType,
    pub cardinality: Cardinality,
    /// 1-based position among the model's declared fields.
    pub ordinal: u32,
    pub is_nested_message: bool,
    /// Domain field is `Option<T>`. Always true for nested messages.
    pub nullable: bool,
}

impl FieldDescriptor {
    /// The type as written on a schema field line, e.g. `repeated int32`.
    ///
    /// Nullable scalars carry `optional` so presence survives the wire.
    /// Message fields have presence already.
    pub fn schema_type(&self) -> String {
        match self.cardinality {
            Cardinality::Repeated => format!("repeated {}", self.wire_type),
            Cardinality::Scalar | Cardinality::Bytes if self.has_explicit_presence() => {
                format!("optional {}", self.wire_type)
            }
            Cardinality::Scalar | Cardinality::Bytes => self.wire_type.to_string(),
        }
    }

    /// True when the schema marks the field `optional`.
    pub fn has_explicit_presence(&self) -> bool {
        self.nullable && !self.is_nested_message && self.cardinality != Cardinality::Repeated
    }

    /// Domain name of the nested model, when this field references one.
    pub fn nested_model(&self) -> Option<&str> {
        if self.is_nested_message {
            self.domain_type.referenced_model()
        } else {
            None
        }
    }

    /// Scalar domain kind of the field or of its elements.
    pub fn element_type(&self) -> &TypeDescriptor {
        match self.cardinality {
            Cardinality::Repeated => self.domain_type.element().unwrap_or(&self.domain_type),
            Cardinality::Scalar | Cardinality::Bytes => &self.domain_type,
        }
    }
}

/// One schema message, derived from a model declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageDescriptor {
    pub name: String,
    pub wire_name: String,
    pub fields: Vec<FieldDescriptor>,
}

impl MessageDescriptor {
    pub fn has_field_of(&self, ty: &TypeDescriptor) -> bool {
        self.fields.iter().any(|f| f.element_type() == ty)
    }
}

/// Every distinct message of a run, in first-occurrence order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MessageCatalog {
    messages: Vec<MessageDescriptor>,
    #[serde(skip)]
    index: BTreeMap<String, usize>,
}

impl MessageCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a message unless one with the same name exists. Returns true if inserted.
    pub fn insert(&mut self, message: MessageDescriptor) -> bool {
        if self.index.contains_key(&message.name) {
            return false;
        }
        self.index.insert(message.name.clone(), self.messages.len());
        self.messages.push(message);
        true
    }

    pub fn get(&self, name: &str) -> Option<&MessageDescriptor> {
        self.index.get(name).map(|&i| &self.messages[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &MessageDescriptor> {
        self.messages.iter()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// A validated method: one message in, one message out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MethodContract {
    pub name: String,
    pub input: String,
    pub output: String,
}

/// One discovered service and the models it touches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceRecord {
    pub service_name: String,
    /// Service name with the naming suffix stripped.
    pub short_name: String,
    pub interface_name: String,
    pub methods: Vec<MethodContract>,
    /// Ordered set of referenced model names.
    pub referenced_models: Vec<String>,
}

/// Output of discovery: all service records plus the message catalog.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ServiceGraph {
    pub records: Vec<ServiceRecord>,
    pub messages: MessageCatalog,
}

impl ServiceGraph {
    /// Look up a message that discovery guaranteed to exist.
    pub fn message(&self, name: &str) -> crate::ProtowizResult<&MessageDescriptor> {
        self.messages.get(name).ok_or_else(|| {
            crate::ProtowizError::invariant(format!("message {name} missing from catalog"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(name: &str) -> MessageDescriptor {
        MessageDescriptor {
            name: name.to_string(),
            wire_name: format!("Grpc{name}"),
            fields: vec![],
        }
    }

    #[test]
    fn catalog_keeps_first_occurrence() {
        let mut c = MessageCatalog::new();
        assert!(c.insert(msg("B")));
        assert!(c.insert(msg("A")));
        assert!(!c.insert(msg("B")));
        let names: Vec<_> = c.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["B", "A"]);
        assert_eq!(c.len(), 2);
        assert!(c.contains("A"));
    }

    #[test]
    fn repeated_schema_type() {
        let f = FieldDescriptor {
            name: "Tags".to_string(),
            wire_name: "tags".to_string(),
            domain_type: TypeDescriptor::list(TypeDescriptor::String),
            wire_type: WireType::Scalar(WireScalar::String),
            cardinality: Cardinality::Repeated,
            ordinal: 1,
            is_nested_message: false,
            nullable: false,
        };
        assert_eq!(f.schema_type(), "repeated string");
        assert_eq!(f.element_type(), &TypeDescriptor::String);
    }

    #[test]
    fn nullable_scalar_is_optional() {
        let mut f = FieldDescriptor {
            name: "Bio".to_string(),
            wire_name: "bio".to_string(),
            domain_type: TypeDescriptor::String,
            wire_type: WireType::Scalar(WireScalar::String),
            cardinality: Cardinality::Scalar,
            ordinal: 2,
            is_nested_message: false,
            nullable: true,
        };
        assert_eq!(f.schema_type(), "optional string");

        f.is_nested_message = true;
        f.wire_type = WireType::Message("GrpcBio".to_string());
        assert_eq!(f.schema_type(), "GrpcBio");
    }
}
