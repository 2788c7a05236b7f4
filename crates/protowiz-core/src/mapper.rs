//! Type Mapper: domain field type -> wire type and cardinality.
//!
//! Rules, in priority order:
//!
//! 1. scalars map to the proto3 scalar of matching width; `decimal` becomes
//!    `double` (lossy) and `timestamp` becomes `int64` milliseconds since the
//!    Unix epoch, with the wire field renamed by the timestamp prefix;
//! 2. `bytes`, `byte[]` and `list<byte>` become `bytes` (not repeated);
//! 3. `T[]` becomes `repeated` plus the mapping of `T`;
//! 4. `list<T>` is identical to `T[]`;
//! 5. a named type becomes a reference to that model's wire message.
//!
//! Every other kind is rejected. The match is exhaustive, so a new
//! `TypeDescriptor` variant does not compile until it is handled here.

use std::collections::BTreeSet;
use std::fmt;

use crate::errors::{ProtowizError, ProtowizResult};
use crate::model::{
    Cardinality, FieldDescriptor, MessageDescriptor, ModelDecl, TypeDescriptor, WireScalar,
    WireType,
};
use crate::naming::Naming;

/// Result of mapping one domain type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WireMapping {
    pub wire_type: WireType,
    pub cardinality: Cardinality,
}

impl WireMapping {
    fn scalar(s: WireScalar) -> Self {
        Self {
            wire_type: WireType::Scalar(s),
            cardinality: Cardinality::Scalar,
        }
    }

    fn bytes() -> Self {
        Self {
            wire_type: WireType::Scalar(WireScalar::Bytes),
            cardinality: Cardinality::Bytes,
        }
    }

    fn repeated(self) -> Self {
        Self {
            cardinality: Cardinality::Repeated,
            ..self
        }
    }
}

/// Why a domain type has no wire mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Unsupported {
    pub reason: &'static str,
}

impl fmt::Display for Unsupported {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.reason)
    }
}

const fn unsupported(reason: &'static str) -> Unsupported {
    Unsupported { reason }
}

/// Map a domain field type to its wire type.
pub fn map_type(ty: &TypeDescriptor, naming: &Naming<'_>) -> Result<WireMapping, Unsupported> {
    use TypeDescriptor as T;

    match ty {
        T::Int32 => Ok(WireMapping::scalar(WireScalar::Int32)),
        T::Int64 => Ok(WireMapping::scalar(WireScalar::Int64)),
        T::UInt32 => Ok(WireMapping::scalar(WireScalar::UInt32)),
        T::UInt64 => Ok(WireMapping::scalar(WireScalar::UInt64)),
        T::Bool => Ok(WireMapping::scalar(WireScalar::Bool)),
        T::Float => Ok(WireMapping::scalar(WireScalar::Float)),
        T::Double => Ok(WireMapping::scalar(WireScalar::Double)),
        T::Decimal => Ok(WireMapping::scalar(WireScalar::Double)),
        T::String => Ok(WireMapping::scalar(WireScalar::String)),
        T::Timestamp => Ok(WireMapping::scalar(WireScalar::Int64)),
        T::Bytes => Ok(WireMapping::bytes()),
        T::Array(inner) | T::List(inner) => map_sequence(inner, naming),
        T::Named(name) => Ok(WireMapping {
            wire_type: WireType::Message(naming.wire_message(name)),
            cardinality: Cardinality::Scalar,
        }),
        T::Int8 | T::Int16 => Err(unsupported(
            "proto3 has no integer narrower than 32 bits; declare int32",
        )),
        T::UInt8 => Err(unsupported(
            "a single byte has no wire scalar; declare uint32 or bytes",
        )),
        T::UInt16 => Err(unsupported(
            "proto3 has no integer narrower than 32 bits; declare uint32",
        )),
        T::Char => Err(unsupported("char has no wire scalar; declare string")),
        T::Map(..) => Err(unsupported("map fields are not supported")),
    }
}

fn map_sequence(inner: &TypeDescriptor, naming: &Naming<'_>) -> Result<WireMapping, Unsupported> {
    match inner {
        TypeDescriptor::UInt8 => Ok(WireMapping::bytes()),
        TypeDescriptor::Array(_) | TypeDescriptor::List(_) => {
            Err(unsupported("nested sequences are not supported"))
        }
        TypeDescriptor::Map(..) => Err(unsupported("sequences of maps are not supported")),
        other => map_type(other, naming).map(WireMapping::repeated),
    }
}

fn is_timestamp(ty: &TypeDescriptor) -> bool {
    matches!(ty, TypeDescriptor::Timestamp)
        || matches!(ty.element(), Some(TypeDescriptor::Timestamp))
}

/// Derive the message descriptor of a model, fields in declaration order.
pub fn build_message(model: &ModelDecl, naming: &Naming<'_>) -> ProtowizResult<MessageDescriptor> {
    let mut seen = BTreeSet::new();
    let mut fields = Vec::with_capacity(model.fields.len());

    for (idx, field) in model.fields.iter().enumerate() {
        let mapping = map_type(&field.ty, naming).map_err(|u| ProtowizError::UnsupportedType {
            model: model.name.clone(),
            field: field.name.clone(),
            ty: field.ty.to_string(),
            reason: u.reason.to_string(),
        })?;

        let wire_name = naming.wire_field(&field.name, is_timestamp(&field.ty));
        if !seen.insert(wire_name.clone()) {
            return Err(ProtowizError::invalid_argument(format!(
                "model {} has two fields named {wire_name} on the wire",
                model.name
            )));
        }

        let ordinal = u32::try_from(idx + 1).map_err(|_| {
            ProtowizError::invalid_argument(format!("model {} has too many fields", model.name))
        })?;

        let is_nested_message = matches!(mapping.wire_type, WireType::Message(_));
        let single_message = is_nested_message && mapping.cardinality == Cardinality::Scalar;

        fields.push(FieldDescriptor {
            name: field.name.clone(),
            wire_name,
            domain_type: field.ty.clone(),
            wire_type: mapping.wire_type,
            cardinality: mapping.cardinality,
            ordinal,
            is_nested_message,
            nullable: field.nullable || single_message,
        });
    }

    Ok(MessageDescriptor {
        name: model.name.clone(),
        wire_name: naming.wire_message(&model.name),
        fields,
    })
}
