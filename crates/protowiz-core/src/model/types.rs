//! Domain field type descriptors.
//!
//! `TypeDescriptor` is the closed set of domain field kinds a registry can
//! declare. Descriptor files spell them with a compact expression syntax:
//!
//! ```text
//! int32  int64  uint32  uint64  bool  float  double  decimal  string
//! timestamp  bytes  byte  char  int8  int16  uint16
//! string[]          fixed array of T
//! list<Person>      ordered list of T
//! map<string,int32>
//! Person            any other identifier names a declared model
//! ```
//!
//! Rust spellings (`i32`, `u64`, `f64`, `Vec<T>`, `String`, ...) are accepted
//! as aliases. Printing always yields the canonical spelling, so
//! `parse(display(t)) == t`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::{ProtowizError, ProtowizResult};
use crate::naming::is_identifier;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TypeDescriptor {
    Int8,
    Int16,
    Int32,
    Int64,
    /// A single byte. Only meaningful as the element of a byte sequence.
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Bool,
    Float,
    Double,
    Decimal,
    String,
    Char,
    Timestamp,
    Bytes,
    Array(Box<TypeDescriptor>),
    List(Box<TypeDescriptor>),
    Map(Box<TypeDescriptor>, Box<TypeDescriptor>),
    Named(String),
}

impl TypeDescriptor {
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    pub fn array(inner: TypeDescriptor) -> Self {
        Self::Array(Box::new(inner))
    }

    pub fn list(inner: TypeDescriptor) -> Self {
        Self::List(Box::new(inner))
    }

    pub fn map(key: TypeDescriptor, value: TypeDescriptor) -> Self {
        Self::Map(Box::new(key), Box::new(value))
    }

    /// True for `Array`/`List` element sequences.
    pub fn is_sequence(&self) -> bool {
        matches!(self, Self::Array(_) | Self::List(_))
    }

    /// The element type of a sequence.
    pub fn element(&self) -> Option<&TypeDescriptor> {
        match self {
            Self::Array(inner) | Self::List(inner) => Some(inner.as_ref()),
            _ => None,
        }
    }

    /// Model name referenced by this type, directly or as a sequence element.
    pub fn referenced_model(&self) -> Option<&str> {
        match self {
            Self::Named(name) => Some(name.as_str()),
            Self::Array(inner) | Self::List(inner) => match inner.as_ref() {
                Self::Named(name) => Some(name.as_str()),
                _ => None,
            },
            _ => None,
        }
    }

    /// Parse a type expression.
    pub fn parse(expr: &str) -> ProtowizResult<Self> {
        let s = expr.trim();
        if s.is_empty() {
            return Err(ProtowizError::invalid_argument("empty type expression"));
        }

        if let Some(inner) = s.strip_suffix("[]") {
            return Ok(Self::array(Self::parse(inner)?));
        }

        if let Some(inner) = generic_args(s, &["list", "vec"]) {
            return Ok(Self::list(Self::parse(inner)?));
        }

        if let Some(inner) = generic_args(s, &["map", "hashmap", "btreemap"]) {
            let (k, v) = split_top_level_comma(inner).ok_or_else(|| {
                ProtowizError::invalid_argument(format!("map type needs two arguments: {s}"))
            })?;
            return Ok(Self::map(Self::parse(k)?, Self::parse(v)?));
        }

        if let Some(kw) = keyword(s) {
            return Ok(kw);
        }

        if !is_identifier(s) {
            return Err(ProtowizError::invalid_argument(format!(
                "invalid type expression: {s}"
            )));
        }

        Ok(Self::Named(s.to_string()))
    }
}

fn keyword(s: &str) -> Option<TypeDescriptor> {
    let t = match s {
        "int8" | "i8" => TypeDescriptor::Int8,
        "int16" | "i16" => TypeDescriptor::Int16,
        "int32" | "i32" => TypeDescriptor::Int32,
        "int64" | "i64" => TypeDescriptor::Int64,
        "uint8" | "u8" | "byte" => TypeDescriptor::UInt8,
        "uint16" | "u16" => TypeDescriptor::UInt16,
        "uint32" | "u32" => TypeDescriptor::UInt32,
        "uint64" | "u64" => TypeDescriptor::UInt64,
        "bool" => TypeDescriptor::Bool,
        "float" | "f32" => TypeDescriptor::Float,
        "double" | "f64" => TypeDescriptor::Double,
        "decimal" => TypeDescriptor::Decimal,
        "string" | "String" => TypeDescriptor::String,
        "char" => TypeDescriptor::Char,
        "timestamp" => TypeDescriptor::Timestamp,
        "bytes" => TypeDescriptor::Bytes,
        _ => return None,
    };
    Some(t)
}

/// If `s` is `name<...>` for one of `names` (case-insensitive), return the inside.
fn generic_args<'a>(s: &'a str, names: &[&str]) -> Option<&'a str> {
    let open = s.find('<')?;
    if !s.ends_with('>') {
        return None;
    }
    let head = &s[..open];
    if !names.iter().any(|n| head.eq_ignore_ascii_case(n)) {
        return None;
    }
    Some(&s[open + 1..s.len() - 1])
}

fn split_top_level_comma(s: &str) -> Option<(&str, &str)> {
    let mut depth = 0usize;
    for (i, c) in s.char_indices() {
        match c {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => return Some((&s[..i], &s[i + 1..])),
            _ => {}
        }
    }
    None
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int8 => f.write_str("int8"),
            Self::Int16 => f.write_str("int16"),
            Self::Int32 => f.write_str("int32"),
            Self::Int64 => f.write_str("int64"),
            Self::UInt8 => f.write_str("uint8"),
            Self::UInt16 => f.write_str("uint16"),
            Self::UInt32 => f.write_str("uint32"),
            Self::UInt64 => f.write_str("uint64"),
            Self::Bool => f.write_str("bool"),
            Self::Float => f.write_str("float"),
            Self::Double => f.write_str("double"),
            Self::Decimal => f.write_str("decimal"),
            Self::String => f.write_str("string"),
            Self::Char => f.write_str("char"),
            Self::Timestamp => f.write_str("timestamp"),
            Self::Bytes => f.write_str("bytes"),
            Self::Array(inner) => write!(f, "{inner}[]"),
            Self::List(inner) => write!(f, "list<{inner}>"),
            Self::Map(k, v) => write!(f, "map<{k},{v}>"),
            Self::Named(name) => f.write_str(name),
        }
    }
}

impl FromStr for TypeDescriptor {
    type Err = ProtowizError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for TypeDescriptor {
    type Error = ProtowizError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<TypeDescriptor> for String {
    fn from(value: TypeDescriptor) -> Self {
        value.to_string()
    }
}
