//! Converter emitter.
//!
//! One Rust module per distinct message with a domain -> wire function, a
//! wire -> domain function, their list variants and `From` impls delegating
//! to them. Field expressions are built per cardinality:
//!
//! | field                     | domain -> wire                  | wire -> domain                     |
//! |---------------------------|---------------------------------|------------------------------------|
//! | scalar                    | copy or convert                 | copy or convert back               |
//! | nullable scalar / bytes   | `Option::map`                   | `Option::map`                      |
//! | nested message            | `Option::map(from_x)`           | `Option::map(from_grpc_x)`         |
//! | sequence                  | move, or map each element       | move, or map each element          |
//! | nullable sequence         | `unwrap_or_default()` first     | `Some` only when non-empty         |
//!
//! Decimals travel as `f64` and timestamps as epoch milliseconds, so those
//! two kinds do not round-trip exactly.

use crate::config::GeneratorConfig;
use crate::cw_writeln;
use crate::errors::ProtowizResult;
use crate::model::{Cardinality, FieldDescriptor, MessageDescriptor, TypeDescriptor};
use crate::naming::Naming;

use super::code_writer::CodeWriter;
use super::GENERATED_NOTICE;

/// How a single (non-sequence) value crosses the boundary.
enum ValueConversion<'n> {
    Identity,
    Timestamp,
    Decimal,
    Message(&'n str),
}

impl<'n> ValueConversion<'n> {
    fn of(ty: &'n TypeDescriptor) -> Self {
        match ty {
            TypeDescriptor::Timestamp => Self::Timestamp,
            TypeDescriptor::Decimal => Self::Decimal,
            TypeDescriptor::Named(name) => Self::Message(name),
            _ => Self::Identity,
        }
    }

    fn to_wire(&self, naming: &Naming<'_>, v: &str) -> String {
        match self {
            Self::Identity => v.to_string(),
            Self::Timestamp => format!("{v}.timestamp_millis()"),
            Self::Decimal => format!("{v}.to_f64().unwrap_or_default()"),
            Self::Message(m) => format!(
                "super::{}::{}({v})",
                naming.converter_module(m),
                naming.to_wire_fn(m)
            ),
        }
    }

    fn to_domain(&self, naming: &Naming<'_>, v: &str) -> String {
        match self {
            Self::Identity => v.to_string(),
            Self::Timestamp => format!(
                "chrono::DateTime::<chrono::Utc>::from_timestamp_millis({v}).unwrap_or_default()"
            ),
            Self::Decimal => format!("rust_decimal::Decimal::from_f64({v}).unwrap_or_default()"),
            Self::Message(m) => format!(
                "super::{}::{}({v})",
                naming.converter_module(m),
                naming.to_domain_fn(m)
            ),
        }
    }

    /// A function path usable directly in `map`, when one exists.
    fn message_fn(&self, naming: &Naming<'_>, to_wire: bool, list: bool) -> Option<String> {
        let Self::Message(m) = self else {
            return None;
        };
        let func = match (to_wire, list) {
            (true, false) => naming.to_wire_fn(m),
            (true, true) => naming.to_wire_list_fn(m),
            (false, false) => naming.to_domain_fn(m),
            (false, true) => naming.to_domain_list_fn(m),
        };
        Some(format!("super::{}::{func}", naming.converter_module(m)))
    }

    fn is_identity(&self) -> bool {
        matches!(self, Self::Identity)
    }
}

/// `value.map(|v| f(v))`, or `value.map(path)` for message converters.
fn map_option(conv: &ValueConversion<'_>, naming: &Naming<'_>, value: &str, to_wire: bool) -> String {
    if let Some(path) = conv.message_fn(naming, to_wire, false) {
        return format!("{value}.map({path})");
    }
    let body = if to_wire {
        conv.to_wire(naming, "v")
    } else {
        conv.to_domain(naming, "v")
    };
    format!("{value}.map(|v| {body})")
}

/// A whole sequence converted element by element.
fn map_sequence(conv: &ValueConversion<'_>, naming: &Naming<'_>, value: &str, to_wire: bool) -> String {
    if conv.is_identity() {
        return value.to_string();
    }
    if let Some(path) = conv.message_fn(naming, to_wire, true) {
        return format!("{path}({value})");
    }
    let body = if to_wire {
        conv.to_wire(naming, "v")
    } else {
        conv.to_domain(naming, "v")
    };
    format!("{value}.into_iter().map(|v| {body}).collect()")
}

fn field_to_wire(f: &FieldDescriptor, naming: &Naming<'_>) -> String {
    let value = format!("item.{}", naming.domain_field(&f.name));
    let conv = ValueConversion::of(f.element_type());

    match f.cardinality {
        Cardinality::Repeated if f.nullable => {
            map_sequence(&conv, naming, &format!("{value}.unwrap_or_default()"), true)
        }
        Cardinality::Repeated => map_sequence(&conv, naming, &value, true),
        Cardinality::Scalar | Cardinality::Bytes if f.nullable => {
            if conv.is_identity() {
                value
            } else {
                map_option(&conv, naming, &value, true)
            }
        }
        Cardinality::Scalar | Cardinality::Bytes => conv.to_wire(naming, &value),
    }
}

fn field_to_domain(f: &FieldDescriptor, naming: &Naming<'_>) -> String {
    let value = format!("item.{}", naming.wire_field_ident(&f.wire_name));
    let conv = ValueConversion::of(f.element_type());

    match f.cardinality {
        Cardinality::Repeated if f.nullable => {
            let converted = map_sequence(&conv, naming, &value, false);
            if conv.is_identity() {
                format!("(!{value}.is_empty()).then_some({value})")
            } else {
                format!("(!{value}.is_empty()).then(|| {converted})")
            }
        }
        Cardinality::Repeated => map_sequence(&conv, naming, &value, false),
        Cardinality::Scalar | Cardinality::Bytes if f.nullable => {
            if conv.is_identity() {
                value
            } else {
                map_option(&conv, naming, &value, false)
            }
        }
        Cardinality::Scalar | Cardinality::Bytes => conv.to_domain(naming, &value),
    }
}

/// Render the converter module for one message.
pub fn emit_converter(message: &MessageDescriptor, cfg: &GeneratorConfig) -> ProtowizResult<String> {
    let naming = Naming::new(&cfg.naming);
    let domain = &message.name;
    let wire = &message.wire_name;
    let param = if message.fields.is_empty() { "_item" } else { "item" };

    let mut w = CodeWriter::new();
    w.module_doc(&format!(
        "Converters between `{domain}` and `{wire}`.\n\n{GENERATED_NOTICE}"
    ))?;
    w.blank_line()?;

    if message.has_field_of(&TypeDescriptor::Decimal) {
        w.writeln("use rust_decimal::prelude::{FromPrimitive, ToPrimitive};")?;
        w.blank_line()?;
    }
    cw_writeln!(w, "use crate::{}::{domain};", cfg.crates.models_module)?;
    cw_writeln!(w, "use crate::{}::{wire};", cfg.crates.wire_module)?;
    w.blank_line()?;

    let to_wire = naming.to_wire_fn(domain);
    w.block(&format!("pub fn {to_wire}({param}: {domain}) -> {wire}"), |w| {
        struct_literal(w, wire, message, |f| {
            (naming.wire_field_ident(&f.wire_name), field_to_wire(f, &naming))
        })
    })?;
    w.blank_line()?;

    let to_domain = naming.to_domain_fn(domain);
    w.block(&format!("pub fn {to_domain}({param}: {wire}) -> {domain}"), |w| {
        struct_literal(w, domain, message, |f| {
            (naming.domain_field(&f.name), field_to_domain(f, &naming))
        })
    })?;
    w.blank_line()?;

    w.block(
        &format!(
            "pub fn {}(items: Vec<{domain}>) -> Vec<{wire}>",
            naming.to_wire_list_fn(domain)
        ),
        |w| cw_writeln!(w, "items.into_iter().map({to_wire}).collect()"),
    )?;
    w.blank_line()?;

    w.block(
        &format!(
            "pub fn {}(items: Vec<{wire}>) -> Vec<{domain}>",
            naming.to_domain_list_fn(domain)
        ),
        |w| cw_writeln!(w, "items.into_iter().map({to_domain}).collect()"),
    )?;
    w.blank_line()?;

    from_impl(&mut w, domain, wire, &to_wire)?;
    w.blank_line()?;
    from_impl(&mut w, wire, domain, &to_domain)?;

    Ok(w.finish())
}

fn struct_literal<F>(
    w: &mut CodeWriter,
    ty: &str,
    message: &MessageDescriptor,
    field: F,
) -> std::fmt::Result
where
    F: Fn(&FieldDescriptor) -> (String, String),
{
    if message.fields.is_empty() {
        return cw_writeln!(w, "{ty} {{}}");
    }
    w.block(ty, |w| -> std::fmt::Result {
        for f in &message.fields {
            let (name, expr) = field(f);
            cw_writeln!(w, "{name}: {expr},")?;
        }
        Ok(())
    })
}

fn from_impl(w: &mut CodeWriter, from: &str, to: &str, func: &str) -> std::fmt::Result {
    w.block(&format!("impl From<{from}> for {to}"), |w| {
        w.block(&format!("fn from(item: {from}) -> Self"), |w| {
            cw_writeln!(w, "{func}(item)")
        })
    })
}

/// Render `mod.rs` for the converters directory.
pub fn emit_converter_index<'m>(
    messages: impl IntoIterator<Item = &'m MessageDescriptor>,
    cfg: &GeneratorConfig,
) -> ProtowizResult<String> {
    let naming = Naming::new(&cfg.naming);
    let mut w = CodeWriter::new();
    w.module_doc(&format!("Domain <-> wire converters.\n\n{GENERATED_NOTICE}"))?;
    w.blank_line()?;
    for m in messages {
        cw_writeln!(w, "pub mod {};", naming.converter_module(&m.name))?;
    }
    Ok(w.finish())
}
