//! Identifier naming contract shared by every emitter.
//!
//! The adapter and proxy emitters call converter functions by constructed
//! name rather than by lookup, so every generated identifier is derived here
//! and nowhere else. Wire names follow the conventions prost and tonic-build
//! apply to a schema, so the identifiers below match what those tools emit.

use heck::{ToSnakeCase, ToUpperCamelCase};

use crate::config::NamingConfig;

const RUST_KEYWORDS: &[&str] = &[
    "as", "async", "await", "break", "const", "continue", "crate", "dyn", "else", "enum",
    "extern", "false", "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod", "move",
    "mut", "pub", "ref", "return", "self", "Self", "static", "struct", "super", "trait", "true",
    "type", "unsafe", "use", "where", "while", "abstract", "become", "box", "do", "final",
    "gen", "macro", "override", "priv", "try", "typeof", "unsized", "virtual", "yield",
];

pub(crate) fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Escape a Rust keyword as a raw identifier.
pub fn rust_ident(name: &str) -> String {
    if RUST_KEYWORDS.contains(&name) {
        format!("r#{name}")
    } else {
        name.to_string()
    }
}

/// Derives every generated identifier from declared names.
#[derive(Debug, Clone, Copy)]
pub struct Naming<'a> {
    cfg: &'a NamingConfig,
}

impl<'a> Naming<'a> {
    pub fn new(cfg: &'a NamingConfig) -> Self {
        Self { cfg }
    }

    /// `Person` -> `GrpcPerson`.
    pub fn wire_message(&self, model: &str) -> String {
        format!("{}{}", self.cfg.wire_prefix, model.to_upper_camel_case())
    }

    /// `People` -> `GrpcPeople`.
    pub fn wire_service(&self, short_name: &str) -> String {
        format!("{}{}", self.cfg.wire_prefix, short_name.to_upper_camel_case())
    }

    /// `get_all` -> `GetAll`.
    pub fn rpc_method(&self, method: &str) -> String {
        method.to_upper_camel_case()
    }

    /// Method identifier on both the domain trait and the tonic-generated code.
    pub fn method_ident(&self, method: &str) -> String {
        rust_ident(&method.to_snake_case())
    }

    /// Domain struct field identifier.
    pub fn domain_field(&self, field: &str) -> String {
        rust_ident(&field.to_snake_case())
    }

    /// Schema field name; timestamps get the configured prefix.
    pub fn wire_field(&self, field: &str, is_timestamp: bool) -> String {
        let snake = field.to_snake_case();
        if is_timestamp {
            format!("{}{}", self.cfg.timestamp_prefix, snake)
        } else {
            snake
        }
    }

    /// Field identifier on the prost-generated struct.
    pub fn wire_field_ident(&self, wire_field: &str) -> String {
        rust_ident(wire_field)
    }

    /// `Person` -> `person_converter`.
    pub fn converter_module(&self, model: &str) -> String {
        format!("{}_converter", model.to_snake_case())
    }

    /// Domain -> wire: `from_person`.
    pub fn to_wire_fn(&self, model: &str) -> String {
        format!("from_{}", model.to_snake_case())
    }

    /// Wire -> domain: `from_grpc_person`.
    pub fn to_domain_fn(&self, model: &str) -> String {
        format!("from_{}", self.wire_message(model).to_snake_case())
    }

    pub fn to_wire_list_fn(&self, model: &str) -> String {
        format!("{}_list", self.to_wire_fn(model))
    }

    pub fn to_domain_list_fn(&self, model: &str) -> String {
        format!("{}_list", self.to_domain_fn(model))
    }

    /// Server adapter type: `GrpcPeopleService`.
    pub fn adapter_type(&self, short_name: &str) -> String {
        format!("{}Service", self.wire_service(short_name))
    }

    /// Module tonic-build generates for the server side: `grpc_people_server`.
    pub fn tonic_server_module(&self, short_name: &str) -> String {
        format!("{}_server", self.wire_service(short_name).to_snake_case())
    }

    /// Server wrapper type generated by tonic-build: `GrpcPeopleServer`.
    pub fn tonic_server_type(&self, short_name: &str) -> String {
        format!("{}Server", self.wire_service(short_name))
    }

    /// Module tonic-build generates for the client side: `grpc_people_client`.
    pub fn tonic_client_module(&self, short_name: &str) -> String {
        format!("{}_client", self.wire_service(short_name).to_snake_case())
    }

    /// Client type generated by tonic-build: `GrpcPeopleClient`.
    pub fn tonic_client_type(&self, short_name: &str) -> String {
        format!("{}Client", self.wire_service(short_name))
    }

    /// Client proxy type: `PeopleClient`.
    pub fn proxy_type(&self, short_name: &str) -> String {
        format!("{}Client", short_name.to_upper_camel_case())
    }

    /// Rust module name for a generated type: `GrpcPeopleService` -> `grpc_people_service`.
    pub fn module_of(&self, type_name: &str) -> String {
        type_name.to_snake_case()
    }

    /// Local variable / field name for a value of the given type.
    pub fn binding(&self, type_name: &str) -> String {
        rust_ident(&type_name.to_snake_case())
    }
}
