//! Text emitters.
//!
//! Each emitter is a read-only pass over a [`ServiceGraph`](crate::model::ServiceGraph).
//! Run-scoped deduplication lives in [`EmittedMessages`], owned by the caller
//! and threaded through one emitter family at a time.

use std::collections::BTreeSet;

pub mod adapter;
pub mod code_writer;
pub mod converter;
pub mod proxy;
pub mod schema;

pub use adapter::{emit_adapter, emit_adapter_index};
pub use converter::{emit_converter, emit_converter_index};
pub use proxy::{emit_proxy, emit_proxy_index};
pub use schema::SchemaEmitter;

/// First line of every generated file.
pub const GENERATED_NOTICE: &str = "Generated by protowiz. Do not edit.";

/// Message names already emitted in this run.
#[derive(Debug, Clone, Default)]
pub struct EmittedMessages {
    names: BTreeSet<String>,
}

impl EmittedMessages {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message. Returns false if it was already emitted.
    pub fn mark(&mut self, name: &str) -> bool {
        self.names.insert(name.to_string())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Join a layout directory and a file name with `/`.
pub fn join_path(dir: &str, file: &str) -> String {
    let dir = dir.trim_end_matches('/');
    if dir.is_empty() {
        file.to_string()
    } else {
        format!("{dir}/{file}")
    }
}
