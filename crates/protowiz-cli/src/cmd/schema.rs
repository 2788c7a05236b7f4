use std::path::Path;

use anyhow::{anyhow, Result};
use serde::Serialize;

use super::load_descriptor;
use crate::output;

#[derive(Debug, Serialize)]
pub struct SchemaOut {
    pub namespace: String,
    pub schema: String,
}

pub fn run(descriptor: &Path, namespace: Option<&str>) -> Result<()> {
    let (registry, mut cfg) = load_descriptor(descriptor)?;
    if let Some(ns) = namespace {
        cfg.namespace = ns.to_string();
    }

    let report = protowiz_core::generate(&registry, &cfg)?;
    let schema = report
        .bundle
        .get(&cfg.layout.schema_file)
        .ok_or_else(|| anyhow!("no schema staged at {}", cfg.layout.schema_file))?;

    if output::is_json() {
        return output::print(&SchemaOut {
            namespace: cfg.namespace.clone(),
            schema: schema.text.clone(),
        });
    }
    print!("{}", schema.text);
    Ok(())
}
