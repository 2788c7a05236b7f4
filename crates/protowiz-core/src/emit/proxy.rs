//! Client proxy emitter: domain-typed methods over the tonic client.

use crate::config::GeneratorConfig;
use crate::cw_writeln;
use crate::errors::ProtowizResult;
use crate::model::ServiceRecord;
use crate::naming::Naming;

use super::adapter::method_models;
use super::code_writer::CodeWriter;
use super::GENERATED_NOTICE;

pub fn emit_proxy(record: &ServiceRecord, cfg: &GeneratorConfig) -> ProtowizResult<String> {
    let naming = Naming::new(&cfg.naming);
    let crates = &cfg.crates;
    let short = &record.short_name;
    let proxy = naming.proxy_type(short);
    let client = naming.tonic_client_type(short);
    let models = method_models(record);

    let mut w = CodeWriter::new();
    w.module_doc(&format!(
        "Client proxy for `{}` backed by `{client}`.\n\n{GENERATED_NOTICE}",
        record.service_name
    ))?;
    w.blank_line()?;
    w.writeln("use tonic::transport::Channel;")?;
    w.writeln("use tonic::Status;")?;
    w.blank_line()?;

    let converters: Vec<String> = models.iter().map(|m| naming.converter_module(m)).collect();
    cw_writeln!(
        w,
        "use {}::{}::{{{}}};",
        crates.shared_crate,
        crates.converters_module,
        converters.join(", ")
    )?;
    cw_writeln!(
        w,
        "use {}::{}::{{{}}};",
        crates.shared_crate,
        crates.models_module,
        models.join(", ")
    )?;
    cw_writeln!(
        w,
        "use {}::{}::{}::{client};",
        crates.shared_crate,
        crates.wire_module,
        naming.tonic_client_module(short)
    )?;
    w.blank_line()?;

    w.writeln("#[derive(Debug, Clone)]")?;
    w.block(&format!("pub struct {proxy}"), |w| {
        cw_writeln!(w, "inner: {client}<Channel>,")
    })?;
    w.blank_line()?;

    w.block(&format!("impl {proxy}"), |w| -> ProtowizResult<()> {
        w.block("pub fn new(channel: Channel) -> Self", |w| {
            cw_writeln!(w, "Self {{ inner: {client}::new(channel) }}")
        })?;
        w.blank_line()?;

        w.writeln("pub async fn connect(")?;
        {
            let _i = w.indent();
            w.writeln("endpoint: impl Into<String>,")?;
        }
        w.block(") -> Result<Self, tonic::transport::Error>", |w| -> std::fmt::Result {
            cw_writeln!(w, "let inner = {client}::connect(endpoint.into()).await?;")?;
            w.writeln("Ok(Self { inner })")
        })?;

        for m in &record.methods {
            w.blank_line()?;
            let method = naming.method_ident(&m.name);
            w.block(
                &format!(
                    "pub async fn {method}(&mut self, request: {}) -> Result<{}, Status>",
                    m.input, m.output
                ),
                |w| -> std::fmt::Result {
                    cw_writeln!(
                        w,
                        "let request = {}::{}(request);",
                        naming.converter_module(&m.input),
                        naming.to_wire_fn(&m.input)
                    )?;
                    cw_writeln!(w, "let response = self.inner.{method}(request).await?;")?;
                    cw_writeln!(
                        w,
                        "Ok({}::{}(response.into_inner()))",
                        naming.converter_module(&m.output),
                        naming.to_domain_fn(&m.output)
                    )
                },
            )?;
        }
        Ok(())
    })?;

    Ok(w.finish())
}

/// Render `mod.rs` for the client proxies directory.
pub fn emit_proxy_index(records: &[ServiceRecord], cfg: &GeneratorConfig) -> ProtowizResult<String> {
    let naming = Naming::new(&cfg.naming);
    let mut w = CodeWriter::new();
    w.module_doc(&format!("gRPC client proxies.\n\n{GENERATED_NOTICE}"))?;
    w.blank_line()?;
    for r in records {
        let ty = naming.proxy_type(&r.short_name);
        cw_writeln!(w, "pub mod {};", naming.module_of(&ty))?;
    }
    w.blank_line()?;
    for r in records {
        let ty = naming.proxy_type(&r.short_name);
        cw_writeln!(w, "pub use {}::{ty};", naming.module_of(&ty))?;
    }
    Ok(w.finish())
}
