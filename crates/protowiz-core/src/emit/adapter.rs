//! Service adapter emitter: the tonic server side of one service.

use crate::config::GeneratorConfig;
use crate::cw_writeln;
use crate::errors::ProtowizResult;
use crate::model::ServiceRecord;
use crate::naming::Naming;

use super::code_writer::CodeWriter;
use super::GENERATED_NOTICE;

/// Converter modules and wire types a record touches, first occurrence order.
pub(crate) fn method_models(record: &ServiceRecord) -> Vec<&str> {
    let mut out: Vec<&str> = Vec::new();
    for m in &record.methods {
        for name in [m.input.as_str(), m.output.as_str()] {
            if !out.contains(&name) {
                out.push(name);
            }
        }
    }
    out
}

/// Render the adapter module for one service.
pub fn emit_adapter(record: &ServiceRecord, cfg: &GeneratorConfig) -> ProtowizResult<String> {
    let naming = Naming::new(&cfg.naming);
    let crates = &cfg.crates;
    let short = &record.short_name;
    let adapter = naming.adapter_type(short);
    let server_trait = naming.wire_service(short);
    let server_type = naming.tonic_server_type(short);
    let models = method_models(record);

    let mut w = CodeWriter::new();
    w.module_doc(&format!(
        "gRPC server adapter exposing `{}` as `{server_trait}`.\n\n{GENERATED_NOTICE}",
        record.service_name
    ))?;
    w.blank_line()?;
    w.writeln("use std::sync::Arc;")?;
    w.blank_line()?;
    w.writeln("use tonic::{Request, Response, Status};")?;
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
        "use {}::{}::{}::{{{server_trait}, {server_type}}};",
        crates.shared_crate,
        crates.wire_module,
        naming.tonic_server_module(short)
    )?;
    let wire_types: Vec<String> = models.iter().map(|m| naming.wire_message(m)).collect();
    cw_writeln!(
        w,
        "use {}::{}::{{{}}};",
        crates.shared_crate,
        crates.wire_module,
        wire_types.join(", ")
    )?;
    w.blank_line()?;
    cw_writeln!(w, "use crate::{}::{};", crates.services_module, record.interface_name)?;
    w.blank_line()?;

    cw_writeln!(
        w,
        "/// Dispatches `{server_trait}` calls to a `{}` implementation.",
        record.interface_name
    )?;
    w.block(&format!("pub struct {adapter}<S>"), |w| w.writeln("inner: Arc<S>,"))?;
    w.blank_line()?;

    w.block(&format!("impl<S> {adapter}<S>"), |w| -> ProtowizResult<()> {
        w.block("pub fn new(inner: S) -> Self", |w| {
            w.writeln("Self::from_arc(Arc::new(inner))")
        })?;
        w.blank_line()?;
        w.block("pub fn from_arc(inner: Arc<S>) -> Self", |w| {
            w.writeln("Self { inner }")
        })?;
        Ok(())
    })?;
    w.blank_line()?;

    cw_writeln!(w, "impl<S> {adapter}<S>")?;
    w.writeln("where")?;
    cw_writeln!(w, "    S: {} + Send + Sync + 'static,", record.interface_name)?;
    w.braced(|w| -> std::fmt::Result {
        cw_writeln!(w, "/// Wrap this adapter in the tonic server type.")?;
        w.block(&format!("pub fn into_server(self) -> {server_type}<Self>"), |w| {
            cw_writeln!(w, "{server_type}::new(self)")
        })
    })?;
    w.blank_line()?;

    w.writeln("#[tonic::async_trait]")?;
    cw_writeln!(w, "impl<S> {server_trait} for {adapter}<S>")?;
    w.writeln("where")?;
    cw_writeln!(w, "    S: {} + Send + Sync + 'static,", record.interface_name)?;
    w.braced(|w| -> ProtowizResult<()> {
        for (i, m) in record.methods.iter().enumerate() {
            if i > 0 {
                w.blank_line()?;
            }
            let method = naming.method_ident(&m.name);
            cw_writeln!(w, "async fn {method}(")?;
            {
                let _i = w.indent();
                w.writeln("&self,")?;
                cw_writeln!(w, "request: Request<{}>,", naming.wire_message(&m.input))?;
            }
            let header = format!(
                ") -> Result<Response<{}>, Status>",
                naming.wire_message(&m.output)
            );
            w.block(&header, |w| -> std::fmt::Result {
                cw_writeln!(
                    w,
                    "let input = {}::{}(request.into_inner());",
                    naming.converter_module(&m.input),
                    naming.to_domain_fn(&m.input)
                )?;
                cw_writeln!(w, "let output = self.inner.{method}(input).await;")?;
                cw_writeln!(
                    w,
                    "Ok(Response::new({}::{}(output)))",
                    naming.converter_module(&m.output),
                    naming.to_wire_fn(&m.output)
                )
            })?;
        }
        Ok(())
    })?;

    Ok(w.finish())
}

/// Render `mod.rs` for the adapters directory.
pub fn emit_adapter_index(records: &[ServiceRecord], cfg: &GeneratorConfig) -> ProtowizResult<String> {
    let naming = Naming::new(&cfg.naming);
    let mut w = CodeWriter::new();
    w.module_doc(&format!("gRPC server adapters.\n\n{GENERATED_NOTICE}"))?;
    w.blank_line()?;
    for r in records {
        let ty = naming.adapter_type(&r.short_name);
        cw_writeln!(w, "pub mod {};", naming.module_of(&ty))?;
    }
    w.blank_line()?;
    for r in records {
        let ty = naming.adapter_type(&r.short_name);
        cw_writeln!(w, "pub use {}::{ty};", naming.module_of(&ty))?;
    }
    Ok(w.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::descriptor::MethodContract;

    fn widget_record() -> ServiceRecord {
        ServiceRecord {
            service_name: "WidgetService".to_string(),
            short_name: "Widget".to_string(),
            interface_name: "WidgetApi".to_string(),
            methods: vec![
                MethodContract {
                    name: "get_widget".to_string(),
                    input: "WidgetRequest".to_string(),
                    output: "WidgetResponse".to_string(),
                },
                MethodContract {
                    name: "ListWidgets".to_string(),
                    input: "WidgetRequest".to_string(),
                    output: "WidgetList".to_string(),
                },
            ],
            referenced_models: vec![],
        }
    }

    #[test]
    fn adapter_dispatches_through_converters() {
        let text = emit_adapter(&widget_record(), &GeneratorConfig::default()).unwrap();

        assert!(text.contains("pub struct GrpcWidgetService<S> {\n    inner: Arc<S>,\n}"));
        assert!(text.contains(
            "use shared::converters::{widget_request_converter, widget_response_converter, widget_list_converter};"
        ));
        assert!(text.contains(
            "use shared::wire::grpc_widget_server::{GrpcWidget, GrpcWidgetServer};"
        ));
        assert!(text.contains("use crate::services::WidgetApi;"));
        assert!(text.contains("impl<S> GrpcWidget for GrpcWidgetService<S>\nwhere\n    S: WidgetApi + Send + Sync + 'static,\n{\n"));

        let expected_method = "    async fn list_widgets(
        &self,
        request: Request<GrpcWidgetRequest>,
    ) -> Result<Response<GrpcWidgetList>, Status> {
        let input = widget_request_converter::from_grpc_widget_request(request.into_inner());
        let output = self.inner.list_widgets(input).await;
        Ok(Response::new(widget_list_converter::from_widget_list(output)))
    }
";
        assert!(text.contains(expected_method), "{text}");
    }

    #[test]
    fn index_declares_and_reexports() {
        let text = emit_adapter_index(&[widget_record()], &GeneratorConfig::default()).unwrap();
        assert!(text.contains("pub mod grpc_widget_service;\n"));
        assert!(text.contains("pub use grpc_widget_service::GrpcWidgetService;\n"));
    }
}
