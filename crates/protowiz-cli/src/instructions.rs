//! Setup instructions (`README.txt`) for a generated tree.
//!
//! Three sections, one per crate the user has to wire up: Shared, Server,
//! Client. Dependency snippets use the looked-up package versions.

use std::collections::BTreeMap;
use std::fmt;

use protowiz_core::config::GeneratorConfig;
use protowiz_core::cw_writeln;
use protowiz_core::emit::code_writer::CodeWriter;
use protowiz_core::model::{ServiceGraph, TypeDescriptor};
use protowiz_core::naming::Naming;

const SERVER_ADDR: &str = "[::1]:50051";

fn mentions(ty: &TypeDescriptor, wanted: &TypeDescriptor) -> bool {
    ty == wanted || ty.element().is_some_and(|e| mentions(e, wanted))
}

fn graph_uses(graph: &ServiceGraph, wanted: &TypeDescriptor) -> bool {
    graph
        .messages
        .iter()
        .flat_map(|m| m.fields.iter())
        .any(|f| mentions(&f.domain_type, wanted))
}

fn heading(w: &mut CodeWriter, title: &str) -> fmt::Result {
    w.blank_line()?;
    w.writeln(title)?;
    w.writeln(&"-".repeat(title.len()))?;
    w.blank_line()
}

fn dep(w: &mut CodeWriter, versions: &BTreeMap<String, String>, name: &str) -> fmt::Result {
    let v = versions.get(name).map(String::as_str).unwrap_or("*");
    match name {
        "tokio" => cw_writeln!(
            w,
            "tokio = {{ version = \"{v}\", features = [\"macros\", \"rt-multi-thread\"] }}"
        ),
        _ => cw_writeln!(w, "{name} = \"{v}\""),
    }
}

fn shared_section(
    w: &mut CodeWriter,
    graph: &ServiceGraph,
    cfg: &GeneratorConfig,
    versions: &BTreeMap<String, String>,
) -> fmt::Result {
    let crates = &cfg.crates;
    heading(w, "Shared")?;
    cw_writeln!(w, "1. Add to {}/Cargo.toml:", crates.shared_crate)?;
    w.blank_line()?;
    w.writeln("[dependencies]")?;
    dep(w, versions, "prost")?;
    dep(w, versions, "tonic")?;
    if graph_uses(graph, &TypeDescriptor::Timestamp) {
        dep(w, versions, "chrono")?;
    }
    if graph_uses(graph, &TypeDescriptor::Decimal) {
        dep(w, versions, "rust_decimal")?;
    }
    w.blank_line()?;
    w.writeln("[build-dependencies]")?;
    dep(w, versions, "tonic-build")?;
    w.blank_line()?;

    cw_writeln!(w, "2. Create {}/build.rs:", crates.shared_crate)?;
    w.blank_line()?;
    w.block("fn main() -> Result<(), Box<dyn std::error::Error>>", |w| -> fmt::Result {
        let file = cfg
            .layout
            .schema_file
            .rsplit('/')
            .next()
            .unwrap_or(cfg.layout.schema_file.as_str());
        cw_writeln!(w, "tonic_build::compile_protos(\"{file}\")?;")?;
        w.writeln("Ok(())")
    })?;
    w.blank_line()?;

    cw_writeln!(w, "3. Declare modules in {}/src/lib.rs:", crates.shared_crate)?;
    w.blank_line()?;
    cw_writeln!(w, "pub mod {};", crates.converters_module)?;
    cw_writeln!(w, "pub mod {};", crates.models_module)?;
    w.block(&format!("pub mod {}", crates.wire_module), |w| -> fmt::Result {
        cw_writeln!(w, "tonic::include_proto!(\"{}\");", cfg.namespace)
    })?;
    w.blank_line()?;
    cw_writeln!(
        w,
        "Every copied model file needs a `pub mod` line in {}/mod.rs, and each model",
        cfg.layout.models_dir
    )?;
    w.writeln("type must implement Default and Clone.")
}

fn server_section(
    w: &mut CodeWriter,
    graph: &ServiceGraph,
    cfg: &GeneratorConfig,
    versions: &BTreeMap<String, String>,
) -> fmt::Result {
    let naming = Naming::new(&cfg.naming);
    let crates = &cfg.crates;

    heading(w, "Server")?;
    w.writeln("1. Add to server/Cargo.toml:")?;
    w.blank_line()?;
    w.writeln("[dependencies]")?;
    cw_writeln!(w, "{0} = {{ path = \"../{0}\" }}", crates.shared_crate)?;
    dep(w, versions, "async-trait")?;
    dep(w, versions, "tokio")?;
    dep(w, versions, "tonic")?;
    w.blank_line()?;

    w.writeln("2. Declare modules in server/src/main.rs:")?;
    w.blank_line()?;
    w.writeln("mod grpc_services;")?;
    cw_writeln!(w, "mod {};", crates.services_module)?;
    w.blank_line()?;
    w.writeln("Domain service traits are expected to use #[async_trait::async_trait].")?;
    w.blank_line()?;

    w.writeln("3. Register the services:")?;
    w.blank_line()?;
    w.writeln("#[tokio::main]")?;
    w.block("async fn main() -> Result<(), Box<dyn std::error::Error>>", |w| -> fmt::Result {
        cw_writeln!(w, "let addr = \"{SERVER_ADDR}\".parse()?;")?;
        w.writeln("tonic::transport::Server::builder()")?;
        {
            let _indent = w.indent();
            for record in &graph.records {
                cw_writeln!(
                    w,
                    ".add_service(grpc_services::{}::new({}::{}::default()).into_server())",
                    naming.adapter_type(&record.short_name),
                    crates.services_module,
                    record.service_name
                )?;
            }
            w.writeln(".serve(addr)")?;
            w.writeln(".await?;")?;
        }
        w.writeln("Ok(())")
    })
}

fn client_section(
    w: &mut CodeWriter,
    graph: &ServiceGraph,
    cfg: &GeneratorConfig,
    versions: &BTreeMap<String, String>,
) -> fmt::Result {
    let naming = Naming::new(&cfg.naming);
    let crates = &cfg.crates;

    heading(w, "Client")?;
    w.writeln("1. Add to client/Cargo.toml:")?;
    w.blank_line()?;
    w.writeln("[dependencies]")?;
    cw_writeln!(w, "{0} = {{ path = \"../{0}\" }}", crates.shared_crate)?;
    dep(w, versions, "tokio")?;
    dep(w, versions, "tonic")?;
    w.blank_line()?;

    w.writeln("2. Declare modules in client/src/main.rs:")?;
    w.blank_line()?;
    w.writeln("mod grpc_services;")?;
    w.blank_line()?;

    w.writeln("3. Connect:")?;
    w.blank_line()?;
    for record in &graph.records {
        cw_writeln!(
            w,
            "let mut {} = grpc_services::{}::connect(\"http://{SERVER_ADDR}\").await?;",
            naming.binding(&naming.proxy_type(&record.short_name)),
            naming.proxy_type(&record.short_name)
        )?;
    }

    let first = graph
        .records
        .first()
        .and_then(|r| r.methods.first().map(|m| (r, m)));
    if let Some((record, method)) = first {
        w.blank_line()?;
        w.writeln("4. Sample call:")?;
        w.blank_line()?;
        cw_writeln!(
            w,
            "let response = {}.{}({}::{}::{}::default()).await?;",
            naming.binding(&naming.proxy_type(&record.short_name)),
            naming.method_ident(&method.name),
            crates.shared_crate,
            crates.models_module,
            method.input
        )?;
        w.writeln("println!(\"{response:?}\");")?;
    }
    Ok(())
}

/// Render the instructions document.
pub fn render(
    graph: &ServiceGraph,
    cfg: &GeneratorConfig,
    versions: &BTreeMap<String, String>,
) -> Result<String, fmt::Error> {
    let mut w = CodeWriter::new();
    w.writeln("protowiz setup instructions")?;
    w.writeln("===========================")?;
    w.blank_line()?;
    cw_writeln!(w, "Proto package: {}", cfg.namespace)?;
    for record in &graph.records {
        cw_writeln!(
            w,
            "Service: {} ({} methods)",
            record.service_name,
            record.methods.len()
        )?;
    }

    shared_section(&mut w, graph, cfg, versions)?;
    server_section(&mut w, graph, cfg, versions)?;
    client_section(&mut w, graph, cfg, versions)?;
    Ok(w.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use protowiz_core::model::{InterfaceDecl, MethodDecl, ModelDecl, Registry, ServiceDecl};

    fn graph(cfg: &GeneratorConfig) -> ServiceGraph {
        let mut reg = Registry::new();
        reg.register_model(ModelDecl::new("Person").field("Born", TypeDescriptor::Timestamp))
            .register_model(ModelDecl::new("EmptyRequest"))
            .register_model(
                ModelDecl::new("PeopleResponse")
                    .field("People", TypeDescriptor::list(TypeDescriptor::named("Person"))),
            )
            .register_service(ServiceDecl::new("PeopleService").interface(
                InterfaceDecl::new("PeopleApi").method(MethodDecl::unary(
                    "get_all",
                    "EmptyRequest",
                    "PeopleResponse",
                )),
            ));
        protowiz_core::check(&reg, cfg).unwrap()
    }

    fn versions() -> BTreeMap<String, String> {
        crate::versions::PACKAGES
            .iter()
            .map(|p| (p.to_string(), "9.9".to_string()))
            .collect()
    }

    #[test]
    fn has_three_sections() {
        let cfg = GeneratorConfig::default().with_namespace("people_demo");
        let text = render(&graph(&cfg), &cfg, &versions()).unwrap();
        for section in ["\nShared\n------\n", "\nServer\n------\n", "\nClient\n------\n"] {
            assert!(text.contains(section), "{section}");
        }
        assert!(text.contains("tonic::include_proto!(\"people_demo\");"));
        assert!(text.contains("tonic_build::compile_protos(\"grpc.proto\")?;"));
    }

    #[test]
    fn snippets_name_generated_types() {
        let cfg = GeneratorConfig::default();
        let text = render(&graph(&cfg), &cfg, &versions()).unwrap();
        assert!(text.contains(
            ".add_service(grpc_services::GrpcPeopleService::new(services::PeopleService::default()).into_server())"
        ));
        assert!(text.contains(
            "let mut people_client = grpc_services::PeopleClient::connect(\"http://[::1]:50051\").await?;"
        ));
        assert!(text.contains(
            "let response = people_client.get_all(shared::models::EmptyRequest::default()).await?;"
        ));
    }

    #[test]
    fn optional_dependencies_follow_field_types() {
        let cfg = GeneratorConfig::default();
        let text = render(&graph(&cfg), &cfg, &versions()).unwrap();
        assert!(text.contains("chrono = \"9.9\""));
        assert!(!text.contains("rust_decimal"));
        assert!(text.contains(
            "tokio = { version = \"9.9\", features = [\"macros\", \"rt-multi-thread\"] }"
        ));
    }
}
