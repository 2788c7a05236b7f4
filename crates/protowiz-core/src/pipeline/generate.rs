//! High-level generation orchestration.
//!
//! `generate` runs discovery and every emitter and returns the complete
//! artifact bundle in memory. Callers (the CLI, tests, build scripts) add
//! their own collaborator artifacts and write the bundle afterwards.
//!
//! Determinism contract:
//! - ordering follows registry order, never hash-map order
//! - no timestamps, environment or randomness reach the output
//! - the same registry and config give byte-identical artifacts

use serde::Serialize;
use tracing::info;

use crate::bundle::{ArtifactBundle, ArtifactKind};
use crate::config::GeneratorConfig;
use crate::errors::ProtowizResult;
use crate::model::{Registry, ServiceGraph};
use crate::pipeline::{
    stages, CancelFlag, Pipeline, PipelineContext, PipelineData, PipelineDiagnostic,
};

/// Counts for presentation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GenerationStats {
    pub services: usize,
    pub messages: usize,
    pub converters: usize,
    pub adapters: usize,
    pub proxies: usize,
    pub artifacts: usize,
    pub bytes: usize,
}

/// A generation report: graph, staged bundle, diagnostics and stats.
#[derive(Debug, Clone)]
pub struct GenerationReport {
    pub graph: ServiceGraph,
    pub bundle: ArtifactBundle,
    pub diagnostics: Vec<PipelineDiagnostic>,
    pub stats: GenerationStats,
}

/// The string-based result contract: `"OK"` or a human-readable failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationStatus {
    Ok,
    Failed(String),
}

impl GenerationStatus {
    pub const OK: &'static str = "OK";

    pub fn message(&self) -> &str {
        match self {
            Self::Ok => Self::OK,
            Self::Failed(msg) => msg,
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok)
    }
}

/// Build the standard generation pipeline.
pub fn generation_pipeline() -> Pipeline {
    let mut p = Pipeline::new();
    p.push_stage(stages::DiscoverStage::new("discover"));
    p.push_stage(stages::EmitSchemaStage::new("emit.schema"));
    p.push_stage(stages::EmitConvertersStage::new("emit.converters"));
    p.push_stage(stages::EmitAdaptersStage::new("emit.adapters"));
    p.push_stage(stages::EmitProxiesStage::new("emit.proxies"));
    p
}

/// Generate every artifact for a registry.
pub fn generate(registry: &Registry, cfg: &GeneratorConfig) -> ProtowizResult<GenerationReport> {
    generate_with_cancel(registry, cfg, CancelFlag::new())
}

/// Like [`generate`], stopping between services once `cancel` is set.
pub fn generate_with_cancel(
    registry: &Registry,
    cfg: &GeneratorConfig,
    cancel: CancelFlag,
) -> ProtowizResult<GenerationReport> {
    let ctx = PipelineContext::new(cfg.clone()).with_cancel(cancel);
    let report = generation_pipeline().run(ctx, PipelineData::Registry(registry.clone()))?;
    let staged = report.output.into_staged()?;

    let bundle = staged.bundle;
    let stats = GenerationStats {
        services: staged.graph.records.len(),
        messages: staged.graph.messages.len(),
        converters: bundle.count(ArtifactKind::Converter),
        adapters: bundle.count(ArtifactKind::Adapter),
        proxies: bundle.count(ArtifactKind::Proxy),
        artifacts: bundle.len(),
        bytes: bundle.total_bytes(),
    };
    info!(
        services = stats.services,
        messages = stats.messages,
        artifacts = stats.artifacts,
        "generation complete"
    );

    Ok(GenerationReport {
        graph: staged.graph,
        bundle,
        diagnostics: report.diagnostics,
        stats,
    })
}

/// Run discovery and validation only.
pub fn check(registry: &Registry, cfg: &GeneratorConfig) -> ProtowizResult<ServiceGraph> {
    let mut p = Pipeline::new();
    p.push_stage(stages::DiscoverStage::new("discover"));
    let report = p.run(
        PipelineContext::new(cfg.clone()),
        PipelineData::Registry(registry.clone()),
    )?;
    report.output.into_graph()
}

/// [`generate`] folded into the string contract.
pub fn generate_status(registry: &Registry, cfg: &GeneratorConfig) -> GenerationStatus {
    match generate(registry, cfg) {
        Ok(_) => GenerationStatus::Ok,
        Err(e) => GenerationStatus::Failed(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{InterfaceDecl, MethodDecl, ModelDecl, ServiceDecl, TypeDescriptor};

    fn people() -> Registry {
        let mut reg = Registry::new();
        reg.register_model(
            ModelDecl::new("Person")
                .marked()
                .field("Id", TypeDescriptor::Int32)
                .field("FirstName", TypeDescriptor::String),
        )
        .register_model(ModelDecl::new("EmptyRequest"))
        .register_model(ModelDecl::new("IdRequest").field("Id", TypeDescriptor::Int32))
        .register_model(
            ModelDecl::new("PeopleResponse")
                .field("People", TypeDescriptor::list(TypeDescriptor::named("Person"))),
        )
        .register_model(
            ModelDecl::new("PersonResponse").field("Person", TypeDescriptor::named("Person")),
        )
        .register_service(
            ServiceDecl::new("PeopleService").interface(
                InterfaceDecl::new("PeopleApi")
                    .method(MethodDecl::unary("get_all", "EmptyRequest", "PeopleResponse"))
                    .method(MethodDecl::unary("get_by_id", "IdRequest", "PersonResponse")),
            ),
        );
        reg
    }

    fn cfg() -> GeneratorConfig {
        GeneratorConfig::default().with_namespace("people_demo")
    }

    #[test]
    fn people_end_to_end() {
        let report = generate(&people(), &cfg()).unwrap();
        let schema = &report.bundle.get("shared/grpc.proto").unwrap().text;

        assert_eq!(schema.matches("service ").count(), 1);
        assert_eq!(schema.matches("    rpc ").count(), 2);
        assert!(schema.contains("rpc GetAll (GrpcEmptyRequest) returns (GrpcPeopleResponse);"));
        assert!(schema.contains("rpc GetById (GrpcIdRequest) returns (GrpcPersonResponse);"));
        for name in ["EmptyRequest", "PeopleResponse", "IdRequest", "PersonResponse", "Person"] {
            let header = format!("message Grpc{name} {{");
            assert_eq!(schema.matches(&header).count(), 1, "{name}");
        }
        assert!(schema.contains("message GrpcPerson {\n    int32 id = 1;\n    string first_name = 2;\n}"));
        assert!(schema.contains("repeated GrpcPerson people = 1;"));

        assert_eq!(report.stats.services, 1);
        assert_eq!(report.stats.messages, 5);
        assert_eq!(report.stats.converters, 5);
        assert_eq!(report.stats.adapters, 1);
        assert_eq!(report.stats.proxies, 1);
        assert!(report
            .bundle
            .get("server/src/grpc_services/grpc_people_service.rs")
            .is_some());
        assert!(report
            .bundle
            .get("client/src/grpc_services/people_client.rs")
            .is_some());
    }

    #[test]
    fn generation_is_deterministic() {
        let a = generate(&people(), &cfg()).unwrap();
        let b = generate(&people(), &cfg()).unwrap();
        let left: Vec<_> = a.bundle.iter().map(|(p, x)| (p.to_string(), x.text.clone())).collect();
        let right: Vec<_> = b.bundle.iter().map(|(p, x)| (p.to_string(), x.text.clone())).collect();
        assert_eq!(left, right);

        let ordinals = |r: &GenerationReport| -> Vec<(String, u32)> {
            r.graph
                .messages
                .iter()
                .flat_map(|m| m.fields.iter().map(move |f| (format!("{}.{}", m.name, f.name), f.ordinal)))
                .collect()
        };
        assert_eq!(ordinals(&a), ordinals(&b));
    }

    #[test]
    fn two_parameters_fail_the_whole_run() {
        let mut reg = people();
        reg.register_model(ModelDecl::new("Ping"))
            .register_service(ServiceDecl::new("HealthService").interface(
                InterfaceDecl::new("HealthApi").method(MethodDecl {
                    name: "check".to_string(),
                    params: vec![TypeDescriptor::named("Ping"), TypeDescriptor::named("Ping")],
                    returns: crate::model::ReturnShape::Async(TypeDescriptor::named("Ping")),
                }),
            ));

        let status = generate_status(&reg, &cfg());
        assert!(!status.is_ok());
        assert_eq!(status.message(), "Service method check has more than one parameter");
        assert!(generate(&reg, &cfg()).is_err());
    }

    #[test]
    fn widget_short_name_is_used_everywhere() {
        let mut reg = Registry::new();
        reg.register_model(ModelDecl::new("WidgetRequest"))
            .register_model(ModelDecl::new("WidgetResponse"))
            .register_service(ServiceDecl::new("WidgetService").interface(
                InterfaceDecl::new("WidgetApi").method(MethodDecl::unary(
                    "get_widget",
                    "WidgetRequest",
                    "WidgetResponse",
                )),
            ));

        let report = generate(&reg, &cfg()).unwrap();
        assert_eq!(report.graph.records[0].short_name, "Widget");

        let schema = &report.bundle.get("shared/grpc.proto").unwrap().text;
        assert!(schema.contains("service GrpcWidget {"));
        let adapter = &report
            .bundle
            .get("server/src/grpc_services/grpc_widget_service.rs")
            .unwrap()
            .text;
        assert!(adapter.contains("pub struct GrpcWidgetService<S>"));
        let proxy = &report
            .bundle
            .get("client/src/grpc_services/widget_client.rs")
            .unwrap()
            .text;
        assert!(proxy.contains("pub struct WidgetClient"));
    }

    #[test]
    fn success_status_reads_ok() {
        assert_eq!(generate_status(&people(), &cfg()).message(), "OK");
    }

    #[test]
    fn check_stops_after_discovery() {
        let graph = check(&people(), &cfg()).unwrap();
        assert_eq!(graph.records.len(), 1);
        assert_eq!(graph.messages.len(), 5);
    }

    #[test]
    fn cancelled_run_returns_cancelled() {
        let cancel = CancelFlag::new();
        cancel.cancel();
        let err = generate_with_cancel(&people(), &cfg(), cancel).unwrap_err();
        assert_eq!(err.to_string(), "generation cancelled");
    }
}
