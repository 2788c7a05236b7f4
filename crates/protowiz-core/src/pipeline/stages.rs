//! Built-in generation stages.
//!
//! Each emit stage walks service records in discovery order and checks the
//! cancellation flag before every service, so a cancelled run stops between
//! services with nothing written.

use tracing::debug;

use crate::bundle::ArtifactKind;
use crate::config::validate_config;
use crate::discovery::discover;
use crate::emit::{
    emit_adapter, emit_adapter_index, emit_converter, emit_converter_index, emit_proxy,
    emit_proxy_index, join_path, EmittedMessages, SchemaEmitter,
};
use crate::errors::ProtowizResult;
use crate::naming::Naming;
use crate::pipeline::{PipelineContext, PipelineData, Stage, StagedRun};

/// Stage: registry -> service graph.
pub struct DiscoverStage {
    id: String,
}

impl DiscoverStage {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

impl Stage for DiscoverStage {
    fn id(&self) -> &str {
        &self.id
    }

    fn run(&self, ctx: &mut PipelineContext, input: PipelineData) -> ProtowizResult<PipelineData> {
        let registry = match input {
            PipelineData::Registry(r) => r,
            other => {
                return Err(crate::ProtowizError::invalid_argument(format!(
                    "expected PipelineData::Registry, got {other:?}"
                )))
            }
        };

        validate_config(&ctx.config)?;
        let graph = discover(&registry, &ctx.config)?;

        ctx.push_info_with(
            "discover.complete",
            "service graph built",
            [
                ("services", graph.records.len().to_string()),
                ("messages", graph.messages.len().to_string()),
            ],
        );
        Ok(PipelineData::Graph(graph))
    }
}

/// Stage: graph -> staged schema file.
pub struct EmitSchemaStage {
    id: String,
}

impl EmitSchemaStage {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

impl Stage for EmitSchemaStage {
    fn id(&self) -> &str {
        &self.id
    }

    fn run(&self, ctx: &mut PipelineContext, input: PipelineData) -> ProtowizResult<PipelineData> {
        let mut staged = StagedRun {
            graph: input.into_graph()?,
            ..StagedRun::default()
        };

        let mut emitted = EmittedMessages::new();
        let mut schema = SchemaEmitter::new(&ctx.config)?;
        for record in &staged.graph.records {
            ctx.check_cancelled()?;
            schema.emit_service(record, &staged.graph, &mut emitted)?;
            debug!(service = %record.service_name, "schema block emitted");
        }

        staged.bundle.insert(
            ctx.config.layout.schema_file.clone(),
            ArtifactKind::Schema,
            schema.finish(),
        )?;
        ctx.push_info(
            "emit.schema",
            format!("{} messages in schema", emitted.len()),
        );
        Ok(PipelineData::Staged(staged))
    }
}

/// Stage: one converter module per distinct message, plus `mod.rs`.
pub struct EmitConvertersStage {
    id: String,
}

impl EmitConvertersStage {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

impl Stage for EmitConvertersStage {
    fn id(&self) -> &str {
        &self.id
    }

    fn run(&self, ctx: &mut PipelineContext, input: PipelineData) -> ProtowizResult<PipelineData> {
        let mut staged = input.into_staged()?;
        let cfg = &ctx.config;
        let naming = Naming::new(&cfg.naming);
        let dir = &cfg.layout.converters_dir;

        let mut emitted = EmittedMessages::new();
        let mut order = Vec::new();
        for record in &staged.graph.records {
            ctx.check_cancelled()?;
            for name in &record.referenced_models {
                if !emitted.mark(name) {
                    continue;
                }
                let message = staged.graph.message(name)?;
                let file = format!("{}.rs", naming.converter_module(name));
                staged.bundle.insert(
                    join_path(dir, &file),
                    ArtifactKind::Converter,
                    emit_converter(message, cfg)?,
                )?;
                order.push(message);
            }
        }

        staged.bundle.insert(
            join_path(dir, "mod.rs"),
            ArtifactKind::ConverterIndex,
            emit_converter_index(order.iter().copied(), cfg)?,
        )?;

        let count = order.len();
        ctx.push_info("emit.converters", format!("{count} converters staged"));
        Ok(PipelineData::Staged(staged))
    }
}

/// Stage: one server adapter per service, plus `mod.rs`.
pub struct EmitAdaptersStage {
    id: String,
}

impl EmitAdaptersStage {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

impl Stage for EmitAdaptersStage {
    fn id(&self) -> &str {
        &self.id
    }

    fn run(&self, ctx: &mut PipelineContext, input: PipelineData) -> ProtowizResult<PipelineData> {
        let mut staged = input.into_staged()?;
        let cfg = &ctx.config;
        let naming = Naming::new(&cfg.naming);
        let dir = &cfg.layout.adapters_dir;

        for record in &staged.graph.records {
            ctx.check_cancelled()?;
            let file = format!("{}.rs", naming.module_of(&naming.adapter_type(&record.short_name)));
            staged.bundle.insert(
                join_path(dir, &file),
                ArtifactKind::Adapter,
                emit_adapter(record, cfg)?,
            )?;
        }

        staged.bundle.insert(
            join_path(dir, "mod.rs"),
            ArtifactKind::AdapterIndex,
            emit_adapter_index(&staged.graph.records, cfg)?,
        )?;

        let count = staged.graph.records.len();
        ctx.push_info("emit.adapters", format!("{count} adapters staged"));
        Ok(PipelineData::Staged(staged))
    }
}

/// Stage: one client proxy per service, plus `mod.rs`.
pub struct EmitProxiesStage {
    id: String,
}

impl EmitProxiesStage {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

impl Stage for EmitProxiesStage {
    fn id(&self) -> &str {
        &self.id
    }

    fn run(&self, ctx: &mut PipelineContext, input: PipelineData) -> ProtowizResult<PipelineData> {
        let mut staged = input.into_staged()?;
        let cfg = &ctx.config;
        let naming = Naming::new(&cfg.naming);
        let dir = &cfg.layout.proxies_dir;

        for record in &staged.graph.records {
            ctx.check_cancelled()?;
            let file = format!("{}.rs", naming.module_of(&naming.proxy_type(&record.short_name)));
            staged.bundle.insert(
                join_path(dir, &file),
                ArtifactKind::Proxy,
                emit_proxy(record, cfg)?,
            )?;
        }

        staged.bundle.insert(
            join_path(dir, "mod.rs"),
            ArtifactKind::ProxyIndex,
            emit_proxy_index(&staged.graph.records, cfg)?,
        )?;

        let count = staged.graph.records.len();
        ctx.push_info("emit.proxies", format!("{count} proxies staged"));
        Ok(PipelineData::Staged(staged))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GeneratorConfig;
    use crate::model::{InterfaceDecl, MethodDecl, ModelDecl, Registry, ServiceDecl};

    fn registry() -> Registry {
        let mut reg = Registry::new();
        reg.register_model(ModelDecl::new("Ping"))
            .register_model(ModelDecl::new("Pong"))
            .register_service(ServiceDecl::new("EchoService").interface(
                InterfaceDecl::new("EchoApi").method(MethodDecl::unary("echo", "Ping", "Pong")),
            ));
        reg
    }

    #[test]
    fn discover_requires_registry() {
        let mut ctx = PipelineContext::default();
        let stage = DiscoverStage::new("discover");
        assert!(stage.run(&mut ctx, PipelineData::None).is_err());
    }

    #[test]
    fn discover_rejects_invalid_config() {
        let mut cfg = GeneratorConfig::default();
        cfg.namespace = "not valid".to_string();
        let mut ctx = PipelineContext::new(cfg);
        let stage = DiscoverStage::new("discover");
        assert!(stage.run(&mut ctx, PipelineData::Registry(registry())).is_err());
    }

    #[test]
    fn converter_stage_stages_each_message_once() {
        let mut ctx = PipelineContext::default();
        let graph = DiscoverStage::new("discover")
            .run(&mut ctx, PipelineData::Registry(registry()))
            .unwrap();
        let staged = EmitSchemaStage::new("emit.schema").run(&mut ctx, graph).unwrap();
        let staged = EmitConvertersStage::new("emit.converters")
            .run(&mut ctx, staged)
            .unwrap()
            .into_staged()
            .unwrap();

        assert_eq!(staged.bundle.count(ArtifactKind::Converter), 2);
        assert!(staged.bundle.get("shared/src/converters/ping_converter.rs").is_some());
        let index = staged.bundle.get("shared/src/converters/mod.rs").unwrap();
        assert!(index.text.contains("pub mod ping_converter;\npub mod pong_converter;\n"));
    }

    #[test]
    fn cancelled_emit_stage_stops() {
        let mut ctx = PipelineContext::default();
        let graph = DiscoverStage::new("discover")
            .run(&mut ctx, PipelineData::Registry(registry()))
            .unwrap();
        ctx.cancel.cancel();
        let err = EmitSchemaStage::new("emit.schema").run(&mut ctx, graph).unwrap_err();
        assert!(matches!(err, crate::ProtowizError::Cancelled));
    }
}
