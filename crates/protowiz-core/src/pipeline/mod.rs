//! Generation pipeline primitives.
//!
//! A run is an ordered list of stages:
//! - `discover`: registry -> service graph (all validation happens here)
//! - `emit.schema`: graph -> staged proto text
//! - `emit.converters`, `emit.adapters`, `emit.proxies`: staged Rust text
//!
//! Stages share a [`PipelineContext`] carrying the generator config, a
//! cancellation flag and the diagnostics collected along the way.
//!
//! The core crate does no filesystem or network I/O. Stages only stage text
//! into an [`ArtifactBundle`]; callers decide when and where to write it.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info_span};

use crate::bundle::ArtifactBundle;
use crate::config::GeneratorConfig;
use crate::errors::{ProtowizError, ProtowizResult};
use crate::model::{Registry, ServiceGraph};

pub mod generate;
pub mod stages;

/// A stable identifier for a pipeline stage, dot-delimited (`emit.schema`).
pub type StageId = String;

/// A structured diagnostic emitted by pipeline stages.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineDiagnostic {
    pub level: DiagnosticLevel,
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub data: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticLevel {
    Info,
    Warning,
    Error,
}

/// Shared cancellation flag. Cloning shares the flag.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Pipeline context shared by all stages.
#[derive(Debug, Clone, Default)]
pub struct PipelineContext {
    pub config: GeneratorConfig,
    pub cancel: CancelFlag,
    pub diagnostics: Vec<PipelineDiagnostic>,
}

impl PipelineContext {
    pub fn new(config: GeneratorConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    /// Fail with `Cancelled` once the flag is set.
    pub fn check_cancelled(&self) -> ProtowizResult<()> {
        if self.cancel.is_cancelled() {
            Err(ProtowizError::Cancelled)
        } else {
            Ok(())
        }
    }

    fn push(&mut self, level: DiagnosticLevel, code: String, message: String) {
        self.diagnostics.push(PipelineDiagnostic {
            level,
            code,
            message,
            data: BTreeMap::new(),
        });
    }

    pub fn push_info(&mut self, code: impl Into<String>, message: impl Into<String>) {
        self.push(DiagnosticLevel::Info, code.into(), message.into());
    }

    pub fn push_warning(&mut self, code: impl Into<String>, message: impl Into<String>) {
        self.push(DiagnosticLevel::Warning, code.into(), message.into());
    }

    pub fn push_error(&mut self, code: impl Into<String>, message: impl Into<String>) {
        self.push(DiagnosticLevel::Error, code.into(), message.into());
    }

    /// Info diagnostic with structured key/value data.
    pub fn push_info_with(
        &mut self,
        code: impl Into<String>,
        message: impl Into<String>,
        data: impl IntoIterator<Item = (&'static str, String)>,
    ) {
        self.diagnostics.push(PipelineDiagnostic {
            level: DiagnosticLevel::Info,
            code: code.into(),
            message: message.into(),
            data: data.into_iter().map(|(k, v)| (k.to_string(), v)).collect(),
        });
    }
}

/// Graph plus the artifacts staged from it so far.
#[derive(Debug, Clone, Default)]
pub struct StagedRun {
    pub graph: ServiceGraph,
    pub bundle: ArtifactBundle,
}

/// A stage input/output carrier.
#[derive(Debug, Clone)]
pub enum PipelineData {
    None,
    Registry(Registry),
    Graph(ServiceGraph),
    Staged(StagedRun),
}

impl PipelineData {
    fn variant(&self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Registry(_) => "Registry",
            Self::Graph(_) => "Graph",
            Self::Staged(_) => "Staged",
        }
    }

    pub fn into_staged(self) -> ProtowizResult<StagedRun> {
        match self {
            Self::Staged(s) => Ok(s),
            other => Err(ProtowizError::invalid_argument(format!(
                "expected staged pipeline data, got {}",
                other.variant()
            ))),
        }
    }

    pub fn into_graph(self) -> ProtowizResult<ServiceGraph> {
        match self {
            Self::Graph(g) => Ok(g),
            Self::Staged(s) => Ok(s.graph),
            other => Err(ProtowizError::invalid_argument(format!(
                "expected a service graph, got {}",
                other.variant()
            ))),
        }
    }
}

/// A pipeline stage.
///
/// Stages must be deterministic: no system time, environment, randomness or
/// I/O. Anything of that kind is injected through the context.
pub trait Stage {
    fn id(&self) -> &str;
    fn run(&self, ctx: &mut PipelineContext, input: PipelineData) -> ProtowizResult<PipelineData>;
}

/// An ordered list of stages.
#[derive(Default)]
pub struct Pipeline {
    stages: Vec<Box<dyn Stage + Send + Sync>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self { stages: Vec::new() }
    }

    pub fn push_stage<S: Stage + Send + Sync + 'static>(&mut self, s: S) -> &mut Self {
        self.stages.push(Box::new(s));
        self
    }

    pub fn stages(&self) -> usize {
        self.stages.len()
    }

    /// Run every stage in order; the first error aborts the run.
    pub fn run(&self, mut ctx: PipelineContext, input: PipelineData) -> ProtowizResult<PipelineReport> {
        let mut data = input;

        for st in &self.stages {
            ctx.check_cancelled()?;
            let _span = info_span!("stage", id = st.id()).entered();
            ctx.push_info("pipeline.stage.start", format!("starting stage {}", st.id()));

            data = st.run(&mut ctx, data)?;

            debug!("stage complete");
            ctx.push_info("pipeline.stage.end", format!("completed stage {}", st.id()));
        }

        Ok(PipelineReport {
            output: data,
            diagnostics: ctx.diagnostics,
        })
    }
}

/// Pipeline run result.
#[derive(Debug)]
pub struct PipelineReport {
    pub output: PipelineData,
    pub diagnostics: Vec<PipelineDiagnostic>,
}

impl PipelineReport {
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.level == DiagnosticLevel::Error)
    }

    pub fn warnings(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.level == DiagnosticLevel::Warning)
            .count()
    }
}
