use std::io::{self, BufRead, IsTerminal, Write};
use std::time::Duration;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use protowiz_core::bundle::ArtifactKind;
use protowiz_core::config::GeneratorConfig;
use protowiz_core::{defaults, CancelFlag, GenerationStats, GenerationStatus, ProtowizError};
use serde::Serialize;
use termcolor::Color;
use tracing::info;

use super::load_descriptor;
use crate::args::GenerateArgs;
use crate::instructions;
use crate::output;
use crate::versions::{resolve_versions, CratesIoVersions, PinnedVersions, VersionSource};

#[derive(Debug, Serialize)]
pub struct GenerateOut {
    pub status: &'static str,
    pub namespace: String,
    pub out_dir: String,
    pub dry_run: bool,
    pub stats: GenerationStats,
    pub copied_sources: usize,
    pub written: usize,
    pub removed: usize,
    pub artifacts: Vec<String>,
}

fn prompt_namespace(default: &str) -> Result<String> {
    let mut err = io::stderr();
    write!(err, "Proto package [{default}]: ")?;
    err.flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    let answer = line.trim();
    Ok(if answer.is_empty() {
        default.to_string()
    } else {
        answer.to_string()
    })
}

fn resolve_namespace(args: &GenerateArgs, cfg: &mut GeneratorConfig) -> Result<()> {
    if let Some(ns) = &args.namespace {
        cfg.namespace = ns.clone();
    } else if cfg.namespace == defaults::NAMESPACE
        && !output::is_json()
        && io::stdin().is_terminal()
    {
        cfg.namespace = prompt_namespace(defaults::NAMESPACE)?;
    }
    Ok(())
}

fn ensure_live(cancel: &CancelFlag) -> Result<()> {
    if cancel.is_cancelled() {
        return Err(ProtowizError::Cancelled.into());
    }
    Ok(())
}

pub async fn run(args: &GenerateArgs, cancel: CancelFlag) -> Result<()> {
    let (registry, mut cfg) = load_descriptor(&args.descriptor)?;
    resolve_namespace(args, &mut cfg)?;

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::with_template("{spinner} {msg}")?);
    pb.enable_steady_tick(Duration::from_millis(80));

    pb.set_message("generating");
    let mut report = {
        let cfg = cfg.clone();
        let cancel = cancel.clone();
        tokio::task::spawn_blocking(move || {
            protowiz_core::generate_with_cancel(&registry, &cfg, cancel)
        })
        .await??
    };

    pb.set_message("copying sources");
    let mut copied_sources = 0usize;
    if let Some(dir) = &args.models_dir {
        copied_sources +=
            protowiz_store::collect_sources(dir, &cfg.layout.models_dir, &mut report.bundle)?;
    }
    if let Some(dir) = &args.services_dir {
        copied_sources +=
            protowiz_store::collect_sources(dir, &cfg.layout.services_dir, &mut report.bundle)?;
    }
    ensure_live(&cancel)?;

    pb.set_message("looking up package versions");
    let source: Box<dyn VersionSource> = if args.offline {
        Box::new(PinnedVersions)
    } else {
        Box::new(
            CratesIoVersions::new(Duration::from_secs(args.timeout_secs))
                .context("failed to build HTTP client")?,
        )
    };
    let versions = resolve_versions(source.as_ref()).await?;
    ensure_live(&cancel)?;

    pb.set_message("assembling instructions");
    let readme = instructions::render(&report.graph, &cfg, &versions)?;
    report.bundle.insert(
        cfg.layout.instructions_file.clone(),
        ArtifactKind::Instructions,
        readme,
    )?;

    let mut out = GenerateOut {
        status: GenerationStatus::OK,
        namespace: cfg.namespace.clone(),
        out_dir: args.out.display().to_string(),
        dry_run: args.dry_run,
        stats: report.stats.clone(),
        copied_sources,
        written: 0,
        removed: 0,
        artifacts: report.bundle.iter().map(|(p, _)| p.to_string()).collect(),
    };

    let summary = if args.dry_run {
        None
    } else {
        pb.set_message("writing");
        ensure_live(&cancel)?;
        let s = protowiz_store::write_bundle(&args.out, &report.bundle, &cfg.layout, &cfg.namespace)
            .with_context(|| format!("failed to write output to {}", args.out.display()))?;
        out.written = s.written;
        out.removed = s.removed;
        Some(s)
    };
    pb.finish_and_clear();
    info!(
        namespace = %cfg.namespace,
        artifacts = out.artifacts.len(),
        dry_run = args.dry_run,
        "generate finished"
    );

    if output::is_json() {
        return output::print(&out);
    }

    if let Some(summary) = summary {
        output::status_line("generated", Color::Green, &summary.to_string())?;
        output::status_line("output", Color::Cyan, &out.out_dir)?;
    } else {
        for path in &out.artifacts {
            output::status_line("would write", Color::Yellow, path)?;
        }
    }
    output::status_line(
        GenerationStatus::OK,
        Color::Green,
        &format!(
            "{} services, {} messages, {} artifacts",
            out.stats.services,
            out.stats.messages,
            out.artifacts.len()
        ),
    )?;
    Ok(())
}
