use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use protowiz_core::config::GeneratorConfig;
use protowiz_core::model::parse::{parse_descriptor, DEFAULT_MAX_DESCRIPTOR_BYTES};
use protowiz_core::model::Registry;
use protowiz_core::CancelFlag;

use crate::args::{Cli, Command};

mod check;
mod generate;
mod schema;

pub async fn dispatch(cli: Cli, cancel: CancelFlag) -> Result<()> {
    match cli.command {
        Command::Generate(args) => generate::run(&args, cancel).await,
        Command::Check { descriptor } => check::run(&descriptor),
        Command::Schema {
            descriptor,
            namespace,
        } => schema::run(&descriptor, namespace.as_deref()),
    }
}

/// Read a descriptor file into a registry and the config it carries.
pub(crate) fn load_descriptor(path: &Path) -> Result<(Registry, GeneratorConfig)> {
    let bytes =
        fs::read(path).with_context(|| format!("failed to read descriptor {}", path.display()))?;
    let file = parse_descriptor(&bytes, DEFAULT_MAX_DESCRIPTOR_BYTES)
        .with_context(|| format!("invalid descriptor {}", path.display()))?;
    Ok((file.registry, file.config.unwrap_or_default()))
}
