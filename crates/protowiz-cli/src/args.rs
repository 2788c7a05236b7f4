use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug, Clone)]
#[command(name = "protowiz", version, about = "gRPC scaffolding generator")]
pub struct Cli {
    /// Emit JSON output on stdout.
    #[arg(long, global = true)]
    pub json: bool,

    /// Emit logs as JSON lines on stderr.
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Generate schema, converters, adapters, proxies and setup instructions.
    Generate(GenerateArgs),

    /// Run discovery and validation only.
    Check {
        /// Descriptor file (JSON).
        descriptor: PathBuf,
    },

    /// Print the generated proto3 schema.
    Schema {
        /// Descriptor file (JSON).
        descriptor: PathBuf,

        /// Proto package; overrides the descriptor's config.
        #[arg(long)]
        namespace: Option<String>,
    },
}

#[derive(Args, Debug, Clone)]
pub struct GenerateArgs {
    /// Descriptor file (JSON).
    pub descriptor: PathBuf,

    /// Proto package; overrides the descriptor's config. Prompted for when
    /// neither is set and stdin is a terminal.
    #[arg(long)]
    pub namespace: Option<String>,

    /// Output root directory.
    #[arg(long, default_value = "./grpc_out")]
    pub out: PathBuf,

    /// Directory of model sources to copy (markers stripped).
    #[arg(long)]
    pub models_dir: Option<PathBuf>,

    /// Directory of service sources to copy (markers stripped).
    #[arg(long)]
    pub services_dir: Option<PathBuf>,

    /// Use pinned package versions instead of querying crates.io.
    #[arg(long)]
    pub offline: bool,

    /// Compute everything and list the artifacts without writing.
    #[arg(long)]
    pub dry_run: bool,

    /// Timeout for each package version request, in seconds.
    #[arg(long, default_value_t = 10)]
    pub timeout_secs: u64,
}
