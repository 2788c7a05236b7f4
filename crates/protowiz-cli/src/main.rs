use anyhow::Result;
use clap::Parser;
use protowiz_core::CancelFlag;
use tracing_subscriber::EnvFilter;

mod args;
mod cmd;
mod instructions;
mod output;
mod versions;

const LOG_ENV: &str = "PROTOWIZ_LOG";

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);
    if json {
        builder.json().init();
    } else {
        builder.compact().init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = args::Cli::parse();
    output::init(cli.json);
    init_tracing(cli.log_json);

    let cancel = CancelFlag::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("interrupt received, stopping after the current service");
                cancel.cancel();
            }
        });
    }

    cmd::dispatch(cli, cancel).await
}
