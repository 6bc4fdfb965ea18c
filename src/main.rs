use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use mfmt_ftpd::config::Config;
use mfmt_ftpd::core_cli::Cli;
use mfmt_ftpd::core_log::logger;
use mfmt_ftpd::server;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    logger::init(args.verbose);

    let mut config = Config::load_from_file(&args.config).with_context(|| {
        format!(
            "Failed to load configuration file: {}",
            args.config.display()
        )
    })?;
    args.apply_overrides(&mut config);
    info!("Loaded configuration from {}", args.config.display());

    server::run(config, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl-C, shutting down");
    })
    .await
}
