use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dictfleet::config::Config;

#[derive(Parser)]
#[command(
    name = "dictfleet",
    version,
    about = "Serve a directory of MDict dictionaries, one listener per dictionary",
    long_about = "Serve a directory of MDict dictionaries, one listener per dictionary.\n\n\
        --dir accepts two layouts:\n\
        1. a single dictionary: the directory holding the .mdx file\n\
        2. several dictionaries: the parent of one directory per dictionary"
)]
struct Cli {
    /// Front door port [default: 3000]
    #[arg(short, long)]
    port: Option<u16>,

    /// Dictionary root directory (absolute path)
    #[arg(short, long)]
    dir: Option<PathBuf>,

    /// First port of the per-dictionary listeners [default: 44000]
    #[arg(long)]
    base_port: Option<u16>,

    /// Bind host for every listener [default: 127.0.0.1]
    #[arg(long)]
    host: Option<std::net::IpAddr>,

    /// Directory served at the front door's root
    #[arg(long)]
    static_dir: Option<PathBuf>,

    /// TOML configuration file; flags override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Log format (text, json)
    #[arg(long)]
    log_format: Option<String>,
}

impl Cli {
    fn into_config(self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_file(path)?,
            None => Config::default(),
        };

        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(dir) = self.dir {
            config.server.dir = Some(dir);
        }
        if let Some(base_port) = self.base_port {
            config.server.base_port = base_port;
        }
        if let Some(host) = self.host {
            config.server.host = host;
        }
        if let Some(static_dir) = self.static_dir {
            config.server.static_dir = Some(static_dir);
        }
        if let Some(format) = self.log_format {
            config.logging.format = format;
        }
        if self.verbose {
            config.logging.level = String::from("debug");
        }

        Ok(config)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let config = match Cli::parse().into_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("dictfleet: {e:#}");
            return ExitCode::from(2);
        }
    };

    setup_tracing(&config.logging.format, &config.logging.level);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "dictfleet starting");

    match dictfleet::commands::serve(config).await {
        Ok(report) => {
            if !report.is_clean() {
                tracing::warn!(
                    timed_out = ?report.timed_out,
                    failed = ?report.failed,
                    "Some resources did not close cleanly"
                );
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(category = e.category().label(), "{e}");
            ExitCode::from(u8::try_from(e.exit_code()).unwrap_or(1))
        }
    }
}

fn setup_tracing(format: &str, level: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(format!("dictfleet={level},tower_http={level},warn")));

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }
}
