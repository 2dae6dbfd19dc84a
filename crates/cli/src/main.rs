//! Teawatch CLI - live dashboard of filesystem changes

use anyhow::Result;
use clap::Parser;
use cli_lib::{logging, runtime, Config};
use owo_colors::OwoColorize;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;

/// Teawatch - watch a directory tree change in real time
#[derive(Parser)]
#[command(name = "teawatch")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory to monitor (default: current directory)
    path: Option<PathBuf>,

    /// Use Nerd Font icons
    #[arg(long, conflicts_with = "ascii")]
    nerd_fonts: bool,

    /// Use plain ASCII icons
    #[arg(long)]
    ascii: bool,

    /// Config file (default: <config dir>/teawatch/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Seconds a deleted path stays visible
    #[arg(long, value_name = "N")]
    tombstone_secs: Option<u64>,

    /// Log file (default: <data dir>/teawatch/teawatch.log)
    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,
}

impl Cli {
    /// Flags take precedence over the config file
    fn apply_overrides(&self, config: &mut Config) {
        if self.nerd_fonts {
            config.nerd_fonts = true;
        }
        if self.ascii {
            config.nerd_fonts = false;
        }
        if let Some(secs) = self.tombstone_secs {
            config.tombstone_secs = secs;
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {:#}", "error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load(cli.config.as_deref())?;
    cli.apply_overrides(&mut config);
    config.validate()?;

    let _guard = logging::init(cli.log_file.as_deref())?;
    let root = runtime::resolve_root(cli.path)?;
    info!("Starting teawatch on {}", root.display());

    runtime::run(config, root).await
}
