use anyhow::{Context, Result as AnyhowResult};
use clap::Parser;
use savefmt::app::Watcher;
use savefmt::config::Config;
use savefmt::services::events::AcmeLog;
use savefmt::services::tracing_setup;
use std::path::PathBuf;

/// Re-format files as acme saves them, editing the open window in place
#[derive(Parser, Debug)]
#[command(name = "savefmt")]
#[command(about = "Re-format files on save and patch the acme window in place", long_about = None)]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Write logs to this file instead of stderr
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Print the effective configuration as JSON and exit
    #[arg(long)]
    dump_config: bool,

    /// Print the paths used by savefmt and exit
    #[arg(long)]
    show_paths: bool,

    /// Log the edits each save would make without touching the window
    #[arg(long)]
    dry_run: bool,
}

fn print_paths(args: &Args) {
    let default = Config::default_path();
    match &default {
        Some(path) => println!("default config: {}", path.display()),
        None => println!("default config: (no config directory)"),
    }
    if let Some(path) = &args.config {
        println!("config:         {}", path.display());
    }
    match &args.log_file {
        Some(path) => println!("log file:       {}", path.display()),
        None => println!("log file:       (stderr)"),
    }
}

fn main() -> AnyhowResult<()> {
    let args = Args::parse();

    if args.show_paths {
        print_paths(&args);
        return Ok(());
    }

    let config = Config::load_or_default(args.config.as_deref()).with_context(|| {
        match &args.config {
            Some(path) => format!("Failed to load config from {}", path.display()),
            None => "Failed to load config".to_string(),
        }
    })?;

    if args.dump_config {
        let json =
            serde_json::to_string_pretty(&config).context("Failed to serialize config")?;
        println!("{}", json);
        return Ok(());
    }

    tracing_setup::init_global(args.log_file.as_deref()).with_context(|| {
        let path = args.log_file.clone().unwrap_or_default();
        format!("Failed to open log file {}", path.display())
    })?;

    let mut log = AcmeLog::open(&config.acme.nine_p)
        .with_context(|| format!("Failed to read acme/log with {}", config.acme.nine_p))?;

    let mut watcher = Watcher::for_acme(&config).with_dry_run(args.dry_run);
    tracing::info!("savefmt watching acme (dry run: {})", args.dry_run);

    let result = watcher.run(&mut log);
    if let Err(e) = &result {
        tracing::error!("{:#}", e);
    }
    result
}
