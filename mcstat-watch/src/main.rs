//! mcstat-watch entry point.
//!
//! ```text
//! mcstat-watch                        Watch the configured server
//! mcstat-watch --address <host:port>  Override the configured address
//! mcstat-watch --once                 Probe once, print, exit 0/1
//! mcstat-watch --config <path>        Load a custom config TOML
//! mcstat-watch --gen-config           Write default config to stdout
//! mcstat-watch --init                 Write default config to --config
//! ```

use std::path::PathBuf;

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use mcstat_core::{Address, Monitor, StatusProbe, probe_with};
use mcstat_watch::config::{ConfigError, WatchConfig};
use mcstat_watch::console::{ConsoleSink, render};
use mcstat_watch::notify::CommandNotifier;

// ── CLI ──────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "mcstat-watch", about = "Watch a Minecraft server and report reachability changes")]
struct Cli {
    /// Path to configuration TOML file.
    #[arg(short, long, default_value = "mcstat-watch.toml")]
    config: PathBuf,

    /// Server address (overrides config). Example: mc.example.net:25565
    #[arg(short, long)]
    address: Option<String>,

    /// Seconds between probes (overrides config).
    #[arg(short, long)]
    interval: Option<u64>,

    /// Probe once, print the result and exit.
    #[arg(long)]
    once: bool,

    /// Print the default configuration to stdout and exit.
    #[arg(long)]
    gen_config: bool,

    /// Write the default configuration to the --config path and exit.
    #[arg(long)]
    init: bool,
}

// ── Main ─────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // --gen-config: dump defaults and exit.
    if cli.gen_config {
        let text = toml::to_string_pretty(&WatchConfig::default())?;
        println!("{text}");
        return Ok(());
    }

    // --init: write defaults next to where we would read them.
    if cli.init {
        WatchConfig::write_default(&cli.config)?;
        println!("wrote {}", cli.config.display());
        return Ok(());
    }

    let (mut config, fallback) = WatchConfig::load_or_default(&cli.config);
    if let Some(address) = cli.address {
        config.server.address = address;
    }
    if let Some(interval) = cli.interval {
        config.monitor.interval_secs = interval;
    }

    // Init tracing. RUST_LOG wins over the configured level.
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("mcstat-watch v{}", env!("CARGO_PKG_VERSION"));
    match fallback {
        None => info!("config: {}", cli.config.display()),
        Some(e @ ConfigError::Missing(_)) => info!("{e}; using defaults"),
        Some(e) => warn!("{e}; using defaults"),
    }

    // --once: single probe, exit status tells online from offline.
    if cli.once {
        let address = Address::parse(&config.server.address)?;
        let result = probe_with(&address, &config.probe_options()).await;
        println!("{}", render(&result));
        if !result.is_online() {
            std::process::exit(1);
        }
        return Ok(());
    }

    let probe = StatusProbe::new(config.probe_options());
    let notifier = CommandNotifier::new(config.notify_command());

    info!("server: {}", config.server.address);
    info!("timeout: {:?}", probe.options().timeout);
    match notifier.command() {
        Some(command) => info!("notify command: {command}"),
        None => info!("no notify command; changes are logged only"),
    }

    let mut monitor = Monitor::new(config.monitor_config(), probe, ConsoleSink, notifier);
    info!("interval: {:?}", monitor.config().interval);
    monitor.start(&config.server.address)?;

    tokio::signal::ctrl_c().await?;
    info!("Ctrl-C received; shutting down");
    monitor.shutdown().await;

    Ok(())
}
