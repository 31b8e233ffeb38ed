//! hotlog command line.
//!
//! # Architecture Overview
//!
//! ```text
//!     stdin lines ──▶ Logger ──▶ ConfigurationManager::dispatch
//!                                     │ (one atomic load)
//!                                     ▼
//!                               RoutingTable ──▶ filters ──▶ Template ──▶ targets
//!                                     ▲
//!     config.toml ──▶ ChangeDebouncer ──▶ reload loop ──▶ build + atomic publish
//! ```
//!
//! `run` routes every line read from stdin at the given level and logger
//! name, reloading the configuration whenever its files change. `check`
//! loads and builds a configuration and prints what it would route.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};

use hotlog::config::{build_routing_table, load_config, Catalog, ConfigurationManager, FileConfigSource};
use hotlog::lifecycle::{wait_for_signal, Shutdown, Signal};
use hotlog::observability::{logging, metrics};
use hotlog::{LogFactory, SeverityLevel};

#[derive(Parser)]
#[command(name = "hotlog", version, about = "Route log lines through a hot-reloaded configuration")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Route stdin lines through the configuration, reloading on change
    Run {
        #[arg(short, long)]
        config: PathBuf,

        /// Level every line is logged at
        #[arg(short, long, default_value = "info")]
        level: SeverityLevel,

        /// Logger name every line is logged under
        #[arg(long, default_value = "stdin")]
        logger: String,

        /// Do not watch the configuration files
        #[arg(long)]
        no_watch: bool,

        /// Serve Prometheus metrics on this address
        #[arg(long)]
        metrics_address: Option<SocketAddr>,
    },
    /// Validate a configuration and print its targets and rules
    Check {
        #[arg(short, long)]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_logging(None);

    match Cli::parse().command {
        Command::Run {
            config,
            level,
            logger,
            no_watch,
            metrics_address,
        } => run(config, level, logger, no_watch, metrics_address).await,
        Command::Check { config } => check(config),
    }
}

async fn run(
    config: PathBuf,
    level: SeverityLevel,
    logger_name: String,
    no_watch: bool,
    metrics_address: Option<SocketAddr>,
) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!("hotlog v{} starting", env!("CARGO_PKG_VERSION"));

    if let Some(addr) = metrics_address {
        metrics::init_metrics(addr);
    }

    let manager = Arc::new(ConfigurationManager::new(
        FileConfigSource::new(&config),
        Catalog::with_builtins(),
    )?);
    let factory = LogFactory::new(manager.clone());
    let logger = factory.get_logger(&logger_name);

    let shutdown = Arc::new(Shutdown::new());
    let watcher = if no_watch {
        None
    } else {
        manager.start_watching(shutdown.subscribe())
    };

    let signals = {
        let shutdown = shutdown.clone();
        let manager = manager.clone();
        tokio::spawn(async move {
            loop {
                match wait_for_signal().await {
                    Ok(Signal::Reload) => {
                        manager.reload_in_background().await;
                    }
                    Ok(Signal::Shutdown) => break,
                    Err(e) => {
                        tracing::error!(error = %e, "Failed to listen for signals");
                        break;
                    }
                }
            }
            shutdown.trigger();
        })
    };

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut shutdown_rx = shutdown.subscribe();
    loop {
        tokio::select! {
            line = lines.next_line() => match line? {
                Some(line) => {
                    logger.log(level, line);
                }
                None => break,
            },
            _ = shutdown_rx.recv() => break,
        }
    }

    shutdown.trigger();
    signals.abort();
    if let Some(handle) = watcher {
        if let Err(e) = handle.await {
            tracing::error!(error = %e, "Configuration watcher task failed");
        }
    }
    factory.flush();

    tracing::info!(generation = manager.generation(), "Shutdown complete");
    Ok(())
}

fn check(config: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let catalog = Catalog::with_builtins();
    let loaded = load_config(&config)?;
    let table = build_routing_table(&loaded.config, &catalog, 1)?;

    println!("files:");
    for file in &loaded.files {
        println!("  {}", file.display());
    }

    println!("targets:");
    for target in &loaded.config.targets {
        println!("  {} ({})", target.name, target.kind);
    }

    println!("rules:");
    for (index, rule) in loaded.config.rules.iter().enumerate() {
        let levels: Vec<_> = rule.enabled_levels().iter().map(|l| l.as_str()).collect();
        println!(
            "  #{index} logger={} levels=[{}] write_to=[{}]{}",
            rule.logger,
            levels.join(","),
            rule.write_to.join(","),
            if rule.is_final { " final" } else { "" }
        );
    }

    println!("levels:");
    for level in SeverityLevel::ALL {
        let count = table.chain(level).map_or(0, |head| head.iter().count());
        println!("  {:<5} {} entries", level.as_str(), count);
    }

    Ok(())
}
