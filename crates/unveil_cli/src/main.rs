//! Unveil CLI
//!
//! Replay scroll sessions against a page description and inspect the
//! scheduler configuration.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use unveil_reveal::UnveilConfig;

mod page;
mod simulate;

use page::PageFile;
use simulate::{SimulationOptions, SimulationReport};

#[derive(Parser)]
#[command(name = "unveil")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Scroll-triggered reveal animation scheduler", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a page's scroll script and print every DOM mutation
    Simulate {
        /// Page description (TOML)
        page: PathBuf,

        /// Scheduler configuration (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Frame interval in milliseconds
        #[arg(long, default_value = "16")]
        frame_ms: f64,

        /// Stop at this time instead of when the page goes idle
        #[arg(long)]
        until_ms: Option<f64>,
    },

    /// Validate a configuration file
    Check {
        /// Configuration file
        config: PathBuf,
    },

    /// Print the default configuration
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(log_filter(cli.verbose))
        .init();

    match cli.command {
        Commands::Simulate {
            page,
            config,
            frame_ms,
            until_ms,
        } => cmd_simulate(
            &page,
            config.as_deref(),
            SimulationOptions { frame_ms, until_ms },
        ),

        Commands::Check { config } => cmd_check(&config),

        Commands::Config => cmd_config(),
    }
}

/// `--verbose` forces debug; otherwise `RUST_LOG`, falling back to info
fn log_filter(verbose: bool) -> EnvFilter {
    if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    }
}

fn load_config(path: Option<&Path>) -> Result<UnveilConfig> {
    let config = match path {
        Some(path) => UnveilConfig::load(path)?,
        None => UnveilConfig::default(),
    };
    config.validate()?;
    Ok(config)
}

fn cmd_simulate(page: &Path, config: Option<&Path>, options: SimulationOptions) -> Result<()> {
    let config = load_config(config)?;
    let mut loaded = PageFile::load(page)?.build()?;

    info!(
        "Simulating {} ({} nodes, {} scroll steps, {}ms frames)",
        page.display(),
        loaded.page.node_count(),
        loaded.scrolls.len(),
        options.frame_ms
    );

    let report = simulate::run(&mut loaded, config, options)
        .with_context(|| format!("Simulation of {} failed", page.display()))?;
    print_report(&loaded, &report);

    Ok(())
}

fn print_report(loaded: &page::LoadedPage, report: &SimulationReport) {
    for logged in &report.mutations {
        println!("{:>8.1}ms  {}", logged.at_ms, logged.mutation);
    }

    println!();
    println!(
        "{} frames, ended at {:.1}ms",
        report.frames, report.ended_at_ms
    );
    println!();

    let width = loaded
        .names
        .iter()
        .map(String::len)
        .max()
        .unwrap_or(0)
        .max(4);
    for element in &report.elements {
        let marker = element
            .marker
            .map(|m| m.class_name())
            .unwrap_or("-");
        let state = if element.triggered {
            "triggered"
        } else {
            "waiting"
        };
        let text = if element.text.is_empty() {
            String::new()
        } else {
            format!("  {:?}", element.text)
        };
        println!(
            "  {:<width$}  {:<16}  {:<9}  [{}]{}",
            element.name,
            marker,
            state,
            element.classes.join(" "),
            text,
            width = width
        );
    }
}

fn cmd_check(path: &Path) -> Result<()> {
    load_config(Some(path)).with_context(|| format!("{} is not a valid config", path.display()))?;
    info!("{} is valid", path.display());
    Ok(())
}

fn cmd_config() -> Result<()> {
    print!("{}", UnveilConfig::default().to_toml_string()?);
    Ok(())
}
