// SPDX-License-Identifier: MIT OR Apache-2.0
//! `ability_timeline` - command-line harness for ability timelines
//!
//! - `validate`: load a document and report every issue
//! - `bake`: write the versioned binary definition table
//! - `simulate`: run a scripted scenario through the engine, logging requests
//! - `preview`: play one ability through a preview session
//!
//! Logging goes through `tracing`; `RUST_LOG` overrides the defaults.

mod commands;
mod error;
mod scenario;
mod sink;

use clap::{Parser, Subcommand};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const LOG_TARGETS: &[&str] = &[
    "ability_timeline",
    "ability_timeline_model",
    "ability_timeline_runtime",
    "ability_timeline_preview",
];

/// Validate, bake, simulate and preview ability timelines
#[derive(Parser, Debug)]
#[command(name = "ability_timeline", version)]
struct Cli {
    /// Log at debug level
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check an ability document
    Validate(commands::ValidateArgs),
    /// Bake an ability document into a binary table
    Bake(commands::BakeArgs),
    /// Run a scenario
    Simulate(commands::SimulateArgs),
    /// Play an ability in a preview session
    Preview(commands::PreviewArgs),
}

fn init_tracing(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let env_filter = LOG_TARGETS
        .iter()
        .filter_map(|target| format!("{target}={level}").parse().ok())
        .fold(tracing_subscriber::EnvFilter::from_default_env(), |filter, directive| {
            filter.add_directive(directive)
        });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    tracing::debug!("ability_timeline v{}", env!("CARGO_PKG_VERSION"));

    let result = match &cli.command {
        Command::Validate(args) => commands::validate(args),
        Command::Bake(args) => commands::bake(args),
        Command::Simulate(args) => commands::simulate(args),
        Command::Preview(args) => commands::preview(args),
    };
    if let Err(e) = result {
        tracing::error!("{e}");
        std::process::exit(1);
    }
}
