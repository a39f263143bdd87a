//! CLI command definitions for the `pbus` binary.

pub mod bundles;
pub mod status;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Named-message bus between a dashboard server and its panels.
#[derive(Parser)]
#[command(name = "pbus", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Export tracing spans via OpenTelemetry (stdout exporter).
    #[arg(long, global = true, env = "PANELBUS_OTEL")]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the bus server (WebSocket + REST).
    Serve {
        /// Port to listen on. Defaults to `server.port` from config.toml.
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to. Defaults to `server.host` from config.toml.
        #[arg(long)]
        host: Option<String>,
    },

    /// List loaded bundles with their version and git provenance.
    #[command(alias = "ls")]
    Bundles,

    /// Show data directory, effective configuration and bundle count.
    Status,

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

/// Default tracing filter for the given verbosity flags.
pub fn default_filter(verbose: u8, quiet: bool) -> &'static str {
    match verbose {
        0 if quiet => "error",
        0 => "warn",
        1 => "info,panelbus=debug",
        _ => "trace",
    }
}
