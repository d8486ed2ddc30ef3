//! Command-line interface for itemetrics
//!
//! Provides argument parsing and subcommand handling for the itemetrics binary.

use clap::{Parser, Subcommand};

/// In-memory item service with Prometheus request metrics
#[derive(Parser)]
#[command(name = "itemetrics")]
#[command(version)]
#[command(about = "In-memory item service with Prometheus request metrics")]
#[command(
    long_about = "itemetrics serves CRUD operations over an in-memory item collection \
    and exposes request counts, latencies and in-flight requests at /metrics."
)]
pub struct Cli {
    /// Path to configuration file (defaults are used if it does not exist)
    #[arg(short, long, default_value = "config.toml", global = true)]
    pub config: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Generate a template configuration file
    Config {
        /// Output file path (prints to stdout if not specified)
        #[arg(short, long)]
        output: Option<String>,
    },
}

/// Generate template configuration content
pub fn generate_config_template() -> &'static str {
    r#"# itemetrics configuration
#
# Every setting is optional. Values shown are the defaults.

[server]
# IP address to bind to (0.0.0.0 for all interfaces, 127.0.0.1 for localhost only)
host = "0.0.0.0"

# Port to listen on
port = 8080

[observability]
# Log level: "trace", "debug", "info", "warn", "error"
# RUST_LOG overrides this when set.
log_level = "info"

# Source of the `path` label on http_request_* metrics:
#   - "raw": literal request path, e.g. /items/42 (one series per item id)
#   - "matched": route template, e.g. /items/{id}
path_label = "raw"

# Prometheus metrics are always available at /metrics on the server port
"#
}
