//! CLI module for walletdash
//!
//! Provides the dashboard loop plus one-shot commands against the node.

mod commands;
mod output;

use clap::{Parser, Subcommand};

use crate::config::Config;

pub use output::{print_error, OutputFormat};

/// walletdash - wallet node dashboard
#[derive(Parser, Debug)]
#[command(name = "walletdash")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[command(flatten)]
    pub output: OutputOptions,

    /// Backend address overrides
    #[command(flatten)]
    pub backend: BackendOverrides,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output formatting options
#[derive(Parser, Debug, Clone)]
pub struct OutputOptions {
    /// Output in JSON format (for machine parsing)
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Increase output verbosity
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

impl OutputOptions {
    pub fn format(&self) -> OutputFormat {
        if self.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

/// Per-invocation overrides for the configured backend
#[derive(Parser, Debug, Clone, Default)]
pub struct BackendOverrides {
    /// Backend host (overrides config file)
    #[arg(long, global = true)]
    pub host: Option<String>,

    /// Backend port (overrides config file)
    #[arg(long, global = true)]
    pub port: Option<u16>,

    /// Seconds between polls (overrides config file)
    #[arg(long, global = true)]
    pub interval: Option<u64>,
}

impl BackendOverrides {
    /// Apply overrides on top of a loaded configuration
    pub fn apply(&self, mut config: Config) -> anyhow::Result<Config> {
        if let Some(host) = &self.host {
            config.backend.host = host.clone();
        }
        if let Some(port) = self.port {
            config.backend.port = port;
        }
        if let Some(interval) = self.interval {
            config.poller.interval_secs = interval;
        }
        config.validate()?;
        Ok(config)
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Poll node status and balance until interrupted
    Watch,

    /// Fetch node status and balance once
    Status,

    /// Node management
    Node {
        #[command(subcommand)]
        command: commands::node::NodeCommands,
    },

    /// Send coins to another node
    Send {
        /// Recipient node IP address
        recipient_ip: String,

        /// Amount to send (whole units)
        amount: u64,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        command: commands::config::ConfigCommands,
    },
}

/// Run the CLI with parsed arguments
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let format = cli.output.format();
    let quiet = cli.output.quiet;

    let overrides = cli.backend;
    let load = || -> anyhow::Result<Config> { overrides.apply(Config::load()?) };

    match cli.command {
        Commands::Watch => commands::dashboard::watch(&load()?, format, quiet).await,
        Commands::Status => commands::dashboard::status(&load()?, format).await,
        Commands::Node { command } => commands::node::run(command, &load()?, format, quiet).await,
        Commands::Send {
            recipient_ip,
            amount,
        } => commands::node::send(&load()?, &recipient_ip, amount, format, quiet).await,
        Commands::Config { command } => commands::config::run(command, format, quiet).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_watch_with_overrides() {
        let cli = Cli::try_parse_from([
            "walletdash",
            "--host",
            "10.0.0.5",
            "--port",
            "5005",
            "watch",
            "--json",
        ])
        .unwrap();

        assert!(matches!(cli.command, Commands::Watch));
        assert_eq!(cli.output.format(), OutputFormat::Json);

        let config = cli.backend.apply(Config::default()).unwrap();
        assert_eq!(config.backend.base_url(), "http://10.0.0.5:5005");
    }

    #[test]
    fn test_parse_send() {
        let cli = Cli::try_parse_from(["walletdash", "send", "10.0.0.2", "25"]).unwrap();
        match cli.command {
            Commands::Send {
                recipient_ip,
                amount,
            } => {
                assert_eq!(recipient_ip, "10.0.0.2");
                assert_eq!(amount, 25);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_negative_amount_rejected_by_parser() {
        assert!(Cli::try_parse_from(["walletdash", "send", "10.0.0.2", "-5"]).is_err());
    }

    #[test]
    fn test_zero_interval_override_rejected() {
        let overrides = BackendOverrides {
            interval: Some(0),
            ..Default::default()
        };
        assert!(overrides.apply(Config::default()).is_err());
    }

    #[test]
    fn test_parse_node_connect() {
        let cli =
            Cli::try_parse_from(["walletdash", "node", "connect", "35.222.131.246", "50007"])
                .unwrap();
        assert!(matches!(cli.command, Commands::Node { .. }));
    }
}
