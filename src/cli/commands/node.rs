//! Node management commands

use anyhow::Result;
use clap::Subcommand;
use serde::Serialize;

use crate::api::{BackendClient, MessageResponse, NodeInfo};
use crate::cli::output::{print_formatted, print_success, OutputFormat};
use crate::config::Config;

#[derive(Subcommand, Debug)]
pub enum NodeCommands {
    /// List peers registered with the tracker
    List,

    /// Show the node's recent log lines
    Logs,

    /// Register a node with the tracker
    Connect {
        /// Node address
        address: String,

        /// Node port
        port: u16,
    },

    /// Take the node offline
    Disconnect,

    /// Bring the node back online
    Reconnect,
}

#[derive(Serialize)]
struct NodeListResult {
    count: usize,
    nodes: Vec<NodeInfo>,
}

pub async fn run(
    command: NodeCommands,
    config: &Config,
    format: OutputFormat,
    quiet: bool,
) -> Result<()> {
    let client = BackendClient::new(&config.backend)?;

    match command {
        NodeCommands::List => list(&client, format).await,
        NodeCommands::Logs => logs(&client, format).await,
        NodeCommands::Connect { address, port } => {
            let response = client.connect_node(&address, port).await?;
            print_message(&response, format, quiet);
            Ok(())
        }
        NodeCommands::Disconnect => {
            let response = client.disconnect().await?;
            print_message(&response, format, quiet);
            Ok(())
        }
        NodeCommands::Reconnect => {
            let response = client.reconnect().await?;
            print_message(&response, format, quiet);
            Ok(())
        }
    }
}

async fn list(client: &BackendClient, format: OutputFormat) -> Result<()> {
    let nodes = client.get_active_nodes().await?;
    tracing::debug!("Tracker reports {} active nodes", nodes.len());

    let result = NodeListResult {
        count: nodes.len(),
        nodes,
    };

    print_formatted(&result, format, format_node_list);
    Ok(())
}

fn format_node_list(result: &NodeListResult) -> String {
    if result.nodes.is_empty() {
        return "No active nodes".to_string();
    }

    let mut lines = vec![format!("{} active nodes:", result.count)];
    for (i, node) in result.nodes.iter().enumerate() {
        lines.push(format!("{:>3}. {}:{}", i + 1, node.ip, node.port));
    }
    lines.join("\n")
}

async fn logs(client: &BackendClient, format: OutputFormat) -> Result<()> {
    let lines = client.get_logs().await?;
    print_formatted(&lines, format, |lines| lines.join("\n"));
    Ok(())
}

/// Transfer coins to another node
pub async fn send(
    config: &Config,
    recipient_ip: &str,
    amount: u64,
    format: OutputFormat,
    quiet: bool,
) -> Result<()> {
    let client = BackendClient::new(&config.backend)?;
    let receipt = client.send_transaction(recipient_ip, amount).await?;
    tracing::info!("Transaction sent to {} for amount {}", recipient_ip, amount);

    match format {
        OutputFormat::Json => print_formatted(&receipt, format, |_| String::new()),
        OutputFormat::Text => print_success(
            &format!(
                "Sent {} from {} to {} (port {})",
                receipt.amount, receipt.payer, recipient_ip, receipt.payee
            ),
            quiet,
        ),
    }
    Ok(())
}

fn print_message(response: &MessageResponse, format: OutputFormat, quiet: bool) {
    match format {
        OutputFormat::Json => print_formatted(response, format, |r| r.message.clone()),
        OutputFormat::Text => print_success(&response.message, quiet),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_node_list() {
        let result = NodeListResult {
            count: 2,
            nodes: vec![
                NodeInfo {
                    ip: "10.0.0.2".to_string(),
                    port: 50001,
                },
                NodeInfo {
                    ip: "10.0.0.3".to_string(),
                    port: 50002,
                },
            ],
        };
        assert_eq!(
            format_node_list(&result),
            "2 active nodes:\n  1. 10.0.0.2:50001\n  2. 10.0.0.3:50002"
        );
    }

    #[test]
    fn test_format_empty_node_list() {
        let result = NodeListResult {
            count: 0,
            nodes: Vec::new(),
        };
        assert_eq!(format_node_list(&result), "No active nodes");
    }
}
