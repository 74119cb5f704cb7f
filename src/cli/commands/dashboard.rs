//! Dashboard commands: continuous watch and one-shot status

use std::future::Future;
use std::io::{self, Write};

use anyhow::Result;
use tokio::sync::watch;

use crate::api::BackendClient;
use crate::cli::output::{print_formatted, print_success, write_json_line, OutputFormat};
use crate::config::Config;
use crate::poller::{fetch_snapshot, PollState, StatusPoller};

/// Poll until Ctrl-C, rendering every published state
pub async fn watch(config: &Config, format: OutputFormat, quiet: bool) -> Result<()> {
    let client = BackendClient::new(&config.backend)?;
    let mut poller = StatusPoller::new(client, config.poller.interval());
    let rx = poller.subscribe();

    if format == OutputFormat::Text {
        print_success(
            &format!(
                "Watching {} every {}s (Ctrl-C to stop)\n",
                config.backend.base_url(),
                config.poller.interval_secs
            ),
            quiet,
        );
    }

    poller.start();

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to listen for Ctrl-C: {}", e);
        }
    };
    let rendered = render_until(rx, shutdown, format, &mut io::stdout()).await;

    poller.stop().await;
    let state = poller.state();
    tracing::info!(
        "Stopped after {} cycles ({} failed)",
        state.cycles,
        state.failures
    );
    rendered.map(|_| ())
}

/// Render each published state until `shutdown` resolves or the
/// publisher goes away. Returns how many states were rendered.
async fn render_until<W, F>(
    mut rx: watch::Receiver<PollState>,
    shutdown: F,
    format: OutputFormat,
    out: &mut W,
) -> Result<usize>
where
    W: Write,
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);
    let mut rendered = 0;

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            changed = rx.changed() => {
                if changed.is_err() {
                    tracing::debug!("Poller closed its state channel");
                    break;
                }
                let state = rx.borrow_and_update().clone();
                render(&state, format, out)?;
                rendered += 1;
            }
        }
    }

    Ok(rendered)
}

/// Run a single cycle and print the result
pub async fn status(config: &Config, format: OutputFormat) -> Result<()> {
    let client = BackendClient::new(&config.backend)?;
    let snapshot = fetch_snapshot(&client).await?;

    let mut state = PollState::default();
    state.record(Ok(snapshot));
    print_formatted(&state.view(), format, |view| view.to_string());

    Ok(())
}

fn render<W: Write>(state: &PollState, format: OutputFormat, out: &mut W) -> io::Result<()> {
    match format {
        OutputFormat::Json => write_json_line(out, &state.view()),
        OutputFormat::Text => {
            writeln!(out, "{}\n", render_text(state))?;
            out.flush()
        }
    }
}

fn render_text(state: &PollState) -> String {
    let mut text = state.view().to_string();
    if let Some(at) = state.last_success {
        text.push_str(&format!("\nLast updated: {}", at.format("%H:%M:%S")));
    }
    text
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::poller::Snapshot;

    fn connected(balance: f64) -> PollState {
        let mut state = PollState::default();
        state.record(Ok(Snapshot {
            node_active: true,
            balance,
        }));
        state
    }

    #[test]
    fn test_render_text_before_first_success() {
        let state = PollState {
            error: Some("Error: Failed to fetch node status: 500".to_string()),
            cycles: 1,
            failures: 1,
            ..Default::default()
        };
        assert_eq!(
            render_text(&state),
            "Node Status: Disconnected\nBalance: 0\nError: Failed to fetch node status: 500"
        );
    }

    #[test]
    fn test_render_text_includes_update_time() {
        let mut state = PollState::default();
        state.record(Ok(Snapshot {
            node_active: true,
            balance: 42.0,
        }));
        let text = render_text(&state);
        assert!(text.starts_with("Node Status: Connected\nBalance: 42\nLast updated: "));
    }

    #[tokio::test]
    async fn test_json_lines_until_channel_closes() {
        let (tx, rx) = watch::channel(PollState::default());
        let feeder = tokio::spawn(async move {
            tx.send(connected(42.0)).unwrap();
            tokio::time::sleep(Duration::from_millis(20)).await;
            tx.send(PollState {
                error: Some("Error: Failed to fetch node status: 500".to_string()),
                ..connected(42.0)
            })
            .unwrap();
            tokio::time::sleep(Duration::from_millis(20)).await;
        });

        let mut out = Vec::new();
        let rendered = tokio::time::timeout(
            Duration::from_secs(5),
            render_until(rx, std::future::pending(), OutputFormat::Json, &mut out),
        )
        .await
        .expect("render loop should end once the sender is dropped")
        .unwrap();
        feeder.await.unwrap();

        assert_eq!(rendered, 2);
        let lines: Vec<serde_json::Value> = String::from_utf8(out)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(
            lines,
            vec![
                serde_json::json!({ "node_active": true, "balance": 42.0, "message": "" }),
                serde_json::json!({
                    "node_active": true,
                    "balance": 42.0,
                    "message": "Error: Failed to fetch node status: 500"
                }),
            ]
        );
    }

    #[tokio::test]
    async fn test_shutdown_ends_render_loop() {
        let (tx, rx) = watch::channel(PollState::default());

        let mut out = Vec::new();
        let shutdown = tokio::time::sleep(Duration::from_millis(50));
        let rendered = render_until(rx, shutdown, OutputFormat::Json, &mut out)
            .await
            .unwrap();

        assert_eq!(rendered, 0);
        assert!(out.is_empty());
        drop(tx);
    }

    #[tokio::test]
    async fn test_text_render_separates_states() {
        let (tx, rx) = watch::channel(PollState::default());
        tx.send(PollState {
            error: Some("Error: Failed to fetch node status: 500".to_string()),
            cycles: 1,
            failures: 1,
            ..Default::default()
        })
        .unwrap();
        drop(tx);

        let mut out = Vec::new();
        let rendered = render_until(rx, std::future::pending(), OutputFormat::Text, &mut out)
            .await
            .unwrap();

        assert_eq!(rendered, 1);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Node Status: Disconnected\nBalance: 0\nError: Failed to fetch node status: 500\n\n"
        );
    }
}
