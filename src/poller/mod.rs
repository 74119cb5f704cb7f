//! Periodic node status and balance polling.
//!
//! This module handles:
//! - Fetching `/status` then `/balance` as one cycle
//! - Merging both results into a `Snapshot` only when the whole cycle succeeds
//! - Publishing the latest `PollState` to observers over a watch channel
//! - Starting and stopping the recurring session

mod session;

use std::fmt;

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::api::FetchError;

pub use session::{fetch_snapshot, StatusPoller};

/// Merged view of remote state after a fully successful cycle
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Snapshot {
    pub node_active: bool,
    pub balance: f64,
}

/// Everything the poller publishes after a cycle
#[derive(Debug, Clone, Default)]
pub struct PollState {
    /// Last good snapshot (initial values until the first success)
    pub snapshot: Snapshot,
    /// Display message for the most recent failure, cleared on success
    pub error: Option<String>,
    /// When `snapshot` was last replaced
    pub last_success: Option<DateTime<Local>>,
    /// Completed cycles, successful or not
    pub cycles: u64,
    /// Completed cycles that failed
    pub failures: u64,
}

impl PollState {
    /// Fold one cycle's outcome into the state.
    ///
    /// A failed cycle leaves `snapshot` untouched.
    pub fn record(&mut self, outcome: Result<Snapshot, FetchError>) {
        self.cycles += 1;
        match outcome {
            Ok(snapshot) => {
                self.snapshot = snapshot;
                self.error = None;
                self.last_success = Some(Local::now());
            }
            Err(e) => {
                tracing::warn!(
                    kind = ?e.kind(),
                    timeout = e.is_timeout(),
                    "Failed to fetch status or balance: {}",
                    e
                );
                self.error = Some(format!("Error: {}", e));
                self.failures += 1;
            }
        }
    }

    /// Project onto what the display layer shows
    pub fn view(&self) -> DashboardView {
        DashboardView {
            node_active: self.snapshot.node_active,
            balance: self.snapshot.balance,
            message: self.error.clone().unwrap_or_default(),
        }
    }
}

/// Display-facing projection of `PollState`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub node_active: bool,
    pub balance: f64,
    /// Current error message, or empty
    pub message: String,
}

impl DashboardView {
    pub fn node_status(&self) -> &'static str {
        if self.node_active {
            "Connected"
        } else {
            "Disconnected"
        }
    }
}

impl fmt::Display for DashboardView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Node Status: {}", self.node_status())?;
        write!(f, "Balance: {}", self.balance)?;
        if !self.message.is_empty() {
            write!(f, "\n{}", self.message)?;
        }
        Ok(())
    }
}
