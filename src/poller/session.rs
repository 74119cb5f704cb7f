//! Recurring poll session

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::api::{BackendClient, FetchError};
use crate::poller::{PollState, Snapshot};

/// Shortest period the scheduler accepts
const MIN_INTERVAL: Duration = Duration::from_millis(10);

/// Fetch status then balance and merge them.
///
/// The balance request is only issued once status has succeeded and decoded.
pub async fn fetch_snapshot(client: &BackendClient) -> Result<Snapshot, FetchError> {
    let status = client.get_status().await?;
    let balance = client.get_balance().await?;

    Ok(Snapshot {
        node_active: status.active,
        balance: balance.balance,
    })
}

/// Run one cycle and publish its outcome as a single state replacement.
async fn run_cycle(client: &BackendClient, state_tx: &watch::Sender<PollState>) {
    let outcome = fetch_snapshot(client).await;
    state_tx.send_modify(|state| state.record(outcome));
}

/// A running poll loop
struct Session {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

/// Drives periodic status/balance retrieval and publishes a consistent state.
///
/// Cycles run one at a time inside a single task. Ticks that fall while a
/// cycle is in flight are dropped; after a cycle that outlasts the interval,
/// the next one starts a full interval after it finished.
///
/// Only `stop()` guarantees that no state is published afterwards. Dropping
/// the poller aborts its task without waiting, so a subscriber may still see
/// one last update from a cycle that was finishing at that moment.
pub struct StatusPoller {
    client: BackendClient,
    interval: Duration,
    state_tx: Arc<watch::Sender<PollState>>,
    session: Option<Session>,
}

impl StatusPoller {
    pub fn new(client: BackendClient, interval: Duration) -> Self {
        let (state_tx, _) = watch::channel(PollState::default());
        Self {
            client,
            interval: interval.max(MIN_INTERVAL),
            state_tx: Arc::new(state_tx),
            session: None,
        }
    }

    /// Check if a session is currently active
    pub fn is_running(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(|session| !session.task.is_finished())
    }

    /// Start polling: one cycle now, then one per interval.
    ///
    /// Returns false if a session is already running.
    pub fn start(&mut self) -> bool {
        // Don't start if already polling
        if self.is_running() {
            return false;
        }

        let cancel = CancellationToken::new();
        let task = tokio::spawn(poll_loop(
            self.client.clone(),
            self.interval,
            Arc::clone(&self.state_tx),
            cancel.clone(),
        ));

        tracing::info!(
            "Polling {} every {:.1}s",
            self.client.base_url(),
            self.interval.as_secs_f32()
        );
        self.session = Some(Session { cancel, task });
        true
    }

    /// Stop polling.
    ///
    /// Any in-flight request is abandoned. Once this returns, no request is
    /// issued and the published state no longer changes.
    pub async fn stop(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };

        session.cancel.cancel();
        if let Err(e) = session.task.await {
            if e.is_panic() {
                tracing::error!("Poll task panicked: {}", e);
            }
        }
        tracing::info!("Polling stopped");
    }

    /// Receiver notified after every completed cycle
    pub fn subscribe(&self) -> watch::Receiver<PollState> {
        self.state_tx.subscribe()
    }

    /// Latest published state
    pub fn state(&self) -> PollState {
        self.state_tx.borrow().clone()
    }
}

impl Drop for StatusPoller {
    /// Cancels and aborts the task without awaiting it; see `stop` for the
    /// no-further-updates guarantee.
    fn drop(&mut self) {
        if let Some(session) = self.session.take() {
            session.cancel.cancel();
            session.task.abort();
        }
    }
}

async fn poll_loop(
    client: BackendClient,
    period: Duration,
    state_tx: Arc<watch::Sender<PollState>>,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        // First tick completes immediately
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        tracing::debug!("Starting fetch cycle");
        let started = Instant::now();
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::debug!("Abandoning in-flight fetch cycle");
                break;
            }
            _ = run_cycle(&client, &state_tx) => {}
        }

        // Overran the interval: wait a full period from now instead of
        // firing the missed tick straight away
        if started.elapsed() >= period {
            tracing::debug!(
                "Fetch cycle took {:.1}s, longer than the interval",
                started.elapsed().as_secs_f32()
            );
            ticker.reset();
        }
    }
}
