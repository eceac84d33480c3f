//! Status Poller
//!
//! Keeps the processing screen current: fetches the active request's status
//! right away, then on every poll interval, and publishes the derived state on
//! a watch channel. Dropping the [`PollerHandle`] stops the loop; anything that
//! arrives after that is discarded.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use geosat_client::ApiClient;
use geosat_core::{ImageStatus, PaymentStatus, Presenter};

/// Where the status comes from
#[async_trait]
pub trait StatusSource: Send + Sync {
    async fn fetch_status(&self) -> geosat_core::Result<Option<PaymentStatus>>;
}

#[async_trait]
impl StatusSource for ApiClient {
    async fn fetch_status(&self) -> geosat_core::Result<Option<PaymentStatus>> {
        self.payment_status().await
    }
}

/// What the processing screen should show
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum PollState {
    /// No status fetched yet
    #[default]
    Loading,
    NoActiveRequest,
    Processing,
    ReadyForPayment {
        payment_id: String,
        pending_amount: Option<Decimal>,
    },
}

/// Map a backend status to a screen state
pub fn derive_state(status: Option<&PaymentStatus>) -> PollState {
    let Some(status) = status else {
        return PollState::NoActiveRequest;
    };
    if status.payment_status.is_completed() {
        return PollState::NoActiveRequest;
    }
    match status.image_status {
        ImageStatus::Ready => PollState::ReadyForPayment {
            payment_id: status.payment_id.clone(),
            pending_amount: status.pending_amount,
        },
        // unknown statuses never offer a payment
        ImageStatus::Pending | ImageStatus::Processing | ImageStatus::Other(_) => PollState::Processing,
    }
}

/// Latest poll result
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PollSnapshot {
    pub state: PollState,
    pub status: Option<PaymentStatus>,

    /// Set when the most recent fetch failed; the state is from the last success
    pub last_error: Option<String>,
}

pub struct StatusPoller;

impl StatusPoller {
    /// Start polling on the current runtime
    pub fn spawn(
        source: Arc<dyn StatusSource>,
        presenter: Arc<dyn Presenter>,
        interval: Duration,
    ) -> PollerHandle {
        let (tx, rx) = watch::channel(PollSnapshot::default());
        let token = CancellationToken::new();
        let refresh = Arc::new(Notify::new());

        let task = tokio::spawn(poll_loop(
            source,
            presenter,
            interval,
            tx,
            token.clone(),
            Arc::clone(&refresh),
        ));
        tracing::debug!(interval_secs = interval.as_secs(), "Status poller started");

        PollerHandle {
            token,
            rx,
            refresh,
            task: Some(task),
        }
    }
}

async fn poll_loop(
    source: Arc<dyn StatusSource>,
    presenter: Arc<dyn Presenter>,
    interval: Duration,
    tx: watch::Sender<PollSnapshot>,
    token: CancellationToken,
    refresh: Arc<Notify>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            () = token.cancelled() => break,
            _ = ticker.tick() => {}
            () = refresh.notified() => tracing::debug!("Manual status refresh"),
        }

        let result = tokio::select! {
            biased;
            () = token.cancelled() => break,
            result = source.fetch_status() => result,
        };

        // the screen may have gone away while the request was in flight
        if token.is_cancelled() {
            break;
        }

        match result {
            Ok(status) => {
                let state = derive_state(status.as_ref());
                tracing::debug!(?state, "Status updated");
                tx.send_replace(PollSnapshot {
                    state,
                    status,
                    last_error: None,
                });
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to fetch status");
                presenter.error("Failed to fetch status");
                tx.send_modify(|snapshot| snapshot.last_error = Some(e.user_message()));
            }
        }
    }

    tracing::debug!("Status poller stopped");
}

/// Owner of a running poller; dropping it stops the poller
pub struct PollerHandle {
    token: CancellationToken,
    rx: watch::Receiver<PollSnapshot>,
    refresh: Arc<Notify>,
    task: Option<JoinHandle<()>>,
}

impl PollerHandle {
    pub fn subscribe(&self) -> watch::Receiver<PollSnapshot> {
        self.rx.clone()
    }

    pub fn snapshot(&self) -> PollSnapshot {
        self.rx.borrow().clone()
    }

    pub fn state(&self) -> PollState {
        self.rx.borrow().state.clone()
    }

    /// Fetch now instead of waiting for the next tick
    pub fn refresh_now(&self) {
        self.refresh.notify_one();
    }

    pub fn stop(&self) {
        self.token.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Stop and wait for the poll task to exit
    pub async fn shutdown(mut self) {
        self.token.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "Status poller task failed");
            }
        }
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
