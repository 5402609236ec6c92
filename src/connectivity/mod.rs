//! Remote reachability tracking.
//!
//! The prober keeps an advisory `online` flag for presentation purposes. It is
//! never consulted by the repositories, which always try the remote store.

pub mod diagnostics;

use log::{debug, error, info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::backend::DocumentStore;
use crate::config::ConnectivityConfig;
use crate::constants::ADVISORY_WORKING_OFFLINE;

/// Host network transitions forwarded to a running prober.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkEvent {
    Online,
    Offline,
}

enum Control {
    Network(NetworkEvent),
    Shutdown,
}

/// Probes the remote store on a timer and on network events.
#[derive(Clone)]
pub struct ConnectivityProber {
    store: Arc<dyn DocumentStore>,
    poll_interval: Duration,
    probe_timeout: Duration,
}

impl ConnectivityProber {
    pub fn new(store: Arc<dyn DocumentStore>, config: &ConnectivityConfig) -> Self {
        Self::with_timings(store, config.poll_interval(), config.probe_timeout())
    }

    pub fn with_timings(store: Arc<dyn DocumentStore>, poll_interval: Duration, probe_timeout: Duration) -> Self {
        Self {
            store,
            poll_interval,
            probe_timeout,
        }
    }

    /// Single reachability probe. Errors and timeouts read as offline.
    pub async fn check_now(&self) -> bool {
        match tokio::time::timeout(self.probe_timeout, self.store.ping()).await {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                debug!("Probe of {} store failed: {e}", self.store.store_type());
                false
            }
            Err(_) => {
                debug!(
                    "Probe of {} store timed out after {:?}",
                    self.store.store_type(),
                    self.probe_timeout
                );
                false
            }
        }
    }

    /// Start the probe loop on the tokio runtime.
    ///
    /// The loop probes immediately, then once per poll interval. The state
    /// starts as offline until the first probe completes.
    pub fn spawn(self) -> ProberHandle {
        let (state_tx, state_rx) = watch::channel(false);
        let (control_tx, control_rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(self.run(state_tx, control_rx));

        ProberHandle {
            state: state_rx,
            control: control_tx,
            task,
        }
    }

    async fn run(self, state: watch::Sender<bool>, mut control: mpsc::UnboundedReceiver<Control>) {
        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let online = self.check_now().await;
                    publish(&state, online);
                }
                message = control.recv() => match message {
                    Some(Control::Network(NetworkEvent::Offline)) => publish(&state, false),
                    Some(Control::Network(NetworkEvent::Online)) => {
                        let online = self.check_now().await;
                        publish(&state, online);
                    }
                    Some(Control::Shutdown) | None => break,
                },
            }
        }
        debug!("Connectivity prober stopped");
    }
}

fn publish(state: &watch::Sender<bool>, online: bool) {
    let previous = state.send_replace(online);
    if previous != online {
        if online {
            info!("✅ Remote store reachable");
        } else {
            warn!("⚠️  {ADVISORY_WORKING_OFFLINE}: remote store unreachable");
        }
    }
}

/// Handle to a running prober.
pub struct ProberHandle {
    state: watch::Receiver<bool>,
    control: mpsc::UnboundedSender<Control>,
    task: JoinHandle<()>,
}

impl ProberHandle {
    /// Receiver notified after every probe.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.state.clone()
    }

    pub fn is_online(&self) -> bool {
        *self.state.borrow()
    }

    /// Forward a host network transition. `Offline` takes effect without a
    /// probe; `Online` triggers one.
    pub fn notify(&self, event: NetworkEvent) {
        if self.control.send(Control::Network(event)).is_err() {
            debug!("Connectivity prober already stopped, dropping {event:?}");
        }
    }

    /// Stop the loop and wait for it to finish.
    pub async fn shutdown(self) {
        let _ = self.control.send(Control::Shutdown);
        if let Err(e) = self.task.await {
            error!("❌ Connectivity prober task failed: {e}");
        }
    }
}
