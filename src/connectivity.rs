use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::AppError;

/// Online/offline flag shared between the probe, the store host and the UI.
#[derive(Clone)]
pub struct NetworkMonitor {
    tx: Arc<watch::Sender<bool>>,
    transitions: broadcast::Sender<bool>,
}

const TRANSITION_BUFFER: usize = 64;

impl NetworkMonitor {
    pub fn new(initially_online: bool) -> Self {
        let (tx, _rx) = watch::channel(initially_online);
        let (transitions, _) = broadcast::channel(TRANSITION_BUFFER);
        Self {
            tx: Arc::new(tx),
            transitions,
        }
    }

    pub fn is_online(&self) -> bool {
        *self.tx.borrow()
    }

    /// Records the latest reachability. Returns true on a transition.
    pub fn set_online(&self, online: bool) -> bool {
        let changed = self.tx.send_if_modified(|current| {
            if *current == online {
                return false;
            }
            *current = online;
            // Sent under the watch lock so subscribers see transitions in order.
            let _ = self.transitions.send(online);
            true
        });
        if changed {
            if online {
                info!("Back online");
            } else {
                warn!("Connection lost, working from cache");
            }
        }
        changed
    }

    /// Calls `callback` with the current state right away and then once per
    /// observed transition, until the returned subscription is dropped.
    /// Must be called from within a tokio runtime.
    pub fn subscribe<F>(&self, mut callback: F) -> Subscription
    where
        F: FnMut(bool) + Send + 'static,
    {
        let mut events = self.transitions.subscribe();
        let state = self.tx.subscribe();
        let mut last = *state.borrow();
        callback(last);

        let handle = tokio::spawn(async move {
            loop {
                let online = match events.recv().await {
                    Ok(online) => online,
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("Connectivity subscriber lagged, skipped {} transitions", skipped);
                        *state.borrow()
                    }
                    Err(RecvError::Closed) => break,
                };
                // A transition racing the initial read shows up once more; skip repeats.
                if online != last {
                    last = online;
                    callback(online);
                }
            }
        });

        Subscription { handle }
    }
}

pub struct Subscription {
    handle: JoinHandle<()>,
}

impl Subscription {
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Polls a well-known URL and feeds the result into a `NetworkMonitor`.
pub struct ConnectivityProbe {
    client: Client,
    url: String,
    interval: Duration,
    monitor: NetworkMonitor,
}

impl ConnectivityProbe {
    pub fn new(
        monitor: NetworkMonitor,
        url: impl Into<String>,
        interval_secs: u64,
    ) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build http client: {}", e)))?;

        Ok(Self {
            client,
            url: url.into(),
            interval: Duration::from_secs(interval_secs),
            monitor,
        })
    }

    /// Probes forever at the configured interval.
    pub async fn start(self) {
        info!("Starting connectivity probe against {} (interval: {:?})", self.url, self.interval);

        loop {
            let online = self.check().await;
            self.monitor.set_online(online);
            tokio::time::sleep(self.interval).await;
        }
    }

    async fn check(&self) -> bool {
        match self.client.get(&self.url).send().await {
            Ok(response) => {
                let status = response.status();
                debug!("Connectivity probe status {}", status);
                !status.is_server_error()
            }
            Err(e) => {
                debug!("Connectivity probe failed: {}", e);
                false
            }
        }
    }
}
