//! Backend connectivity monitor
//!
//! Probes the backend once at start and then on a fixed interval, publishing
//! a tri-state status on a `watch` channel. The monitor only ever writes the
//! status; it never touches conversation state.

use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

use crate::providers::ResearchBackend;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiStatus {
    Checking,
    Connected,
    Error,
}

pub struct ConnectivityMonitor;

impl ConnectivityMonitor {
    /// Start probing `backend` every `period`; the first probe runs immediately
    pub fn spawn(backend: Arc<dyn ResearchBackend>, period: Duration) -> ConnectivityHandle {
        let (tx, rx) = watch::channel(ApiStatus::Checking);

        let task = tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;

                let status = match backend.probe().await {
                    Ok(()) => ApiStatus::Connected,
                    Err(e) => {
                        tracing::debug!("Backend probe failed: {}", e);
                        ApiStatus::Error
                    }
                };

                let changed = tx.send_if_modified(|current| {
                    if *current == status {
                        return false;
                    }
                    *current = status;
                    true
                });
                if changed {
                    tracing::info!(?status, "Backend connectivity changed");
                }
            }
        });

        ConnectivityHandle {
            rx,
            task: Some(task),
        }
    }
}

/// Read side of the monitor; stops the probe task when dropped
pub struct ConnectivityHandle {
    rx: watch::Receiver<ApiStatus>,
    task: Option<JoinHandle<()>>,
}

impl ConnectivityHandle {
    /// A handle pinned to one status, with no probing
    pub fn fixed(status: ApiStatus) -> Self {
        let (_, rx) = watch::channel(status);
        Self { rx, task: None }
    }

    pub fn status(&self) -> ApiStatus {
        *self.rx.borrow()
    }

    pub fn is_connected(&self) -> bool {
        self.status() == ApiStatus::Connected
    }

    pub fn subscribe(&self) -> watch::Receiver<ApiStatus> {
        self.rx.clone()
    }
}

impl Drop for ConnectivityHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
