//! Periodic reconciliation loop
//!
//! Runs [`UploadJobManager::reconcile`] on a fixed interval to repair host
//! records whose upload job finished but whose remote state never resolved.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

use crate::manager::UploadJobManager;

pub struct Reconciler {
    shutdown_tx: mpsc::Sender<()>,
}

impl Reconciler {
    /// Spawn the reconcile loop. Missed ticks are skipped rather than
    /// bursted, so a slow pass never causes back-to-back runs.
    pub fn spawn(manager: Arc<UploadJobManager>, interval_secs: u64) -> Self {
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

            tracing::info!(interval_secs, "Reconciler started");
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        if let Err(e) = manager.reconcile().await {
                            tracing::error!(error = %e, "Reconcile pass failed");
                        }
                    }
                    _ = shutdown_rx.recv() => {
                        tracing::info!("Reconciler shutting down");
                        break;
                    }
                }
            }
        });

        Self { shutdown_tx }
    }

    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(()).await;
    }
}
