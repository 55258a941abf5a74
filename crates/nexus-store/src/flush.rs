//! # Flush Worker
//!
//! Writes snapshots to the persistence port in the background, so a
//! mutation never waits on storage.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Flush Worker                                   │
//! │                                                                         │
//! │  Store (under write lock)                                              │
//! │     │ enqueue(snapshot)   ── unbounded, never blocks                   │
//! │     ▼                                                                   │
//! │  ┌──────────────────────────┐                                          │
//! │  │ Save(s1) Save(s2) Save(s3)│  ── drained together                    │
//! │  └────────────┬─────────────┘                                          │
//! │               ▼                                                         │
//! │        pending = s3            ── only the newest snapshot matters     │
//! │               │                                                         │
//! │               ▼                                                         │
//! │        port.save(s3)                                                   │
//! │           │        │                                                    │
//! │        Ok │        │ Err                                               │
//! │           ▼        ▼                                                    │
//! │       Healthy   Degraded + warn!  ── in-memory state stays as is       │
//! │                                                                         │
//! │  Status is published on a watch channel for the views to observe.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Snapshots are taken under the store's write lock, so enqueue order is
//! commit order and the last one saved is always the latest state.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use nexus_core::DomainSnapshot;

use crate::port::PersistencePort;

// =============================================================================
// Status
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PersistenceState {
    #[default]
    Healthy,
    /// The last save failed. Memory is ahead of storage until one succeeds.
    Degraded,
}

impl fmt::Display for PersistenceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PersistenceState::Healthy => write!(f, "healthy"),
            PersistenceState::Degraded => write!(f, "degraded"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistenceStatus {
    pub state: PersistenceState,
    /// Message of the most recent failure; kept after recovery.
    pub last_error: Option<String>,
    pub failure_count: u64,
    pub saved_count: u64,
    pub last_saved_at: Option<DateTime<Utc>>,
}

impl PersistenceStatus {
    pub fn is_healthy(&self) -> bool {
        self.state == PersistenceState::Healthy
    }
}

// =============================================================================
// Handle
// =============================================================================

#[derive(Debug)]
enum FlushCommand {
    Save(Box<DomainSnapshot>),
    /// Persist whatever is pending, then ack.
    Flush(oneshot::Sender<()>),
    /// Persist whatever is pending, ack and stop.
    Shutdown(oneshot::Sender<()>),
}

#[derive(Debug, Clone)]
pub struct FlushHandle {
    cmd_tx: mpsc::UnboundedSender<FlushCommand>,
}

impl FlushHandle {
    /// Queue a snapshot. Returns false if the worker has stopped.
    pub fn enqueue(&self, snapshot: DomainSnapshot) -> bool {
        let sent = self
            .cmd_tx
            .send(FlushCommand::Save(Box::new(snapshot)))
            .is_ok();
        if !sent {
            warn!("Flush worker stopped, snapshot not queued");
        }
        sent
    }

    /// Wait until everything queued so far has been attempted.
    pub async fn flush(&self) -> bool {
        let (ack_tx, ack_rx) = oneshot::channel();
        if self.cmd_tx.send(FlushCommand::Flush(ack_tx)).is_err() {
            return false;
        }
        ack_rx.await.is_ok()
    }

    /// Final flush, then stop the worker.
    pub async fn shutdown(&self) -> bool {
        let (ack_tx, ack_rx) = oneshot::channel();
        if self.cmd_tx.send(FlushCommand::Shutdown(ack_tx)).is_err() {
            return false;
        }
        ack_rx.await.is_ok()
    }
}

// =============================================================================
// Worker
// =============================================================================

pub struct FlushWorker<P: PersistencePort> {
    port: Arc<P>,
    status_tx: watch::Sender<PersistenceStatus>,
    pending: Option<Box<DomainSnapshot>>,
}

impl<P: PersistencePort> FlushWorker<P> {
    pub fn new(port: Arc<P>) -> (Self, watch::Receiver<PersistenceStatus>) {
        let (status_tx, status_rx) = watch::channel(PersistenceStatus::default());
        let worker = FlushWorker {
            port,
            status_tx,
            pending: None,
        };
        (worker, status_rx)
    }

    /// Spawn the worker on the current runtime.
    pub fn start(self) -> (FlushHandle, JoinHandle<()>) {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(async move {
            self.run(cmd_rx).await;
        });
        (FlushHandle { cmd_tx }, task)
    }

    async fn run(mut self, mut cmd_rx: mpsc::UnboundedReceiver<FlushCommand>) {
        info!("Flush worker started");

        while let Some(cmd) = cmd_rx.recv().await {
            let mut acks = Vec::new();
            let mut stop = self.handle(cmd, &mut acks);

            // Coalesce everything already queued behind it.
            while !stop {
                match cmd_rx.try_recv() {
                    Ok(cmd) => stop = self.handle(cmd, &mut acks),
                    Err(_) => break,
                }
            }

            self.persist_pending().await;
            for ack in acks {
                let _ = ack.send(());
            }

            if stop {
                info!("Flush worker shutting down");
                return;
            }
        }

        // Every handle dropped without a shutdown.
        self.persist_pending().await;
        info!("Flush worker stopped");
    }

    /// Returns true on shutdown.
    fn handle(&mut self, cmd: FlushCommand, acks: &mut Vec<oneshot::Sender<()>>) -> bool {
        match cmd {
            FlushCommand::Save(snapshot) => {
                if self.pending.replace(snapshot).is_some() {
                    debug!("Coalesced superseded snapshot");
                }
                false
            }
            FlushCommand::Flush(ack) => {
                acks.push(ack);
                false
            }
            FlushCommand::Shutdown(ack) => {
                acks.push(ack);
                true
            }
        }
    }

    async fn persist_pending(&mut self) {
        let Some(snapshot) = self.pending.take() else {
            return;
        };

        match self.port.save(&snapshot).await {
            Ok(()) => {
                debug!("Snapshot persisted");
                self.status_tx.send_modify(|status| {
                    status.state = PersistenceState::Healthy;
                    status.saved_count += 1;
                    status.last_saved_at = Some(Utc::now());
                });
            }
            Err(e) => {
                warn!(error = %e, "Snapshot save failed, persistence degraded");
                self.status_tx.send_modify(|status| {
                    status.state = PersistenceState::Degraded;
                    status.failure_count += 1;
                    status.last_error = Some(e.to_string());
                });
            }
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
