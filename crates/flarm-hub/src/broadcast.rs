//! Broadcaster actor
//!
//! A single task owns the set of connected output clients. Publishing,
//! adding and removing clients all arrive over channels and are handled one
//! at a time by that task, so the client map needs no lock.
//!
//! # Architecture
//!
//! ```text
//!   Publisher ──publish──┐
//!   OutputServer ──add───┼──▶ run_broadcaster ──try_send──▶ client queues
//!   OutputServer ──remove┘
//! ```
//!
//! Publishing never blocks: a full publish queue drops the message at the
//! producer, and a full client queue drops it for that client only.
//!
//! # Example
//!
//! ```rust,ignore
//! use flarm_hub::broadcast::{broadcast_channel, run_broadcaster};
//!
//! let (hub, broadcaster) = broadcast_channel(1024);
//! tokio::spawn(run_broadcaster(broadcaster));
//!
//! let (handle, mut rx) = hub.subscribe(64).await?;
//! hub.publisher().publish("$PFLAU,0,1,2,1,0,,0,,,*4F\r\n");
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, info};

/// Add/remove requests are rare; a small queue is plenty
const CONTROL_QUEUE_CAPACITY: usize = 16;

/// Unique identifier for an output client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientHandle(pub u64);

impl fmt::Display for ClientHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "client#{}", self.0)
    }
}

/// A message as delivered to clients
pub type Message = Arc<str>;

/// A client registration: its handle and delivery queue
#[derive(Debug)]
pub struct Subscription {
    pub handle: ClientHandle,
    pub tx: mpsc::Sender<Message>,
}

/// Producer side of the publish queue
#[derive(Debug, Clone)]
pub struct Publisher {
    tx: mpsc::Sender<Message>,
}

impl Publisher {
    /// Queue a message for every client; returns false if it was dropped
    pub fn publish(&self, message: impl Into<Message>) -> bool {
        match self.tx.try_send(message.into()) {
            Ok(()) => true,
            Err(TrySendError::Full(dropped)) => {
                debug!("publish queue full, dropping {}", dropped.trim_end());
                false
            }
            Err(TrySendError::Closed(_)) => false,
        }
    }
}

/// Cloneable front end of the broadcaster
#[derive(Debug, Clone)]
pub struct BroadcastHandle {
    publish_tx: mpsc::Sender<Message>,
    add_tx: mpsc::Sender<Subscription>,
    remove_tx: mpsc::Sender<ClientHandle>,
    next_handle: Arc<AtomicU64>,
}

impl BroadcastHandle {
    pub fn publisher(&self) -> Publisher {
        Publisher {
            tx: self.publish_tx.clone(),
        }
    }

    /// Register a new client with a delivery queue of `capacity` messages
    ///
    /// Returns `None` once the broadcaster has stopped.
    pub async fn subscribe(
        &self,
        capacity: usize,
    ) -> Option<(ClientHandle, mpsc::Receiver<Message>)> {
        let handle = ClientHandle(self.next_handle.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = mpsc::channel(capacity.max(1));
        self.add_tx.send(Subscription { handle, tx }).await.ok()?;
        Some((handle, rx))
    }

    /// Deregister a client
    pub async fn unsubscribe(&self, handle: ClientHandle) {
        let _ = self.remove_tx.send(handle).await;
    }
}

/// Receiving side, consumed by [`run_broadcaster`]
#[derive(Debug)]
pub struct Broadcaster {
    publish_rx: mpsc::Receiver<Message>,
    add_rx: mpsc::Receiver<Subscription>,
    remove_rx: mpsc::Receiver<ClientHandle>,
}

/// Create a broadcaster whose publish queue holds `publish_capacity` messages
pub fn broadcast_channel(publish_capacity: usize) -> (BroadcastHandle, Broadcaster) {
    let (publish_tx, publish_rx) = mpsc::channel(publish_capacity.max(1));
    let (add_tx, add_rx) = mpsc::channel(CONTROL_QUEUE_CAPACITY);
    let (remove_tx, remove_rx) = mpsc::channel(CONTROL_QUEUE_CAPACITY);

    let handle = BroadcastHandle {
        publish_tx,
        add_tx,
        remove_tx,
        next_handle: Arc::new(AtomicU64::new(1)),
    };
    let broadcaster = Broadcaster {
        publish_rx,
        add_rx,
        remove_rx,
    };
    (handle, broadcaster)
}

/// Run the broadcaster until every [`BroadcastHandle`] and [`Publisher`] is gone
pub async fn run_broadcaster(mut broadcaster: Broadcaster) {
    let mut clients: HashMap<ClientHandle, mpsc::Sender<Message>> = HashMap::new();

    loop {
        tokio::select! {
            // Registrations queued before a message take effect before it
            biased;

            Some(subscription) = broadcaster.add_rx.recv() => {
                info!("New output client: {}", subscription.handle);
                clients.insert(subscription.handle, subscription.tx);
            }

            Some(handle) = broadcaster.remove_rx.recv() => {
                if clients.remove(&handle).is_some() {
                    info!("Output client disconnected: {}", handle);
                }
            }

            message = broadcaster.publish_rx.recv() => {
                let Some(message) = message else { break; };
                debug!("broadcast to {} clients: {}", clients.len(), message.trim_end());
                for (handle, tx) in &clients {
                    match tx.try_send(Arc::clone(&message)) {
                        Ok(()) => {}
                        Err(TrySendError::Full(_)) => {
                            debug!("{} is not keeping up, dropping message", handle);
                        }
                        // The connection task is on its way out and will remove itself
                        Err(TrySendError::Closed(_)) => {}
                    }
                }
            }
        }
    }

    debug!("Broadcaster stopped with {} clients", clients.len());
}
