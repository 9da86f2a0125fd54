//! Fan-out of queue-state events to connected WebSocket clients.
//!
//! Each connection registers an unbounded sender; `broadcast` is
//! fire-and-forget with no acknowledgment and no replay. A client that
//! connects after an event fetches current state from its dashboard view.

use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tracing::debug;

use crate::db::TicketView;

/// Events pushed over the realtime channel. Serializes with a `type` tag,
/// e.g. `{"type":"update_tokens","tokens":[...]}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QueueEvent {
    UpdateTokens { tokens: Vec<TicketView> },
}

pub struct Subscription {
    pub id: u64,
    pub rx: mpsc::UnboundedReceiver<QueueEvent>,
}

#[derive(Clone, Default)]
pub struct Notifier {
    subscribers: Arc<RwLock<HashMap<u64, mpsc::UnboundedSender<QueueEvent>>>>,
    next_id: Arc<AtomicU64>,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn subscribe(&self) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.write().await.insert(id, tx);
        debug!(subscriber = id, "realtime subscriber added");
        Subscription { id, rx }
    }

    pub async fn unsubscribe(&self, id: u64) {
        self.subscribers.write().await.remove(&id);
        debug!(subscriber = id, "realtime subscriber removed");
    }

    pub async fn subscriber_count(&self) -> usize {
        self.subscribers.read().await.len()
    }

    /// Push an event to every subscriber. Dead subscribers (dropped
    /// receivers) are pruned; a failed send never fails the broadcast.
    pub async fn broadcast(&self, event: QueueEvent) {
        let mut dead = Vec::new();
        {
            let subscribers = self.subscribers.read().await;
            for (id, tx) in subscribers.iter() {
                if tx.send(event.clone()).is_err() {
                    dead.push(*id);
                }
            }
        }
        if !dead.is_empty() {
            let mut subscribers = self.subscribers.write().await;
            for id in dead {
                subscribers.remove(&id);
                debug!(subscriber = id, "pruned dead realtime subscriber");
            }
        }
    }
}
