//! Queue orchestration: ticket issuance, call-next and the dashboard views.
//!
//! Every mutation runs under one async mutex that also covers the
//! post-commit snapshot and broadcast, so each broadcast payload reflects
//! store state strictly after its triggering mutation and payloads enter
//! subscriber channels in commit order. The store-level statements are
//! additionally single-statement atomic, see `store::TicketStore`.

use thiserror::Error;
use tokio::sync::Mutex;
use tracing::info;

use crate::db::{Ticket, TicketView, User};
use crate::realtime::{Notifier, QueueEvent};
use crate::store::{AccountStore, TicketStore};

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("operation not permitted for this role")]
    Unauthorized,
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// A ticket advanced by call-next, together with its owner's handle for the
/// confirmation notice.
#[derive(Debug, Clone)]
pub struct CalledTicket {
    pub ticket: Ticket,
    pub owner: String,
}

pub struct QueueService {
    tickets: TicketStore,
    accounts: AccountStore,
    notifier: Notifier,
    write_lock: Mutex<()>,
}

impl QueueService {
    pub fn new(tickets: TicketStore, accounts: AccountStore, notifier: Notifier) -> Self {
        Self {
            tickets,
            accounts,
            notifier,
            write_lock: Mutex::new(()),
        }
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    /// Draw the next ticket for a patient and broadcast the updated list.
    pub async fn issue_ticket(&self, caller: &User) -> Result<Ticket, QueueError> {
        if !caller.is_patient() {
            return Err(QueueError::Unauthorized);
        }

        let _guard = self.write_lock.lock().await;
        let ticket = self.tickets.create(&caller.id).await?;
        info!(code = %ticket.code, username = %caller.username, "ticket issued");
        self.broadcast_current().await?;
        Ok(ticket)
    }

    /// Advance the earliest waiting ticket to called. Broadcasts afterwards
    /// even when the queue was empty so every viewer's mirror stays
    /// consistent with the store.
    pub async fn call_next(&self, caller: &User) -> Result<Option<CalledTicket>, QueueError> {
        if !caller.is_doctor() {
            return Err(QueueError::Unauthorized);
        }

        let _guard = self.write_lock.lock().await;
        let called = match self.tickets.advance_next_waiting().await? {
            Some(ticket) => {
                let owner = self
                    .accounts
                    .find_by_id(&ticket.user_id)
                    .await?
                    .map(|u| u.username)
                    .unwrap_or_default();
                info!(code = %ticket.code, owner = %owner, "ticket called");
                Some(CalledTicket { ticket, owner })
            }
            None => None,
        };
        self.broadcast_current().await?;
        Ok(called)
    }

    /// Doctors see every ticket; patients only their own.
    pub async fn snapshot_for_role(&self, caller: &User) -> Result<Vec<TicketView>, QueueError> {
        let views = if caller.is_doctor() {
            self.tickets.list_views().await?
        } else {
            self.tickets.views_by_owner(&caller.id).await?
        };
        Ok(views)
    }

    /// The full ticket list in creation order, as broadcast to viewers.
    pub async fn serialize(&self) -> Result<Vec<TicketView>, QueueError> {
        Ok(self.tickets.list_views().await?)
    }

    async fn broadcast_current(&self) -> Result<(), QueueError> {
        let tokens = self.serialize().await?;
        self.notifier
            .broadcast(QueueEvent::UpdateTokens { tokens })
            .await;
        Ok(())
    }
}
