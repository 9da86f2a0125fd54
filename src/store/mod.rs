//! Persistence layer: thin repository types over the shared [`DbPool`].
//!
//! Each store owns a pool clone and exposes the handful of queries its
//! callers need. Mutating ticket queries are single statements so that the
//! database, not the caller, resolves races (see [`TicketStore`]).

mod accounts;
mod sessions;
mod tickets;

pub use accounts::AccountStore;
pub use sessions::SessionStore;
pub use tickets::TicketStore;
