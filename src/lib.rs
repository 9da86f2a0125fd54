pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod queue;
pub mod realtime;
pub mod store;
pub mod ui;

pub use db::DbPool;

use std::sync::Arc;

use auth::{ChallengeVerifier, FixedAnswerChallenge};
use config::Config;
use queue::QueueService;
use realtime::Notifier;
use store::{AccountStore, SessionStore, TicketStore};

pub struct AppState {
    pub config: Config,
    pub db: DbPool,
    pub accounts: AccountStore,
    pub sessions: SessionStore,
    pub queue: QueueService,
    pub notifier: Notifier,
    pub challenge: Arc<dyn ChallengeVerifier>,
}

impl AppState {
    pub fn new(config: Config, db: DbPool) -> Self {
        let notifier = Notifier::new();
        let accounts = AccountStore::new(db.clone());
        let sessions = SessionStore::new(db.clone());
        let queue = QueueService::new(
            TicketStore::new(db.clone()),
            accounts.clone(),
            notifier.clone(),
        );
        let challenge: Arc<dyn ChallengeVerifier> = Arc::new(FixedAnswerChallenge::new(
            config.auth.challenge_answer.clone(),
        ));
        Self {
            config,
            db,
            accounts,
            sessions,
            queue,
            notifier,
            challenge,
        }
    }
}
