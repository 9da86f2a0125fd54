//! Ticket persistence.
//!
//! Both mutating queries are single SQL statements: the sequence read and
//! the insert happen inside one `INSERT ... SELECT`, and the call-next
//! transition is one `UPDATE ... WHERE id = (SELECT ...)`. Combined with the
//! UNIQUE constraint on `code` this rules out duplicate display codes even
//! for callers that bypass the queue service lock.

use crate::db::{DbPool, Ticket, TicketView};

#[derive(Clone)]
pub struct TicketStore {
    pool: DbPool,
}

impl TicketStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Allocate the next ticket for `owner_id`. The display code is
    /// `T` + the zero-padded sequence number; printf widens past 999
    /// (`T999`, `T1000`) rather than erroring.
    pub async fn create(&self, owner_id: &str) -> Result<Ticket, sqlx::Error> {
        let created_at = chrono::Utc::now().to_rfc3339();

        sqlx::query_as(
            "INSERT INTO tickets (code, status, user_id, created_at)
             SELECT printf('T%03d', COALESCE(MAX(id), 0) + 1), 'waiting', ?, ?
             FROM tickets
             RETURNING *",
        )
        .bind(owner_id)
        .bind(&created_at)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn list_all(&self) -> Result<Vec<Ticket>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM tickets ORDER BY id ASC")
            .fetch_all(&self.pool)
            .await
    }

    pub async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Ticket>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM tickets WHERE user_id = ? ORDER BY id ASC")
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await
    }

    /// Atomically flip the earliest waiting ticket to called. FIFO by
    /// creation order; returns None when nothing is waiting. Two concurrent
    /// callers can never advance the same ticket twice.
    pub async fn advance_next_waiting(&self) -> Result<Option<Ticket>, sqlx::Error> {
        sqlx::query_as(
            "UPDATE tickets SET status = 'called'
             WHERE id = (SELECT id FROM tickets WHERE status = 'waiting' ORDER BY id ASC LIMIT 1)
             RETURNING *",
        )
        .fetch_optional(&self.pool)
        .await
    }

    /// The canonical broadcast payload: every ticket with its owner handle,
    /// in creation order.
    pub async fn list_views(&self) -> Result<Vec<TicketView>, sqlx::Error> {
        sqlx::query_as(
            "SELECT t.code AS token, t.status AS status, u.username AS user
             FROM tickets t JOIN users u ON u.id = t.user_id
             ORDER BY t.id ASC",
        )
        .fetch_all(&self.pool)
        .await
    }

    pub async fn views_by_owner(&self, owner_id: &str) -> Result<Vec<TicketView>, sqlx::Error> {
        sqlx::query_as(
            "SELECT t.code AS token, t.status AS status, u.username AS user
             FROM tickets t JOIN users u ON u.id = t.user_id
             WHERE t.user_id = ?
             ORDER BY t.id ASC",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::hash_password;
    use crate::db::{User, STATUS_CALLED, STATUS_WAITING};
    use crate::store::test_util::test_pool;
    use crate::store::AccountStore;

    async fn patient(pool: &DbPool, username: &str) -> User {
        let hash = hash_password("pw").unwrap();
        AccountStore::new(pool.clone())
            .create(username, 30, "F", &hash, "patient")
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn sequential_codes_are_unique_and_increasing() {
        let (_dir, pool) = test_pool().await;
        let tickets = TicketStore::new(pool.clone());
        let alice = patient(&pool, "alice").await;

        let mut codes = Vec::new();
        for _ in 0..5 {
            let t = tickets.create(&alice.id).await.unwrap();
            assert!(t.is_waiting());
            codes.push(t.code);
        }
        assert_eq!(codes, vec!["T001", "T002", "T003", "T004", "T005"]);
    }

    #[tokio::test]
    async fn display_code_widens_past_999() {
        let (_dir, pool) = test_pool().await;
        let tickets = TicketStore::new(pool.clone());
        let alice = patient(&pool, "alice").await;

        sqlx::query(
            "INSERT INTO tickets (id, code, status, user_id, created_at)
             VALUES (999, 'T999', 'waiting', ?, ?)",
        )
        .bind(&alice.id)
        .bind(chrono::Utc::now().to_rfc3339())
        .execute(&pool)
        .await
        .unwrap();

        let t = tickets.create(&alice.id).await.unwrap();
        assert_eq!(t.code, "T1000");
    }

    #[tokio::test]
    async fn advance_is_fifo_and_one_way() {
        let (_dir, pool) = test_pool().await;
        let tickets = TicketStore::new(pool.clone());
        let alice = patient(&pool, "alice").await;

        assert!(tickets.advance_next_waiting().await.unwrap().is_none());

        for _ in 0..3 {
            tickets.create(&alice.id).await.unwrap();
        }

        let first = tickets.advance_next_waiting().await.unwrap().unwrap();
        assert_eq!(first.code, "T001");
        assert_eq!(first.status, STATUS_CALLED);
        assert!(!first.is_waiting());

        let second = tickets.advance_next_waiting().await.unwrap().unwrap();
        assert_eq!(second.code, "T002");

        let all = tickets.list_all().await.unwrap();
        let statuses: Vec<&str> = all.iter().map(|t| t.status.as_str()).collect();
        assert_eq!(statuses, vec![STATUS_CALLED, STATUS_CALLED, STATUS_WAITING]);
    }

    #[tokio::test]
    async fn owner_listings_are_isolated() {
        let (_dir, pool) = test_pool().await;
        let tickets = TicketStore::new(pool.clone());
        let alice = patient(&pool, "alice").await;
        let carol = patient(&pool, "carol").await;

        tickets.create(&alice.id).await.unwrap();
        tickets.create(&carol.id).await.unwrap();
        tickets.create(&alice.id).await.unwrap();

        let mine = tickets.list_by_owner(&alice.id).await.unwrap();
        assert_eq!(mine.len(), 2);
        assert!(mine.iter().all(|t| t.user_id == alice.id));

        let views = tickets.views_by_owner(&carol.id).await.unwrap();
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].user, "carol");
    }

    #[tokio::test]
    async fn views_join_owner_handles_in_creation_order() {
        let (_dir, pool) = test_pool().await;
        let tickets = TicketStore::new(pool.clone());
        let alice = patient(&pool, "alice").await;
        let carol = patient(&pool, "carol").await;

        tickets.create(&alice.id).await.unwrap();
        tickets.create(&carol.id).await.unwrap();

        let views = tickets.list_views().await.unwrap();
        assert_eq!(views.len(), 2);
        assert_eq!(views[0].token, "T001");
        assert_eq!(views[0].user, "alice");
        assert_eq!(views[1].token, "T002");
        assert_eq!(views[1].user, "carol");
    }
}
