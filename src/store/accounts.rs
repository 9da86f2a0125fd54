//! Account persistence.

use crate::db::{DbPool, User};

#[derive(Clone)]
pub struct AccountStore {
    pool: DbPool,
}

impl AccountStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Insert a new account. The username carries a UNIQUE constraint; a
    /// violation surfaces as `sqlx::Error::Database` and is mapped to a
    /// domain error by the auth layer.
    pub async fn create(
        &self,
        username: &str,
        age: i64,
        gender: &str,
        password_hash: &str,
        role: &str,
    ) -> Result<User, sqlx::Error> {
        let id = uuid::Uuid::new_v4().to_string();
        let created_at = chrono::Utc::now().to_rfc3339();

        sqlx::query_as(
            "INSERT INTO users (id, username, age, gender, password_hash, role, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             RETURNING *",
        )
        .bind(&id)
        .bind(username)
        .bind(age)
        .bind(gender)
        .bind(password_hash)
        .bind(role)
        .bind(&created_at)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    /// Verify a supplied secret against the stored argon2 hash. An unknown
    /// username and a wrong password are indistinguishable to the caller.
    pub async fn verify_credentials(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        let user = self.find_by_username(username).await?;
        Ok(user.filter(|u| crate::auth::verify_password(password, &u.password_hash)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::hash_password;
    use crate::store::test_util::test_pool;

    #[tokio::test]
    async fn create_and_find() {
        let (_dir, pool) = test_pool().await;
        let accounts = AccountStore::new(pool);

        let hash = hash_password("pw1").unwrap();
        let user = accounts
            .create("alice", 30, "F", &hash, "patient")
            .await
            .unwrap();
        assert_eq!(user.username, "alice");
        assert!(user.is_patient());

        let found = accounts.find_by_username("alice").await.unwrap().unwrap();
        assert_eq!(found.id, user.id);
        assert!(accounts.find_by_username("bob").await.unwrap().is_none());

        let by_id = accounts.find_by_id(&user.id).await.unwrap().unwrap();
        assert_eq!(by_id.username, "alice");
    }

    #[tokio::test]
    async fn duplicate_username_is_a_unique_violation() {
        let (_dir, pool) = test_pool().await;
        let accounts = AccountStore::new(pool);

        let hash = hash_password("pw1").unwrap();
        accounts
            .create("alice", 30, "F", &hash, "patient")
            .await
            .unwrap();
        let err = accounts
            .create("alice", 41, "M", &hash, "doctor")
            .await
            .unwrap_err();
        match err {
            sqlx::Error::Database(db) => assert!(db.is_unique_violation()),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn verify_credentials_checks_the_hash() {
        let (_dir, pool) = test_pool().await;
        let accounts = AccountStore::new(pool);

        let hash = hash_password("pw1").unwrap();
        accounts
            .create("alice", 30, "F", &hash, "patient")
            .await
            .unwrap();

        assert!(accounts
            .verify_credentials("alice", "pw1")
            .await
            .unwrap()
            .is_some());
        assert!(accounts
            .verify_credentials("alice", "wrong")
            .await
            .unwrap()
            .is_none());
        assert!(accounts
            .verify_credentials("nobody", "pw1")
            .await
            .unwrap()
            .is_none());
    }
}
