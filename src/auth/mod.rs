//! Credential handling, registration validation and the session gate.
//!
//! Secrets are stored as salted argon2 PHC strings; session tokens are 32
//! random bytes handed to the client in an HttpOnly cookie, retained
//! server-side only as their SHA-256 digest.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::response::Redirect;
use axum_extra::extract::CookieJar;
use chrono::Duration;
use rand::Rng;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::info;

use crate::db::User;
use crate::AppState;

/// Session token cookie name
pub const SESSION_COOKIE: &str = "queueease_session";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("user already exists")]
    DuplicateHandle,
    #[error("passwords do not match")]
    SecretMismatch,
    #[error("invalid captcha")]
    ChallengeFailed,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("password hashing failed")]
    Hash,
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Basic anti-automation gate for registration. The shipped implementation
/// is a fixed-answer placeholder; deployments wanting a real CAPTCHA swap
/// in their own verifier.
pub trait ChallengeVerifier: Send + Sync {
    fn verify(&self, answer: &str) -> bool;
}

pub struct FixedAnswerChallenge {
    answer: String,
}

impl FixedAnswerChallenge {
    pub fn new(answer: String) -> Self {
        Self { answer }
    }
}

impl ChallengeVerifier for FixedAnswerChallenge {
    fn verify(&self, answer: &str) -> bool {
        answer.eq_ignore_ascii_case(&self.answer)
    }
}

/// Hash a password using Argon2
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|_| AuthError::Hash)?;
    Ok(hash.to_string())
}

/// Verify a password against a hash
pub fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

/// Generate a random session token
pub fn generate_token() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 32] = rng.random();
    hex::encode(bytes)
}

/// Hash a token for storage
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Registration form fields.
#[derive(Debug, Deserialize)]
pub struct Registration {
    pub username: String,
    pub age: i64,
    pub gender: String,
    pub password: String,
    pub confirm_password: String,
    pub captcha: String,
    pub role: String,
}

/// Validate and create an account. Checks run in order: duplicate handle,
/// secret/confirmation mismatch, then the human-verification challenge.
pub async fn register(state: &AppState, reg: &Registration) -> Result<User, AuthError> {
    if state
        .accounts
        .find_by_username(&reg.username)
        .await?
        .is_some()
    {
        return Err(AuthError::DuplicateHandle);
    }
    if reg.password != reg.confirm_password {
        return Err(AuthError::SecretMismatch);
    }
    if !state.challenge.verify(&reg.captcha) {
        return Err(AuthError::ChallengeFailed);
    }

    let password_hash = hash_password(&reg.password)?;
    let user = state
        .accounts
        .create(&reg.username, reg.age, &reg.gender, &password_hash, &reg.role)
        .await
        .map_err(|e| match &e {
            // Lost a create race after the pre-check; same outcome.
            sqlx::Error::Database(db) if db.is_unique_violation() => AuthError::DuplicateHandle,
            _ => AuthError::Database(e),
        })?;

    info!(username = %user.username, role = %user.role, "account registered");
    Ok(user)
}

/// Verify credentials and open a session. Returns the account together with
/// the raw token destined for the session cookie.
pub async fn login(
    state: &AppState,
    username: &str,
    password: &str,
) -> Result<(User, String), AuthError> {
    let user = state
        .accounts
        .verify_credentials(username, password)
        .await?
        .ok_or(AuthError::InvalidCredentials)?;

    let token = generate_token();
    let ttl = Duration::hours(state.config.auth.session_ttl_hours);
    state
        .sessions
        .create(&user.id, &hash_token(&token), ttl)
        .await?;

    info!(username = %user.username, role = %user.role, "login");
    Ok((user, token))
}

/// Resolve the session cookie to its account, if the session is still live.
pub async fn session_user(state: &AppState, jar: &CookieJar) -> Option<User> {
    let token = jar.get(SESSION_COOKIE)?.value().to_string();
    match state.sessions.find_live_user(&hash_token(&token)).await {
        Ok(user) => user,
        Err(e) => {
            tracing::error!(error = %e, "session lookup failed");
            None
        }
    }
}

/// Guard for role-gated routes. A missing session and a wrong-role session
/// both answer with a redirect to the login page, never an error page.
pub async fn require_role(
    state: &AppState,
    jar: &CookieJar,
    role: &str,
) -> Result<User, Redirect> {
    match session_user(state, jar).await {
        Some(user) if user.role == role => Ok(user),
        _ => Err(Redirect::to("/login")),
    }
}

/// Destroy the session behind the cookie, if any. Idempotent.
pub async fn logout(state: &AppState, jar: &CookieJar) {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        if let Err(e) = state
            .sessions
            .delete_by_token_hash(&hash_token(cookie.value()))
            .await
        {
            tracing::error!(error = %e, "failed to delete session");
        }
    }
}
