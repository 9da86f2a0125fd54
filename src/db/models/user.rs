//! Account and session models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub const ROLE_PATIENT: &str = "patient";
pub const ROLE_DOCTOR: &str = "doctor";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: String,
    pub username: String,
    pub age: i64,
    pub gender: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: String,
    pub created_at: String,
}

impl User {
    pub fn is_patient(&self) -> bool {
        self.role == ROLE_PATIENT
    }

    pub fn is_doctor(&self) -> bool {
        self.role == ROLE_DOCTOR
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Session {
    pub id: String,
    pub user_id: String,
    pub token_hash: String,
    pub expires_at: String,
    pub created_at: String,
}
